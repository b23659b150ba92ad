//! Handlebars helpers wrapping the identifier transforms.
//!
//! Every helper returns a JSON value instead of writing to the output, so
//! boolean helpers work as subexpressions: `{{#if (isJavaType this)}}`.

use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::schema::{Model, ModelProperty};
use crate::transform::text::{concat, lower, prefix, sha256_hex, suffix, truncate, upper};
use crate::transform::{
    CustomTypeRegistry, SharedCustomTypes, camelcase, has_list_type, id_prop, is_java_type,
    is_sqlite_type, package_to_path, pluralize, snakecase, titlecase, to_core_data_type,
    to_java_type, to_objective_c_type, to_rails_type, to_sqlite_type,
};

type HelperResult = Result<Value, RenderError>;

/// Adapts a plain function of the helper's parameters into a [`HelperDef`].
struct ValueHelper<F>(F);

impl<F> HelperDef for ValueHelper<F>
where
    F: Fn(&Helper<'_>) -> HelperResult + Send + Sync,
{
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        (self.0)(h).map(ScopedJson::Derived)
    }
}

fn register<F>(registry: &mut Handlebars<'static>, name: &str, helper: F)
where
    F: Fn(&Helper<'_>) -> HelperResult + Send + Sync + 'static,
{
    registry.register_helper(name, Box::new(ValueHelper(helper)));
}

/// Registers the full helper table. `eq` and `neq` replace the built-ins.
pub(crate) fn register_all(registry: &mut Handlebars<'static>, custom_types: &SharedCustomTypes) {
    let text_helpers: [(&'static str, fn(&str) -> String); 8] = [
        ("lower", lower),
        ("upper", upper),
        ("pluralize", pluralize),
        ("camelcase", camelcase),
        ("titlecase", titlecase),
        ("snakecase", snakecase),
        ("SHA256", sha256_hex),
        ("packageToPath", package_to_path),
    ];
    for (name, transform) in text_helpers {
        register(registry, name, move |h: &Helper<'_>| {
            Ok(Value::String(transform(&text_param(h, 0, name)?)))
        });
    }

    register(registry, "concat", |h: &Helper<'_>| {
        let first = text_param(h, 0, "concat")?;
        let second = text_param(h, 1, "concat")?;
        Ok(Value::String(concat(&first, &second)))
    });
    register(registry, "prefix", |h: &Helper<'_>| {
        let affix = text_param(h, 0, "prefix")?;
        let original = text_param(h, 1, "prefix")?;
        Ok(Value::String(prefix(&affix, &original)))
    });
    register(registry, "suffix", |h: &Helper<'_>| {
        let affix = text_param(h, 0, "suffix")?;
        let original = text_param(h, 1, "suffix")?;
        Ok(Value::String(suffix(&affix, &original)))
    });
    register(registry, "truncate", |h: &Helper<'_>| {
        let length = length_param(h, 0, "truncate")?;
        let input = text_param(h, 1, "truncate")?;
        Ok(Value::String(truncate(length, &input)))
    });
    register(registry, "eq", |h: &Helper<'_>| equals_any(h, "eq").map(Value::Bool));
    register(registry, "neq", |h: &Helper<'_>| {
        equals_any(h, "neq").map(|equal| Value::Bool(!equal))
    });

    register(registry, "hasListType", |h: &Helper<'_>| {
        let model: Model = typed_param(h, 0, "hasListType", "model")?;
        Ok(Value::Bool(has_list_type(&model)))
    });
    register(registry, "idProp", |h: &Helper<'_>| {
        let properties: Vec<ModelProperty> = typed_param(h, 0, "idProp", "property list")?;
        Ok(Value::String(id_prop(&properties)))
    });

    let property_predicates: [(&'static str, fn(&ModelProperty) -> bool); 2] =
        [("isSqliteType", is_sqlite_type), ("isJavaType", is_java_type)];
    for (name, predicate) in property_predicates {
        register(registry, name, move |h: &Helper<'_>| {
            let property: ModelProperty = typed_param(h, 0, name, "property")?;
            Ok(Value::Bool(predicate(&property)))
        });
    }

    let property_types: [(&'static str, fn(&ModelProperty) -> String); 3] = [
        ("toSqliteType", to_sqlite_type),
        ("toJavaType", to_java_type),
        ("toRailsType", to_rails_type),
    ];
    for (name, translate) in property_types {
        register(registry, name, move |h: &Helper<'_>| {
            let property: ModelProperty = typed_param(h, 0, name, "property")?;
            Ok(Value::String(translate(&property)))
        });
    }

    let token_types: [(&'static str, fn(&str) -> String); 2] = [
        ("toCoreDataType", to_core_data_type),
        ("toObjectiveCType", to_objective_c_type),
    ];
    for (name, translate) in token_types {
        register(registry, name, move |h: &Helper<'_>| {
            Ok(Value::String(translate(&text_param(h, 0, name)?)))
        });
    }

    register_custom_type_helpers(registry, custom_types);
}

fn register_custom_type_helpers(
    registry: &mut Handlebars<'static>,
    custom_types: &SharedCustomTypes,
) {
    let types = custom_types.clone();
    register(registry, "registerCustomType", move |h: &Helper<'_>| {
        let domain = text_param(h, 0, "registerCustomType")?;
        write_registry(&types)?.register(&domain);
        Ok(Value::String(String::new()))
    });

    let types = custom_types.clone();
    register(registry, "setCustomType", move |h: &Helper<'_>| {
        let domain = text_param(h, 0, "setCustomType")?;
        let token = text_param(h, 1, "setCustomType")?;
        let replacement = text_param(h, 2, "setCustomType")?;
        if !write_registry(&types)?.set(&domain, &token, &replacement) {
            debug!(%domain, %token, "Ignoring custom type for unregistered domain");
        }
        Ok(Value::String(String::new()))
    });

    let types = custom_types.clone();
    register(registry, "isCustomType", move |h: &Helper<'_>| {
        let domain = text_param(h, 0, "isCustomType")?;
        let property: ModelProperty = typed_param(h, 1, "isCustomType", "property")?;
        Ok(Value::Bool(
            read_registry(&types)?.is_custom_type(&domain, &property),
        ))
    });

    let types = custom_types.clone();
    register(registry, "toCustomType", move |h: &Helper<'_>| {
        let domain = text_param(h, 0, "toCustomType")?;
        let property: ModelProperty = typed_param(h, 1, "toCustomType", "property")?;
        Ok(Value::String(
            read_registry(&types)?.to_custom_type(&domain, &property),
        ))
    });
}

fn param<'a>(
    h: &'a Helper<'_>,
    index: usize,
    helper: &'static str,
) -> Result<&'a Value, RenderError> {
    h.param(index)
        .map(|param| param.value())
        .ok_or_else(|| RenderErrorReason::ParamNotFoundForIndex(helper, index).into())
}

/// A parameter as text. Missing context values render as the empty string.
fn text_param(h: &Helper<'_>, index: usize, helper: &'static str) -> Result<String, RenderError> {
    Ok(match param(h, index, helper)? {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn length_param(h: &Helper<'_>, index: usize, helper: &'static str) -> Result<usize, RenderError> {
    let value = param(h, index, helper)?;
    value
        .as_u64()
        .and_then(|length| usize::try_from(length).ok())
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .ok_or_else(|| {
            RenderErrorReason::ParamTypeMismatchForName(
                helper,
                index.to_string(),
                "non-negative integer".to_string(),
            )
            .into()
        })
}

fn typed_param<T: DeserializeOwned>(
    h: &Helper<'_>,
    index: usize,
    helper: &'static str,
    expected: &str,
) -> Result<T, RenderError> {
    serde_json::from_value(param(h, index, helper)?.clone()).map_err(|err| {
        RenderErrorReason::Other(format!("`{helper}` expects a {expected}: {err}")).into()
    })
}

/// True when the first parameter equals any of the others.
fn equals_any(h: &Helper<'_>, helper: &'static str) -> Result<bool, RenderError> {
    let first = param(h, 0, helper)?;
    param(h, 1, helper)?;
    Ok(h.params()[1..].iter().any(|other| other.value() == first))
}

fn read_registry(
    types: &SharedCustomTypes,
) -> Result<RwLockReadGuard<'_, CustomTypeRegistry>, RenderError> {
    types.read().map_err(|_| poisoned())
}

fn write_registry(
    types: &SharedCustomTypes,
) -> Result<RwLockWriteGuard<'_, CustomTypeRegistry>, RenderError> {
    types.write().map_err(|_| poisoned())
}

fn poisoned() -> RenderError {
    RenderErrorReason::Other("custom type registry is poisoned".to_string()).into()
}
