//! Pluralization that keeps the caller's casing and punctuation.
//!
//! The linguistic part lives behind [`Pluralizer`]: it only ever sees the
//! snake-case form of the input. [`pluralize`] then walks the pluralized
//! snake form and the original string side by side to carry the new
//! morphology back onto the original spelling.

use lazy_static::lazy_static;
use regex::Regex;

use super::words::snakecase;

/// Turns a lowercase snake-case phrase into its plural form.
///
/// Implementations pluralize the last word of the phrase and leave the rest
/// untouched.
pub trait Pluralizer {
    fn pluralize(&self, phrase: &str) -> String;
}

/// English inflection rules in the Rails tradition: uncountable words,
/// whole-word irregulars, then suffix rules (most specific first).
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishInflector;

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
];

// Ordered by priority; the first matching rule wins.
const RULES: &[(&str, &str)] = &[
    (r"(?i)(quiz)$", "${1}zes"),
    (r"(?i)^(oxen)$", "${1}"),
    (r"(?i)^(ox)$", "${1}en"),
    (r"(?i)(m|l)ice$", "${1}ice"),
    (r"(?i)(m|l)ouse$", "${1}ice"),
    (r"(?i)(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
    (r"(?i)(x|ch|ss|sh)$", "${1}es"),
    (r"(?i)([^aeiouy]|qu)y$", "${1}ies"),
    (r"(?i)(hive)$", "${1}s"),
    (r"(?i)(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
    (r"(?i)sis$", "ses"),
    (r"(?i)([ti])a$", "${1}a"),
    (r"(?i)([ti])um$", "${1}a"),
    (r"(?i)(buffal|tomat)o$", "${1}oes"),
    (r"(?i)(bu)s$", "${1}ses"),
    (r"(?i)(alias|status)$", "${1}es"),
    (r"(?i)(octop|vir)i$", "${1}i"),
    (r"(?i)(octop|vir)us$", "${1}i"),
    (r"(?i)^(ax|test)is$", "${1}es"),
    (r"(?i)s$", "s"),
    (r"$", "s"),
];

lazy_static! {
    static ref COMPILED_RULES: Vec<(Regex, &'static str)> = RULES
        .iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(pattern).expect("plural rule patterns are valid"),
                *replacement,
            )
        })
        .collect();
}

impl EnglishInflector {
    fn pluralize_word(&self, word: &str) -> String {
        let lowered = word.to_lowercase();
        if UNCOUNTABLE.contains(&lowered.as_str()) {
            return word.to_string();
        }
        if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lowered) {
            return (*plural).to_string();
        }
        for (rule, replacement) in COMPILED_RULES.iter() {
            if rule.is_match(word) {
                return rule.replace(word, *replacement).into_owned();
            }
        }
        word.to_string()
    }
}

impl Pluralizer for EnglishInflector {
    fn pluralize(&self, phrase: &str) -> String {
        if phrase.is_empty() {
            return String::new();
        }
        match phrase.rfind('_') {
            Some(index) => {
                let (head, last) = phrase.split_at(index + 1);
                format!("{head}{}", self.pluralize_word(last))
            }
            None => self.pluralize_word(phrase),
        }
    }
}

/// Pluralizes an identifier while preserving its original casing, spacing
/// and punctuation.
///
/// ## Examples
///
/// ```
/// use levo_lib::transform::pluralize;
///
/// assert_eq!(pluralize("WithAHugeMouse"), "WithAHugeMice");
/// assert_eq!(pluralize("There was A dog"), "There was A dogs");
/// ```
pub fn pluralize(input: &str) -> String {
    pluralize_with(input, &EnglishInflector)
}

/// [`pluralize`] with a caller-supplied inflector.
pub fn pluralize_with(input: &str, pluralizer: &dyn Pluralizer) -> String {
    let plural = pluralizer.pluralize(&snakecase(input));
    align_to_original(input, &plural)
}

/// Re-applies the original's casing and punctuation onto the plural form.
fn align_to_original(original: &str, plural: &str) -> String {
    let original: Vec<char> = original.chars().collect();
    let plural: Vec<char> = plural.chars().collect();
    let mut output = String::with_capacity(plural.len() + original.len());
    let (mut o, mut p) = (0, 0);

    while o < original.len() && p < plural.len() {
        let (oc, pc) = (original[o], plural[p]);
        if oc.to_lowercase().eq(pc.to_lowercase()) {
            output.push(oc);
            o += 1;
            p += 1;
        } else if pc == '_' {
            p += 1;
        } else if !oc.is_alphanumeric() {
            output.push(oc);
            o += 1;
        } else {
            // the plural changed the stem here (mouse -> mice)
            output.push(pc);
            o += 1;
            p += 1;
        }
    }

    output.extend(&plural[p..]);
    output
}
