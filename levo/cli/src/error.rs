use std::path::PathBuf;

use levo_lib::LevoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid config file `{path}`: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to access `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("generated path `{path}` escapes the output directory")]
    UnsafePath { path: PathBuf },

    #[error("no {0} given; pass it as a flag or set it in the config file")]
    Missing(&'static str),

    #[error(transparent)]
    Levo(#[from] LevoError),
}
