use thiserror::Error;

/// Fatal startup failures: a bad config file, a missing credential, or a
/// value outside its documented range. Every variant here ends the process
/// with a non-zero exit before any transport connection is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: String, source: std::io::Error },

    #[error("failed to parse config file '{path}': {source}")]
    Parse { path: String, source: toml::de::Error },

    #[error("missing required environment variable '{0}'")]
    MissingEnv(&'static str),

    #[error("'{field}' must be {constraint}, got {value}")]
    OutOfRange { field: &'static str, constraint: String, value: String },

    #[error("'{field}' must be one of {allowed:?}, got '{value}'")]
    InvalidChoice { field: &'static str, allowed: &'static [&'static str], value: String },
}
