use thiserror::Error;

use crate::skland::SklandError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("No account tokens configured. Set SKLAND_TOKEN or `tokens` in skland.toml.")]
    NoAccounts,

    #[error("Skland client error: {0}")]
    Skland(#[from] SklandError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = AppError::Config("max_retries must be at least 1".into());
        assert_eq!(err.to_string(), "Config error: max_retries must be at least 1");
    }

    #[test]
    fn skland_error_converts() {
        let err: AppError = SklandError::Decode("bad json".into()).into();
        assert!(matches!(err, AppError::Skland(_)));
    }
}
