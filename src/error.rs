use std::path::PathBuf;
use thiserror::Error;

/// Classy error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Hierarchy error: {0}")]
    Hierarchy(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Classy operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a parse error
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }

    /// Create a hierarchy error (cycles, inconsistent resolution order)
    pub fn hierarchy(msg: impl Into<String>) -> Self {
        Error::Hierarchy(msg.into())
    }

    /// Create a lookup failure
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error means the requested entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_path_not_found_display() {
        let err = Error::PathNotFound(PathBuf::from("/some/path"));
        assert_eq!(err.to_string(), "Path not found: /some/path");
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("/foo/views.py", "unexpected token");
        assert!(err.to_string().contains("/foo/views.py"));
        assert!(err.to_string().contains("unexpected token"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::config_validation("port must be non-zero");
        assert_eq!(err.to_string(), "Config validation error: port must be non-zero");
    }

    #[test]
    fn test_hierarchy_error() {
        let err = Error::hierarchy("cycle through a.B");
        assert_eq!(err.to_string(), "Hierarchy error: cycle through a.B");
    }

    #[test]
    fn test_not_found() {
        let err = Error::not_found("klass UpdateView");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: klass UpdateView");
        assert!(!Error::other("x").is_not_found());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
