use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("TOC parsing error: {0}")]
    TocParse(String),

    #[error("Unexpected TOC shape: {0}")]
    TocShape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown documentation category: {0}")]
    UnknownCategory(String),

    #[error("Could not open link: {0}")]
    Browser(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Invalid: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    pub fn is_temporary(&self) -> bool {
        matches!(
            self,
            Error::HttpError(_) | Error::Timeout(_) | Error::Io(_)
        )
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_) | Error::Config(_) | Error::UnknownCategory(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Error::HttpError(_) => "HTTP_ERROR",
            Error::Timeout(_) => "TIMEOUT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::TocParse(_) => "TOC_PARSE",
            Error::TocShape(_) => "TOC_SHAPE",
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Config(_) => "CONFIG",
            Error::NotFound(_) => "NOT_FOUND",
            Error::UnknownCategory(_) => "UNKNOWN_CATEGORY",
            Error::Browser(_) => "BROWSER",
            Error::Prompt(_) => "PROMPT",
            Error::Invalid(_) => "INVALID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::Timeout("slow".to_string()).is_temporary());
        assert!(Error::HttpError("HTTP 503".to_string()).is_temporary());
        assert!(!Error::TocShape("missing node".to_string()).is_temporary());

        assert!(Error::UnknownCategory("cobol".to_string()).is_user_error());
        assert!(!Error::TocParse("eof".to_string()).is_user_error());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::TocShape(String::new()).error_code(), "TOC_SHAPE");
        assert_eq!(Error::UnknownCategory(String::new()).error_code(), "UNKNOWN_CATEGORY");

        let toml_err = toml::from_str::<toml::Value>("= nope").unwrap_err();
        assert_eq!(Error::from(toml_err).error_code(), "CONFIG");
    }
}
