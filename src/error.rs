use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid month format: {0}")]
    MonthParse(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Loader error: {0}")]
    Loader(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Loader(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Loader(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
