use thiserror::Error;

#[derive(Debug, Error)]
pub enum LumiraError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("ocr error: {0}")]
    Ocr(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, LumiraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_by_kind() {
        let err = LumiraError::Config("x".to_string());
        assert!(format!("{err}").contains("configuration error"));

        let err = LumiraError::NotFound("Диалог не найден.".to_string());
        assert_eq!(err.to_string(), "Диалог не найден.");
    }
}
