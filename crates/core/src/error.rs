#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    /// The bare message without the variant prefix, suitable for showing
    /// to an end user.
    pub fn message(&self) -> &str {
        match self {
            CoreError::Validation(msg) => msg,
        }
    }
}
