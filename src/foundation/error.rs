/// Convenience result type used across veneer.
pub type VeneerResult<T> = Result<T, VeneerError>;

/// Top-level error taxonomy used by adapter APIs.
///
/// Caller misuse (an unknown bar handed to a strict mirror operation, a token
/// collision) is not represented here: those are invariant violations and panic.
#[derive(thiserror::Error, Debug)]
pub enum VeneerError {
    /// Native data that cannot be expressed in the abstract model.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Failure raised by a render or partition function.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid configuration values.
    #[error("config error: {0}")]
    Config(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VeneerError {
    /// Build a [`VeneerError::Conversion`] value.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Build a [`VeneerError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`VeneerError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`VeneerError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for VeneerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
