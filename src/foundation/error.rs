/// Convenience result type used across pfpframe.
pub type PfpResult<T> = Result<T, PfpError>;

/// Top-level error taxonomy used by editor and export APIs.
#[derive(thiserror::Error, Debug)]
pub enum PfpError {
    /// Invalid configuration, geometry or layer operation.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image source could not be read or decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Errors while compositing the scene on the CPU.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while encoding the exported PNG.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PfpError {
    /// Build a [`PfpError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PfpError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`PfpError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PfpError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}
