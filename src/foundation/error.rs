/// Convenience result type used across retouch.
pub type RetouchResult<T> = Result<T, RetouchError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// A cancelled share prompt is deliberately absent: it is reported as
/// [`crate::DeliveryOutcome::Cancelled`] and ends the flow normally.
#[derive(thiserror::Error, Debug)]
pub enum RetouchError {
    /// Invalid caller-provided data (edit state, options, surface sizes).
    #[error("validation error: {0}")]
    Validation(String),

    /// The source image could not be decoded. The user must upload a new file.
    #[error("decode failure: {0}")]
    Decode(String),

    /// The source image has not finished decoding yet.
    #[error("image is not ready: decoding has not finished")]
    NotReady,

    /// Every capture strategy failed; no artifact was produced.
    #[error("capture failure: {0}")]
    Capture(String),

    /// The composited surface could not be serialized.
    #[error("encode failure: {0}")]
    Encode(String),

    /// Every delivery path failed. Retrying the export is the suggested remedy.
    #[error("delivery failure: {0} (try saving again)")]
    Delivery(String),

    /// The source image was replaced while an export was in flight.
    #[error("export invalidated: the source image was replaced")]
    Invalidated,

    /// A pipeline stage did not finish within its time bound.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RetouchError {
    /// Build a [`RetouchError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RetouchError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`RetouchError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`RetouchError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`RetouchError::Delivery`] value.
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    /// Build a [`RetouchError::Timeout`] value.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Whether the user has to pick a new source image to recover.
    pub fn requires_reupload(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
