//! Validation errors
//!
//! Every variant is a client fault. The HTTP layer maps all of them to 400.

/// Request validation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was absent or blank
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Neither a message nor an image was supplied
    #[error("either message or imageUrl is required")]
    EmptyContent,

    /// Stored or supplied moderation status is not one of the known values
    #[error("unknown moderation status: '{0}'")]
    UnknownStatus(String),
}

impl ValidationError {
    /// Name of the offending field, when there is one
    #[inline]
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(field) => Some(field),
            Self::EmptyContent | Self::UnknownStatus(_) => None,
        }
    }
}
