use crate::types::service_error::ServiceError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Boolean-first outcome of a validation without a produced value.
///
/// Carries the ordered failure messages and, when one was recorded, a single
/// structured [`ServiceError`].
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationResult {
    errors: Vec<String>,
    service_error: Option<ServiceError>,
}

impl ValidationResult {
    /// A passing validation.
    #[inline]
    pub fn success() -> Self {
        Self::default()
    }

    /// A failing validation with plain messages.
    pub fn failure<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { errors: messages.into_iter().map(Into::into).collect(), service_error: None }
    }

    /// A failing validation with a structured error; its message is the only entry in `errors`.
    pub fn failure_with(error: ServiceError) -> Self {
        Self { errors: vec![error.message().to_owned()], service_error: Some(error) }
    }

    /// Assembles a result from messages and an optional structured error.
    pub fn from_parts(errors: Vec<String>, service_error: Option<ServiceError>) -> Self {
        Self { errors, service_error }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.service_error.is_none()
    }

    #[inline]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[inline]
    pub fn service_error(&self) -> Option<&ServiceError> {
        self.service_error.as_ref()
    }

    /// Structured view: the recorded error, or one `ValidationFailed` per message.
    pub fn to_service_errors(&self) -> Vec<ServiceError> {
        match &self.service_error {
            Some(error) => vec![error.clone()],
            None => self.errors.iter().map(ServiceError::validation_failed).collect(),
        }
    }
}
