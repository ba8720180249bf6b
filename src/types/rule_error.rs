use crate::types::service_error::ServiceError;
use core::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single failed rule, as recorded by a validation chain.
///
/// Rules fail either with a plain message or with a fully structured
/// [`ServiceError`]. Plain messages surface as `ValidationFailed` once the
/// chain is turned into a [`ServiceResult`](crate::types::ServiceResult).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RuleError {
    Message(String),
    Service(ServiceError),
}

impl RuleError {
    /// The human-readable message of the failure.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Self::Message(message) => message,
            Self::Service(error) => error.message(),
        }
    }

    /// The structured error, if the rule recorded one.
    #[inline]
    pub fn as_service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Message(_) => None,
            Self::Service(error) => Some(error),
        }
    }

    /// Converts into a [`ServiceError`], mapping plain messages to `ValidationFailed`.
    #[inline]
    pub fn into_service_error(self) -> ServiceError {
        match self {
            Self::Message(message) => ServiceError::validation_failed(message),
            Self::Service(error) => error,
        }
    }
}

impl Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<ServiceError> for RuleError {
    #[inline]
    fn from(error: ServiceError) -> Self {
        Self::Service(error)
    }
}

impl From<String> for RuleError {
    #[inline]
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for RuleError {
    #[inline]
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}
