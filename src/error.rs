//! Call-level errors
//!
//! Routine misses (a selector not matching, a broken JSON-LD block, an
//! unknown currency) are not errors; they just leave a field absent.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProductError {
    /// The page URL could not be parsed.
    #[error("invalid page url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The page URL has no hostname to resolve relative links against.
    #[error("page url '{url}' has no host")]
    MissingHost { url: String },

    /// A panic escaped the extractors and was caught at the top level.
    #[error("product extraction panicked: {message}")]
    Panicked { message: String },
}

impl ProductError {
    /// Build a `Panicked` error from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        Self::Panicked {
            message: panic_message(payload.as_ref()),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
