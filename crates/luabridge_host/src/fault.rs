//! Faults raised by host operations.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

/// Failure of a host operation body, field accessor, or contract call.
///
/// Carries a message and, optionally, the underlying error so the bridge can
/// preserve the original cause when it surfaces the fault to script code.
/// Faults stay on the thread that raised them, like the engine errors they
/// often wrap.
#[derive(Clone, Debug)]
pub struct HostFault {
    message: String,
    source: Option<Rc<dyn Error>>,
}

impl HostFault {
    /// Create a fault with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a fault wrapping an underlying error; the message is the error's display.
    pub fn from_error<E>(error: E) -> Self
    where
        E: Error + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Rc::new(error)),
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The wrapped cause, if any.
    pub fn cause(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref()
    }
}

impl fmt::Display for HostFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for HostFault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause()
    }
}
