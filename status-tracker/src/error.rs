use std::error;
use std::fmt;

/// Convenient result type for tracker operations using [`TrackerError`] as the error type.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Main error type for stream status tracking.
///
/// [`TrackerError`] carries an [`ErrorKind`], a static description and optionally a dynamic detail.
#[derive(Debug, Clone)]
pub struct TrackerError {
    repr: ErrorRepr,
}

/// Internal representation of error data.
#[derive(Debug, Clone)]
enum ErrorRepr {
    /// Error with kind and static description
    WithDescription(ErrorKind, &'static str),
    /// Error with kind, static description, and dynamic detail
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
}

/// Categories of errors that can occur while tracking stream statuses.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Status API Errors
    StatusApiRequestFailed,
    StatusApiUnavailable,

    // Data Errors
    InvalidEvent,
    InvalidData,

    // IO & Serialization Errors
    IoError,
    DeserializationError,
}

impl TrackerError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            ErrorRepr::WithDescription(_, _) => None,
        }
    }
}

impl PartialEq for TrackerError {
    fn eq(&self, other: &TrackerError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::WithDescription(kind_a, _), ErrorRepr::WithDescription(kind_b, _)) => {
                kind_a == kind_b
            }
            (
                ErrorRepr::WithDescriptionAndDetail(kind_a, _, _),
                ErrorRepr::WithDescriptionAndDetail(kind_b, _, _),
            ) => kind_a == kind_b,
            _ => false,
        }
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;

                Ok(())
            }
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                desc.fmt(f)?;
                f.write_str(" -> ")?;
                detail.fmt(f)?;

                Ok(())
            }
        }
    }
}

impl error::Error for TrackerError {}

/// Creates a [`TrackerError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for TrackerError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> TrackerError {
        TrackerError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

/// Creates a [`TrackerError`] from an error kind, static description, and dynamic detail.
impl From<(ErrorKind, &'static str, String)> for TrackerError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> TrackerError {
        TrackerError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

/// Converts [`std::io::Error`] to [`TrackerError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> TrackerError {
        TrackerError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::IoError,
                "I/O error occurred",
                err.to_string(),
            ),
        }
    }
}

/// Converts [`serde_json::Error`] to [`TrackerError`], classifying I/O, syntax and data failures.
impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> TrackerError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax | serde_json::error::Category::Data => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
            serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed due to unexpected end of input",
            ),
        };

        TrackerError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}
