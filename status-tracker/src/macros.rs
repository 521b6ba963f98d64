//! Macros for tracker error handling.
//!
//! Provides convenience macros for creating and returning [`crate::error::TrackerError`]
//! instances with reduced boilerplate.

/// Creates a [`crate::error::TrackerError`] from error kind and description, with an optional
/// dynamic detail.
#[macro_export]
macro_rules! tracker_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::TrackerError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::TrackerError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Creates and returns a [`crate::error::TrackerError`] from the current function.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return Err($crate::tracker_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return Err($crate::tracker_error!($kind, $desc, $detail))
    };
}
