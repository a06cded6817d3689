//! Process exit codes for gd
//!
//! Scripts rely on these values; changing one is a breaking change.

use gd_core::Error;

/// Exit status of a gd invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Anything not covered below
    GeneralError = 1,

    /// Bad arguments, malformed path or query, missing configuration
    UsageError = 2,

    /// The drive could not be reached or answered with a server error
    NetworkError = 3,

    /// Missing or rejected access token
    AuthError = 4,

    /// A path segment, object or parent does not exist
    NotFound = 5,

    /// Duplicate titles or an existing record
    Conflict = 6,

    /// Requested behaviour is not available for this target
    UnsupportedFeature = 7,

    /// Stopped by Ctrl+C or an aborted prompt
    Interrupted = 130,
}

impl ExitCode {
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Completed",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments, path or query",
            Self::NetworkError => "Drive unreachable",
            Self::AuthError => "Access token missing or rejected",
            Self::NotFound => "Not found",
            Self::Conflict => "Ambiguous or duplicate name",
            Self::UnsupportedFeature => "Not supported",
            Self::Interrupted => "Interrupted",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(error: &Error) -> Self {
        match error.exit_code() {
            2 => Self::UsageError,
            3 => Self::NetworkError,
            4 => Self::AuthError,
            5 => Self::NotFound,
            6 => Self::Conflict,
            7 => Self::UnsupportedFeature,
            130 => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_core_error() {
        let cases = [
            (Error::InvalidQuery("and".into()), ExitCode::UsageError),
            (Error::Network("reset".into()), ExitCode::NetworkError),
            (Error::Auth("expired".into()), ExitCode::AuthError),
            (
                Error::PathNotFound {
                    segment: "a".into(),
                    parent: "~".into(),
                },
                ExitCode::NotFound,
            ),
            (
                Error::AmbiguousName {
                    name: "a".into(),
                    parent: "~".into(),
                },
                ExitCode::Conflict,
            ),
            (Error::UnsupportedFeature("x".into()), ExitCode::UnsupportedFeature),
            (Error::Interrupted, ExitCode::Interrupted),
            (Error::General("x".into()), ExitCode::GeneralError),
        ];
        for (error, expected) in cases {
            assert_eq!(ExitCode::from(&error), expected, "{error}");
        }
    }

    #[test]
    fn test_exit_code_values() {
        let code: i32 = ExitCode::Interrupted.into();
        assert_eq!(code, 130);
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::Conflict.as_i32(), 6);
    }

    #[test]
    fn test_exit_code_display() {
        assert_eq!(ExitCode::NotFound.to_string(), "Not found (5)");
    }
}
