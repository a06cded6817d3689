//! Errors shared by every gd crate
//!
//! Each variant maps onto one process exit code through [`Error::exit_code`],
//! so the CLI never has to inspect messages.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Caller mistakes
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid query expression: {0}")]
    InvalidQuery(String),

    // Lookups
    #[error("No parent named '{0}'")]
    ParentNotFound(String),

    /// A path segment is missing and creation was not requested
    #[error("'{segment}' not found in '{parent}'")]
    PathNotFound { segment: String, parent: String },

    /// The drive reported an id as missing
    #[error("Not found: {0}")]
    NotFound(String),

    // Name clashes
    #[error("Parent '{0}' already exists")]
    ParentExists(String),

    /// Titles are not unique in a drive folder; a path through a duplicated
    /// title cannot be resolved
    #[error("More than one folder or file named '{name}' found in '{parent}'")]
    AmbiguousName { name: String, parent: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    // Remote side
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport failures and unexpected HTTP statuses
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Interrupted")]
    Interrupted,

    // Wrapped library errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration file: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Could not encode configuration: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    General(String),
}

impl Error {
    /// Process exit code for this error
    ///
    /// 2 usage, 3 network, 4 auth, 5 not found, 6 conflict, 7 unsupported,
    /// 130 interrupted, 1 everything else.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidPath(_) | Error::InvalidQuery(_) => 2,
            Error::Network(_) => 3,
            Error::Auth(_) => 4,
            Error::ParentNotFound(_) | Error::PathNotFound { .. } | Error::NotFound(_) => 5,
            Error::ParentExists(_) | Error::AmbiguousName { .. } | Error::Conflict(_) => 6,
            Error::UnsupportedFeature(_) => 7,
            Error::Interrupted => 130,
            Error::Io(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::Json(_)
            | Error::InvalidUrl(_)
            | Error::General(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(segment: &str) -> Error {
        Error::PathNotFound {
            segment: segment.into(),
            parent: "~/docs".into(),
        }
    }

    fn duplicated(name: &str) -> Error {
        Error::AmbiguousName {
            name: name.into(),
            parent: "~".into(),
        }
    }

    #[test]
    fn test_each_class_has_its_code() {
        let cases = [
            (Error::InvalidQuery("and".into()), 2),
            (Error::Config("bad name".into()), 2),
            (Error::Network("timed out".into()), 3),
            (Error::Auth("expired".into()), 4),
            (missing("old"), 5),
            (Error::ParentNotFound("work".into()), 5),
            (duplicated("photos"), 6),
            (Error::ParentExists("work".into()), 6),
            (Error::UnsupportedFeature("levels".into()), 7),
            (Error::Interrupted, 130),
            (Error::General("boom".into()), 1),
            (Error::Io(std::io::Error::other("disk")), 1),
        ];
        for (error, code) in cases {
            assert_eq!(error.exit_code(), code, "{error}");
        }
    }

    #[test]
    fn test_messages_name_the_offending_title() {
        assert_eq!(missing("old").to_string(), "'old' not found in '~/docs'");
        assert_eq!(
            duplicated("photos").to_string(),
            "More than one folder or file named 'photos' found in '~'"
        );
        assert_eq!(
            Error::ParentNotFound("work".into()).to_string(),
            "No parent named 'work'"
        );
    }
}
