//! Conflict policy for transfers
//!
//! Decides what happens when a transfer target already exists. A batch starts
//! from a [`TransferPolicy`]; with [`TransferPolicy::Ask`] every conflict is
//! handed to a [`ConflictResolver`], whose sticky answers replace the policy
//! for the rest of the batch.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Batch-level behavior for existing targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferPolicy {
    /// Ask the conflict resolver for each conflict
    #[default]
    Ask,
    /// Leave the existing target untouched
    Skip,
    /// Replace the existing target's content
    Overwrite,
    /// Write next to the existing target as `name(N).ext`
    #[serde(rename = "copy")]
    CreateCopy,
}

impl TransferPolicy {
    /// The fixed action for this policy, `None` for [`TransferPolicy::Ask`]
    pub fn action(self) -> Option<Action> {
        match self {
            TransferPolicy::Ask => None,
            TransferPolicy::Skip => Some(Action::Skip),
            TransferPolicy::Overwrite => Some(Action::Overwrite),
            TransferPolicy::CreateCopy => Some(Action::CreateCopy),
        }
    }
}

impl From<Action> for TransferPolicy {
    fn from(action: Action) -> Self {
        match action {
            Action::Skip => TransferPolicy::Skip,
            Action::Overwrite => TransferPolicy::Overwrite,
            Action::CreateCopy => TransferPolicy::CreateCopy,
        }
    }
}

impl fmt::Display for TransferPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferPolicy::Ask => "ask",
            TransferPolicy::Skip => "skip",
            TransferPolicy::Overwrite => "overwrite",
            TransferPolicy::CreateCopy => "copy",
        };
        f.write_str(s)
    }
}

impl FromStr for TransferPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(TransferPolicy::Ask),
            "skip" => Ok(TransferPolicy::Skip),
            "overwrite" => Ok(TransferPolicy::Overwrite),
            "copy" => Ok(TransferPolicy::CreateCopy),
            other => Err(Error::Config(format!(
                "Unknown conflict policy '{other}', expected ask, skip, overwrite or copy"
            ))),
        }
    }
}

/// What to do with one conflicting item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Skip,
    Overwrite,
    CreateCopy,
}

/// Answer to a single conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    /// Apply `action` to every later conflict of the batch
    pub sticky: bool,
}

impl Decision {
    pub fn once(action: Action) -> Self {
        Self {
            action,
            sticky: false,
        }
    }

    pub fn always(action: Action) -> Self {
        Self {
            action,
            sticky: true,
        }
    }
}

impl FromStr for Decision {
    type Err = Error;

    /// Parse `s`, `o`, `c` (once), `as`, `ao`, `ac` (rest of batch) or the
    /// long forms `skip`, `overwrite`, `copy`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "s" | "skip" => Ok(Decision::once(Action::Skip)),
            "o" | "overwrite" => Ok(Decision::once(Action::Overwrite)),
            "c" | "copy" => Ok(Decision::once(Action::CreateCopy)),
            "as" => Ok(Decision::always(Action::Skip)),
            "ao" => Ok(Decision::always(Action::Overwrite)),
            "ac" => Ok(Decision::always(Action::CreateCopy)),
            other => Err(Error::General(format!("Unrecognised answer '{other}'"))),
        }
    }
}

/// Direction of the transfer that hit a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

/// An existing target found during a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub direction: Direction,
    /// Path of the item relative to the transfer root
    pub path: String,
    /// Where the existing target lives (remote folder path or local directory)
    pub location: String,
}

/// Strategy consulted for each conflict while the policy is `Ask`
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    /// Decide what to do with `conflict`
    ///
    /// Returning [`Error::Interrupted`] stops the batch.
    async fn decide(&self, conflict: &Conflict) -> Result<Decision>;
}

/// Resolver that always answers with the same action
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub Action);

#[async_trait]
impl ConflictResolver for FixedPolicy {
    async fn decide(&self, _conflict: &Conflict) -> Result<Decision> {
        Ok(Decision::once(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_answers() {
        assert_eq!("s".parse::<Decision>().unwrap(), Decision::once(Action::Skip));
        assert_eq!(
            "o".parse::<Decision>().unwrap(),
            Decision::once(Action::Overwrite)
        );
        assert_eq!(
            " c ".parse::<Decision>().unwrap(),
            Decision::once(Action::CreateCopy)
        );
    }

    #[test]
    fn test_parse_sticky_answers() {
        assert!("as".parse::<Decision>().unwrap().sticky);
        assert_eq!(
            "ao".parse::<Decision>().unwrap(),
            Decision::always(Action::Overwrite)
        );
        assert_eq!(
            "ac".parse::<Decision>().unwrap(),
            Decision::always(Action::CreateCopy)
        );
    }

    #[test]
    fn test_parse_long_answers_and_garbage() {
        assert_eq!(
            "copy".parse::<Decision>().unwrap(),
            Decision::once(Action::CreateCopy)
        );
        assert!("x".parse::<Decision>().is_err());
        assert!("".parse::<Decision>().is_err());
    }

    #[test]
    fn test_policy_roundtrip_through_strings() {
        for policy in [
            TransferPolicy::Ask,
            TransferPolicy::Skip,
            TransferPolicy::Overwrite,
            TransferPolicy::CreateCopy,
        ] {
            assert_eq!(policy.to_string().parse::<TransferPolicy>().unwrap(), policy);
        }
        assert!("merge".parse::<TransferPolicy>().is_err());
    }

    #[test]
    fn test_policy_serde_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            conflict: TransferPolicy,
        }
        let w: Wrapper = toml::from_str("conflict = \"copy\"").unwrap();
        assert_eq!(w.conflict, TransferPolicy::CreateCopy);
        assert_eq!(
            toml::to_string(&Wrapper {
                conflict: TransferPolicy::Skip
            })
            .unwrap()
            .trim(),
            "conflict = \"skip\""
        );
    }

    #[test]
    fn test_policy_actions() {
        assert_eq!(TransferPolicy::Ask.action(), None);
        assert_eq!(TransferPolicy::Skip.action(), Some(Action::Skip));
        assert_eq!(TransferPolicy::from(Action::CreateCopy), TransferPolicy::CreateCopy);
    }

    #[tokio::test]
    async fn test_fixed_policy() {
        let conflict = Conflict {
            direction: Direction::Upload,
            path: "a.txt".into(),
            location: "docs".into(),
        };
        let decision = FixedPolicy(Action::Overwrite).decide(&conflict).await.unwrap();
        assert_eq!(decision, Decision::once(Action::Overwrite));
    }
}
