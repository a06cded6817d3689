//! Path parsing
//!
//! Drive paths are slash (or backslash) delimited titles, for example
//! `Folder1/Folder2/file.txt`. A path may start with `~` (the configured
//! root), with one or more `..` (parent of the working folder), or with a
//! separator, which is treated like `~`.

use crate::error::{Error, Result};

/// Canonical separator used in rendered and relative paths
pub const SEPARATOR: char = '/';

/// Where a parsed path starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The working folder the caller resolves relative to
    Working,
    /// The configured root of the drive
    Home,
}

/// A parsed drive path: an anchor, a number of `..` hops and the titles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrivePath {
    pub anchor: Anchor,
    /// Number of leading `..` segments after the anchor
    pub up: usize,
    /// Titles left to resolve, never empty strings
    pub segments: Vec<String>,
}

impl DrivePath {
    /// Parse a user supplied path
    pub fn parse(path: &str) -> Self {
        let path = strip_quotes(path.trim());
        let mut anchor = if path.starts_with(['/', '\\']) {
            Anchor::Home
        } else {
            Anchor::Working
        };
        let mut up = 0;
        let mut segments = Vec::new();

        for segment in split_segments(path) {
            if segments.is_empty() {
                match segment {
                    "~" => {
                        anchor = Anchor::Home;
                        up = 0;
                        continue;
                    }
                    ".." => {
                        up += 1;
                        continue;
                    }
                    _ => {}
                }
            }
            segments.push(segment.to_string());
        }

        Self {
            anchor,
            up,
            segments,
        }
    }
}

/// Split on either separator, dropping empty segments
pub fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty())
}

/// Join two drive paths with the canonical separator
pub fn join(base: &str, child: &str) -> String {
    let base = base.trim_end_matches(['/', '\\']);
    let child = child.trim_start_matches(['/', '\\']);
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}{SEPARATOR}{child}"),
    }
}

/// Reject titles that cannot name a single object
///
/// Empty titles, `.`, `..` and titles containing a separator are refused.
pub fn validate_title(title: &str) -> Result<()> {
    if title.is_empty() {
        return Err(Error::InvalidPath("Title cannot be empty".into()));
    }
    if title == "." || title == ".." {
        return Err(Error::InvalidPath(format!("'{title}' cannot be used as a title")));
    }
    if title.contains(['/', '\\']) {
        return Err(Error::InvalidPath(format!(
            "Title '{title}' cannot contain a path separator"
        )));
    }
    Ok(())
}

fn strip_quotes(path: &str) -> &str {
    for quote in ['"', '\''] {
        if path.len() >= 2 && path.starts_with(quote) && path.ends_with(quote) {
            return &path[1..path.len() - 1];
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relative_path() {
        let path = DrivePath::parse("a/b/c.txt");
        assert_eq!(path.anchor, Anchor::Working);
        assert_eq!(path.up, 0);
        assert_eq!(path.segments, vec!["a", "b", "c.txt"]);
    }

    #[test]
    fn test_parse_backslashes() {
        let path = DrivePath::parse("a\\b\\c");
        assert_eq!(path.segments, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_home_prefix() {
        let path = DrivePath::parse("~/docs");
        assert_eq!(path.anchor, Anchor::Home);
        assert_eq!(path.segments, vec!["docs"]);

        let path = DrivePath::parse("~");
        assert_eq!(path.anchor, Anchor::Home);
        assert!(path.segments.is_empty());
    }

    #[test]
    fn test_parse_leading_separator_is_home() {
        let path = DrivePath::parse("/docs/a");
        assert_eq!(path.anchor, Anchor::Home);
        assert_eq!(path.segments, vec!["docs", "a"]);
    }

    #[test]
    fn test_parse_parent_hops() {
        let path = DrivePath::parse("../../x");
        assert_eq!(path.anchor, Anchor::Working);
        assert_eq!(path.up, 2);
        assert_eq!(path.segments, vec!["x"]);
    }

    #[test]
    fn test_home_resets_parent_hops() {
        let path = DrivePath::parse("../~/x");
        assert_eq!(path.anchor, Anchor::Home);
        assert_eq!(path.up, 0);
        assert_eq!(path.segments, vec!["x"]);
    }

    #[test]
    fn test_dots_inside_path_are_titles() {
        let path = DrivePath::parse("a/../b");
        assert_eq!(path.up, 0);
        assert_eq!(path.segments, vec!["a", "..", "b"]);
    }

    #[test]
    fn test_parse_empty_and_quoted() {
        assert!(DrivePath::parse("").segments.is_empty());
        let path = DrivePath::parse("'my docs/file one.txt'");
        assert_eq!(path.segments, vec!["my docs", "file one.txt"]);
        let path = DrivePath::parse("\"x\"");
        assert_eq!(path.segments, vec!["x"]);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", ""), "a");
        assert_eq!(join("a/", "b"), "a/b");
        assert_eq!(join("a", "/b/c"), "a/b/c");
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("ok.txt").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("a/b").is_err());
        assert!(validate_title(".").is_err());
        assert!(validate_title("..").is_err());
        assert!(validate_title(".hidden").is_ok());
    }
}
