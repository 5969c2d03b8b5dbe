//! Target path parsing.
//!
//! A target path is a dot-delimited key sequence such as `user.id`. An
//! optional leading root marker (`$.`) is stripped before splitting.

use crate::error::PathError;

/// Prefix accepted (and ignored) at the start of a target path.
pub const ROOT_MARKER: &str = "$.";

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A parsed, non-empty target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath {
    segments: Vec<String>,
}

impl TargetPath {
    /// Parse a raw path.
    ///
    /// Rejects an empty path, a path made only of the root marker (`$.` or
    /// `$`), and paths with empty segments (`a..b`, `a.`).
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        if raw == "$" {
            return Err(PathError::RootOnly);
        }

        let stripped = raw.strip_prefix(ROOT_MARKER).unwrap_or(raw);
        if stripped.is_empty() {
            return Err(PathError::RootOnly);
        }

        let segments: Vec<String> = stripped.split(SEPARATOR).map(str::to_string).collect();
        if let Some(idx) = segments.iter().position(|s| s.is_empty()) {
            return Err(PathError::EmptySegment(idx));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Intermediate segments (every segment but the last).
    pub fn parents(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Final segment, where the scalar is assigned.
    pub fn leaf(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl std::fmt::Display for TargetPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", ROOT_MARKER, self.segments.join("."))
    }
}

impl std::str::FromStr for TargetPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_root_marker() {
        let path = TargetPath::parse("$.user.id").unwrap();
        assert_eq!(path.segments(), &["user", "id"]);
        assert_eq!(path.parents(), &["user"]);
        assert_eq!(path.leaf(), "id");
    }

    #[test]
    fn test_path_without_marker() {
        let path = TargetPath::parse("country").unwrap();
        assert_eq!(path.depth(), 1);
        assert!(path.parents().is_empty());
        assert_eq!(path.leaf(), "country");
        assert_eq!(path.to_string(), "$.country");
    }

    #[test]
    fn test_rejects_root_only() {
        assert_eq!(TargetPath::parse("$."), Err(PathError::RootOnly));
        assert_eq!(TargetPath::parse("$"), Err(PathError::RootOnly));
        assert_eq!(TargetPath::parse(""), Err(PathError::Empty));
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert_eq!(TargetPath::parse("a..b"), Err(PathError::EmptySegment(1)));
        assert_eq!(TargetPath::parse("$.a."), Err(PathError::EmptySegment(1)));
        assert_eq!(TargetPath::parse(".a"), Err(PathError::EmptySegment(0)));
    }

    #[test]
    fn test_marker_only_stripped_once() {
        let path = TargetPath::parse("$.$.a").unwrap();
        assert_eq!(path.segments(), &["$", "a"]);
    }
}
