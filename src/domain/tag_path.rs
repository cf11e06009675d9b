//! Hierarchical tag path type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A hierarchical tag such as `work/urgent`.
///
/// Tag paths are forward-slash separated. They are case-sensitive and every
/// hierarchy query works on whole segments, never on string prefixes.
///
/// # Validation Rules
/// - At least one segment
/// - Segments cannot contain whitespace or `#`
///
/// # Normalization
/// - Surrounding whitespace is trimmed
/// - A single leading `#` is stripped
/// - Leading, trailing and consecutive slashes are collapsed
///
/// # Examples
///
/// ```
/// use grove::domain::TagPath;
///
/// let tag = TagPath::new("#work/urgent").unwrap();
/// assert_eq!(tag.segments(), &["work", "urgent"]);
/// assert_eq!(tag.name(), "urgent");
///
/// let work = TagPath::new("work").unwrap();
/// assert!(work.is_ancestor_of(&tag));
/// assert!(!work.is_ancestor_of(&TagPath::new("work2").unwrap()));
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagPath {
    path: String,
    segments: Vec<String>,
}

/// Error returned when parsing an invalid tag path.
#[derive(Debug, Clone)]
pub struct ParseTagPathError(String);

impl fmt::Display for ParseTagPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseTagPathError {}

impl TagPath {
    /// Creates a new TagPath from a string.
    ///
    /// # Errors
    ///
    /// Returns `ParseTagPathError` if:
    /// - The path is empty or normalizes to empty (e.g. `#` or `///`)
    /// - Any segment contains whitespace or `#`
    pub fn new(path: &str) -> Result<Self, ParseTagPathError> {
        let trimmed = path.trim();
        let trimmed = trimmed.strip_prefix('#').unwrap_or(trimmed);

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                continue;
            }

            if !Self::is_valid_segment(segment) {
                return Err(ParseTagPathError(format!(
                    "invalid tag segment '{}': segments cannot contain whitespace or '#'",
                    segment
                )));
            }

            segments.push(segment.to_string());
        }

        if segments.is_empty() {
            return Err(ParseTagPathError("tag cannot be empty".to_string()));
        }

        Ok(Self::from_segments(segments))
    }

    fn from_segments(segments: Vec<String>) -> Self {
        Self {
            path: segments.join("/"),
            segments,
        }
    }

    fn is_valid_segment(segment: &str) -> bool {
        !segment.chars().any(|c| c.is_whitespace() || c == '#')
    }

    /// Returns the full path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Returns the path components.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns the last segment.
    pub fn name(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// Returns the first segment.
    pub fn root_name(&self) -> &str {
        &self.segments[0]
    }

    /// Returns the single-segment path of the first segment.
    pub fn root(&self) -> TagPath {
        Self::from_segments(vec![self.segments[0].clone()])
    }

    /// Returns the parent path, or `None` for a root-level tag.
    pub fn parent(&self) -> Option<TagPath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self::from_segments(
            self.segments[..self.segments.len() - 1].to_vec(),
        ))
    }

    /// Returns every ancestor, from the root down to the immediate parent.
    pub fn ancestors(&self) -> Vec<TagPath> {
        (1..self.segments.len())
            .map(|i| Self::from_segments(self.segments[..i].to_vec()))
            .collect()
    }

    /// Returns a path one level deeper.
    pub fn child(&self, name: &str) -> Result<TagPath, ParseTagPathError> {
        TagPath::new(&format!("{}/{}", self.path, name))
    }

    /// Returns whether this path is a proper ancestor of `other`.
    ///
    /// `work` is an ancestor of `work/urgent` but not of `work2`.
    pub fn is_ancestor_of(&self, other: &TagPath) -> bool {
        self.segments.len() < other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a == b)
    }

    /// Returns whether `other` equals this path or is nested under it.
    pub fn covers(&self, other: &TagPath) -> bool {
        self == other || self.is_ancestor_of(other)
    }

    /// Rewrites a path covered by `old` so that it starts with `new` instead.
    ///
    /// Returns `None` when `old` does not cover this path.
    pub fn replace_prefix(&self, old: &TagPath, new: &TagPath) -> Option<TagPath> {
        if !old.covers(self) {
            return None;
        }

        let mut segments = new.segments.clone();
        segments.extend_from_slice(&self.segments[old.segments.len()..]);
        Some(Self::from_segments(segments))
    }

    /// Returns the inline form used in note content, e.g. `#work/urgent`.
    pub fn to_inline(&self) -> String {
        format!("#{}", self.path)
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl fmt::Debug for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagPath(\"{}\")", self.path)
    }
}

impl FromStr for TagPath {
    type Err = ParseTagPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for TagPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.path)
    }
}

impl<'de> Deserialize<'de> for TagPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
