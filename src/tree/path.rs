//! Addresses into the value tree.
//!
//! # Design Decisions
//! - A path is an owned list of object keys, nothing else (no indices)
//! - The root is the empty path
//! - Paths are the join key between handles, the tree and the registry

use std::fmt;

/// An ordered key sequence from the root to one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The empty path, addressing the whole tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from its segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Extend this path by one key.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    /// The enclosing path, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Strict ancestors, nearest first, ending with the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (0..self.segments.len()).rev().map(move |len| Path {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// The final key, `None` at the root.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Same as [`is_root`](Self::is_root).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if `self` equals `other` or is one of its ancestors.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True if `prefix` equals `self` or is one of its ancestors.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        prefix.is_prefix_of(self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$");
        }
        write!(f, "{}", self.segments.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_segments(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_and_parent() {
        let user = Path::root().child("user");
        let name = user.child("name");

        assert_eq!(name.segments(), ["user", "name"]);
        assert_eq!(name.parent(), Some(user.clone()));
        assert_eq!(user.parent(), Some(Path::root()));
        assert_eq!(Path::root().parent(), None);
        assert_eq!(name.last(), Some("name"));
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let path = Path::from_segments(["a", "b", "c"]);
        let ancestors: Vec<String> = path.ancestors().map(|p| p.to_string()).collect();
        assert_eq!(ancestors, vec!["a.b", "a", "$"]);

        assert_eq!(Path::root().ancestors().count(), 0);
    }

    #[test]
    fn test_prefix_relation() {
        let user = Path::from_segments(["user"]);
        let name = Path::from_segments(["user", "name"]);
        let username = Path::from_segments(["username"]);

        assert!(user.is_prefix_of(&name));
        assert!(user.is_prefix_of(&user));
        assert!(Path::root().is_prefix_of(&name));
        assert!(!name.is_prefix_of(&user));
        // Segment-wise, not string-wise.
        assert!(!user.is_prefix_of(&username));
        assert!(name.starts_with(&user));
    }

    #[test]
    fn test_len_and_is_empty() {
        assert!(Path::root().is_empty());
        assert_eq!(Path::root().len(), 0);

        let name = Path::from_segments(["user", "name"]);
        assert!(!name.is_empty());
        assert_eq!(name.len(), 2);
    }
}
