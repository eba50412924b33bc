use std::fmt;

use serde::{Deserialize, Serialize};

/// A path-like identifier addressing a stored value.
///
/// A key is an ordered sequence of non-empty path segments. Equality and
/// ordering are segment-wise, so `Key::from("a/b")` sorts before
/// `Key::from("a/b/c")` and after `Key::from("a/a")`.
///
/// Whether a key with children may also hold a value of its own is
/// backend-defined: [`MemoryStorage`](crate::MemoryStorage) allows it,
/// [`LocalStorage`](crate::LocalStorage) inherits the file/directory
/// exclusion of the filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Key {
    segments: Vec<String>,
}

impl Key {
    /// The empty key, parent of every other key.
    ///
    /// Useful as a `list` prefix to enumerate the whole store.
    pub fn root() -> Self {
        Key {
            segments: Vec::new(),
        }
    }

    /// The path segments of this key, in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the empty key.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new key with `segment` appended.
    pub fn child<S: Into<String>>(&self, segment: S) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(segment.into().split('/').filter(|s| !s.is_empty()).map(String::from));
        Key { segments }
    }

    /// The key with the last segment removed, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Key {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Whether `prefix` is a segment-wise prefix of this key.
    ///
    /// Every key starts with the root key. `a/bc` does *not* start with
    /// `a/b`: the comparison is per segment, not per character.
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

impl From<&str> for Key {
    fn from(path: &str) -> Self {
        Key {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

impl From<String> for Key {
    fn from(path: String) -> Self {
        Key::from(path.as_str())
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

impl<S: Into<String>> FromIterator<S> for Key {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Key {
            segments: iter
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_paths() {
        assert_eq!(Key::from("a/b/c").segments(), &["a", "b", "c"]);
        assert_eq!(Key::from("/a//b/"), Key::from("a/b"));
        assert_eq!(Key::from(""), Key::root());
    }

    #[test]
    fn ordering_is_segment_wise() {
        let mut keys = vec![Key::from("a/b/c"), Key::from("a/a"), Key::from("a/b")];
        keys.sort();
        assert_eq!(
            keys,
            vec![Key::from("a/a"), Key::from("a/b"), Key::from("a/b/c")]
        );
    }

    #[test]
    fn prefix_matches_whole_segments_only() {
        assert!(Key::from("a/b/c").starts_with(&Key::from("a/b")));
        assert!(Key::from("a/b").starts_with(&Key::root()));
        assert!(!Key::from("a/bc").starts_with(&Key::from("a/b")));
    }

    #[test]
    fn child_and_parent_round_trip() {
        let key = Key::from("pkg").child("meta.json");
        assert_eq!(key.to_string(), "pkg/meta.json");
        assert_eq!(key.parent(), Some(Key::from("pkg")));
        assert_eq!(Key::root().parent(), None);
    }
}
