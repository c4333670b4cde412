//! Tag-scoped cache keys.

use std::fmt;

/// A resource hash scoped by an ordered tag set.
///
/// The namespace tag always comes first, followed by the resource's own tags
/// in the order given. Duplicate and empty tags are dropped.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopedKey {
    tags: Vec<String>,
    hash: String,
}

impl ScopedKey {
    pub fn new<I, S>(namespace: &str, tags: I, hash: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scoped: Vec<String> = Vec::new();
        for tag in std::iter::once(namespace.to_string()).chain(tags.into_iter().map(Into::into)) {
            if !tag.is_empty() && !scoped.contains(&tag) {
                scoped.push(tag);
            }
        }

        ScopedKey {
            tags: scoped,
            hash: hash.into(),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The key string handed to the backend.
    pub fn storage_key(&self) -> String {
        CacheKeyBuilder::build(&self.tags, &self.hash)
    }
}

impl fmt::Display for ScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// Builder for backend key strings.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Format: `"tag1|tag2:hash"`.
    pub fn build(tags: &[String], hash: &str) -> String {
        format!("{}:{}", tags.join("|"), hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_comes_first() {
        let key = ScopedKey::new("funceme", ["stations", "daily"], "abc123");
        assert_eq!(key.storage_key(), "funceme|stations|daily:abc123");
    }

    #[test]
    fn test_duplicate_and_empty_tags_dropped() {
        let key = ScopedKey::new("app", ["app", "", "users", "users"], "h");
        assert_eq!(key.tags(), &["app".to_string(), "users".to_string()]);
    }

    #[test]
    fn test_tag_order_is_significant() {
        let a = ScopedKey::new("app", ["a", "b"], "h");
        let b = ScopedKey::new("app", ["b", "a"], "h");
        assert_ne!(a.storage_key(), b.storage_key());
    }
}
