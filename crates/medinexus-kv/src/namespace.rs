//! Namespace prefixing

use std::fmt;

const SEPARATOR: char = ':';

/// Maps logical keys to physical `"<name>:key"` keys and back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    name: String,
    prefix: String,
}

impl Namespace {
    /// Any string is accepted, including `""` (prefix `":"`).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.contains(SEPARATOR) {
            // "a:b" + "c" and "a" + "b:c" map to the same physical key
            tracing::warn!(namespace = %name, "Namespace contains ':' and may overlap another namespace");
        }
        let prefix = format!("{name}{SEPARATOR}");
        Self { name, prefix }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Physical key for `key`.
    pub fn encode(&self, key: &str) -> String {
        let mut physical = String::with_capacity(self.prefix.len() + key.len());
        physical.push_str(&self.prefix);
        physical.push_str(key);
        physical
    }

    /// Logical key for a physical key, if it belongs to this namespace.
    pub fn decode<'a>(&self, physical: &'a str) -> Option<&'a str> {
        physical.strip_prefix(self.prefix.as_str())
    }

    pub fn contains(&self, physical: &str) -> bool {
        physical.starts_with(self.prefix.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let ns = Namespace::new("test");
        assert_eq!(ns.prefix(), "test:");
        assert_eq!(ns.encode("user"), "test:user");
        assert_eq!(ns.decode("test:user"), Some("user"));
        assert_eq!(ns.decode("test:"), Some(""));
        assert_eq!(ns.decode("other:user"), None);
        assert_eq!(ns.decode("testuser"), None);
    }

    #[test]
    fn test_empty_namespace() {
        let ns = Namespace::new("");
        assert_eq!(ns.prefix(), ":");
        assert_eq!(ns.encode("k"), ":k");
        assert!(!ns.contains("k"));
    }

    #[test]
    fn test_separator_in_namespace_overlaps() {
        let nested = Namespace::new("a:b");
        let outer = Namespace::new("a");

        assert_eq!(nested.encode("c"), outer.encode("b:c"));
        assert_eq!(outer.decode(&nested.encode("c")), Some("b:c"));
        assert_eq!(nested.decode(&outer.encode("b:c")), Some("c"));
    }

    #[test]
    fn test_prefix_is_not_a_bare_string_prefix() {
        // "app" must not claim keys of "apple"
        let ns = Namespace::new("app");
        assert!(!ns.contains("apple:k"));
        assert!(ns.contains("app:k"));
    }
}
