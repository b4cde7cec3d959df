use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// A namespaced registry name, `domain:path`.
///
/// Equality is exact on both components. The domain may be empty, in which
/// case the name renders as the bare path. Use [`ResourceLocation::similar_to`]
/// to match names across mod versions that only changed casing or switched
/// between `camelCase` and `snake_case`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocation {
    domain: String,
    path: String,
}

impl ResourceLocation {
    /// Build from explicit components.
    pub fn new(domain: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            path: path.into(),
        }
    }

    /// Split a raw name on its first `:`. A name without a colon has an empty
    /// domain. Never fails; use [`FromStr`] when the text must be a valid
    /// single-token name.
    pub fn from_name(name: &str) -> Self {
        match name.split_once(':') {
            Some((domain, path)) => Self::new(domain, path),
            None => Self::new("", name),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` if this name lives in `domain`.
    pub fn is_in_domain(&self, domain: &str) -> bool {
        self.domain == domain
    }

    /// Compare against a string-encoded name. The domain must match exactly,
    /// paths are compared after lowercasing and dropping underscores.
    ///
    /// ```
    /// use mcw_types::ResourceLocation;
    ///
    /// let name = ResourceLocation::from_name("modid:blockName");
    /// assert!(name.similar_to("modid:block_name"));
    /// assert!(!name.similar_to("other:block_name"));
    /// ```
    pub fn similar_to(&self, other: &str) -> bool {
        let mut parts = other.split(':');
        let (Some(domain), Some(path), None) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };
        domain == self.domain && normalize(path) == normalize(&self.path)
    }

    /// [`similar_to`](Self::similar_to) for an already parsed name.
    pub fn is_similar(&self, other: &ResourceLocation) -> bool {
        other.domain == self.domain && normalize(&other.path) == normalize(&self.path)
    }
}

fn normalize(path: &str) -> String {
    path.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.domain.is_empty() {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{}:{}", self.domain, self.path)
        }
    }
}

impl FromStr for ResourceLocation {
    type Err = TypeError;

    /// Strict parse: the text must be a single non-empty token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidResourceName(s.to_string()));
        }
        let location = Self::from_name(s);
        if location.path.is_empty() {
            return Err(TypeError::InvalidResourceName(s.to_string()));
        }
        Ok(location)
    }
}

impl Serialize for ResourceLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}
