//! Validated block identifiers.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A block identifier was not a lowercase `[a-z0-9_:]+` token.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid block type {0:?}: expected a lowercase [a-z0-9_:] identifier")]
pub struct InvalidBlockType(pub String);

/// A block identifier in the target world's namespace, e.g. `stone` or
/// `minecraft:gold_block`. Validated at the boundary so command text never
/// carries injection-prone strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockType(String);

impl BlockType {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidBlockType> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == ':');
        if valid {
            Ok(Self(name))
        } else {
            Err(InvalidBlockType(name))
        }
    }

    /// The standard clearing block.
    pub fn air() -> Self {
        Self("air".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BlockType {
    type Err = InvalidBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
