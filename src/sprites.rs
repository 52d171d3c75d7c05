//! Valid sprite identifiers
//!
//! The room only ever asks whether a sprite key is known. The set is built
//! once at startup from the game's asset index and shared by every room.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::AppError;

/// Directory marker key present in every cache section of the asset index
const DIRNAME_KEY: &str = "_dirname";

/// Immutable, cheaply clonable set of sprite keys
#[derive(Debug, Clone, Default)]
pub struct SpriteSet(Arc<HashSet<String>>);

/// The part of the asset index we care about
#[derive(Debug, Deserialize)]
struct AssetIndex {
    cache: AssetCache,
}

#[derive(Debug, Deserialize)]
struct AssetCache {
    charset: HashMap<String, serde_json::Value>,
}

impl SpriteSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(names.into_iter().map(Into::into).collect()))
    }

    /// Build the set from the JSON asset index
    ///
    /// Every key under `cache.charset` except the directory marker is a
    /// sprite.
    pub fn from_manifest(json: &str) -> Result<Self, AppError> {
        let index: AssetIndex = serde_json::from_str(json)?;
        Ok(Self::new(
            index
                .cache
                .charset
                .into_keys()
                .filter(|key| key != DIRNAME_KEY),
        ))
    }

    /// Read and parse the asset index at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_manifest(&json)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_skips_dirname() {
        let json = r#"{
            "cache": {
                "charset": {
                    "_dirname": "charset",
                    "hero": "hero.png",
                    "ghost": {"w": 24}
                },
                "music": {"_dirname": "music"}
            }
        }"#;
        let sprites = SpriteSet::from_manifest(json).unwrap();

        assert_eq!(sprites.len(), 2);
        assert!(sprites.contains("hero"));
        assert!(sprites.contains("ghost"));
        assert!(!sprites.contains("_dirname"));
    }

    #[test]
    fn test_manifest_missing_charset() {
        let json = r#"{"cache": {}}"#;
        assert!(matches!(
            SpriteSet::from_manifest(json),
            Err(AppError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            SpriteSet::load("/nonexistent/index.json"),
            Err(AppError::Io(_))
        ));
    }

    #[test]
    fn test_clones_share_contents() {
        let sprites = SpriteSet::new(["a", "b"]);
        let shared = sprites.clone();
        assert!(shared.contains("a"));
        assert!(!shared.contains("c"));
        assert!(!shared.is_empty());
    }
}
