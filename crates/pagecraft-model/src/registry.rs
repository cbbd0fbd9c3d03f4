#![forbid(unsafe_code)]

//! Tag-to-type registry for polymorphic relations.
//!
//! Lookup is two-level: a relation-local [`TypeMap`] first, then the
//! process-wide default table. The default is swapped wholesale by
//! [`set_default_type_map`] and read lock-free, so a table installed at
//! startup is seen consistently by every reader.
//!
//! ```ignore
//! set_default_type_map(TypeMap::new().with::<TextBlock>().with::<ImageBlock>());
//! let info = resolve_type(&TypeMap::new(), "text").unwrap();
//! assert!(info.is_a("block"));
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock};

use ahash::AHashMap;
use arc_swap::ArcSwap;
use pagecraft_history::{Historian, ObjectRef};

use crate::contract::FieldSpec;
use crate::error::ModelError;
use crate::model::{ModelRc, ModelType};

/// Builds a model from a data node and the history it should record into.
pub type Constructor = fn(ObjectRef, &Historian) -> Result<ModelRc, ModelError>;

/// Static description of a model type.
pub struct TypeInfo {
    /// Serialization tag stamped into `_type`.
    pub tag: &'static str,
    /// Ancestor tags, nearest first.
    pub lineage: &'static [&'static str],
    pub contract: &'static [FieldSpec],
    pub construct: Constructor,
}

impl TypeInfo {
    /// Exact match or ancestor.
    #[must_use]
    pub fn is_a(&self, tag: &str) -> bool {
        self.tag == tag || self.lineage.contains(&tag)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("tag", &self.tag)
            .field("lineage", &self.lineage)
            .finish_non_exhaustive()
    }
}

/// Which resolved types a polymorphic relation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeConstraint {
    #[default]
    Any,
    /// The tag itself or any type that lists it in its lineage.
    Tag(&'static str),
    /// Any of the tags (each with its descendants).
    OneOf(&'static [&'static str]),
}

impl TypeConstraint {
    #[must_use]
    pub fn admits(&self, info: &TypeInfo) -> bool {
        match self {
            Self::Any => true,
            Self::Tag(tag) => info.is_a(tag),
            Self::OneOf(tags) => tags.iter().any(|tag| info.is_a(tag)),
        }
    }
}

/// Mapping from tag to type.
#[derive(Clone, Default)]
pub struct TypeMap {
    types: AHashMap<String, &'static TypeInfo>,
}

impl fmt::Debug for TypeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags = self.tags();
        tags.sort_unstable();
        f.debug_tuple("TypeMap").field(&tags).finish()
    }
}

impl TypeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its own tag.
    #[must_use]
    pub fn with<T: ModelType>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn register<T: ModelType>(&mut self) {
        self.insert(T::TYPE_INFO.tag, T::TYPE_INFO);
    }

    /// Register `info` under an arbitrary tag. Replaces any previous entry.
    pub fn insert(&mut self, tag: impl Into<String>, info: &'static TypeInfo) {
        self.types.insert(tag.into(), info);
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&'static TypeInfo> {
        self.types.get(tag).copied()
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    /// Entries of `other` win over existing ones.
    pub fn extend(&mut self, other: &TypeMap) {
        self.types.extend(other.types.iter().map(|(tag, info)| (tag.clone(), *info)));
    }
}

static DEFAULT_TYPES: LazyLock<ArcSwap<TypeMap>> =
    LazyLock::new(|| ArcSwap::from_pointee(TypeMap::new()));

/// Replace the process-wide table. Last writer wins.
pub fn set_default_type_map(map: TypeMap) {
    DEFAULT_TYPES.store(Arc::new(map));
}

/// Snapshot of the process-wide table.
#[must_use]
pub fn default_types() -> Arc<TypeMap> {
    DEFAULT_TYPES.load_full()
}

/// Look `tag` up in `local`, then in the process-wide table.
#[must_use]
pub fn resolve_type(local: &TypeMap, tag: &str) -> Option<&'static TypeInfo> {
    local.get(tag).or_else(|| DEFAULT_TYPES.load().get(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbuildable(_node: ObjectRef, _historian: &Historian) -> Result<ModelRc, ModelError> {
        Err(ModelError::MissingTypeTag { prop: String::new() })
    }

    static BLOCK: TypeInfo = TypeInfo {
        tag: "block",
        lineage: &[],
        contract: &[],
        construct: unbuildable,
    };

    static TEXT: TypeInfo = TypeInfo {
        tag: "text",
        lineage: &["block"],
        contract: &[],
        construct: unbuildable,
    };

    static IMAGE: TypeInfo = TypeInfo {
        tag: "media.image",
        lineage: &["media"],
        contract: &[],
        construct: unbuildable,
    };

    #[test]
    fn lineage_drives_constraints() {
        assert!(TEXT.is_a("text"));
        assert!(TEXT.is_a("block"));
        assert!(!BLOCK.is_a("text"));

        assert!(TypeConstraint::Any.admits(&IMAGE));
        assert!(TypeConstraint::Tag("block").admits(&TEXT));
        assert!(!TypeConstraint::Tag("block").admits(&IMAGE));
        assert!(TypeConstraint::OneOf(&["media", "block"]).admits(&IMAGE));
        assert!(!TypeConstraint::OneOf(&["text"]).admits(&BLOCK));
    }

    #[test]
    fn map_insert_replaces_and_extend_overrides() {
        let mut map = TypeMap::new();
        map.insert("text", &TEXT);
        map.insert("text", &BLOCK);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("text").map(|info| info.tag), Some("block"));

        let mut other = TypeMap::new();
        other.insert("text", &TEXT);
        other.insert("media.image", &IMAGE);
        map.extend(&other);
        assert_eq!(map.get("text").map(|info| info.tag), Some("text"));
        assert!(map.contains("media.image"));
        assert_eq!(format!("{map:?}"), r#"TypeMap(["media.image", "text"])"#);
    }

    #[test]
    fn local_map_wins_over_default() {
        let mut local = TypeMap::new();
        local.insert("block", &TEXT);
        assert_eq!(resolve_type(&local, "block").map(|info| info.tag), Some("text"));
        assert!(resolve_type(&local, "not-registered-anywhere").is_none());
    }
}
