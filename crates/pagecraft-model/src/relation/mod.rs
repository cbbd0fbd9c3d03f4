#![forbid(unsafe_code)]

//! Relations: named edges from a parent model's data to child models.
//!
//! A relation never keeps a child list of its own. Its value is derived from
//! whatever sits at the parent's property right now, so undoing an edit to
//! the data is immediately visible through the relation. Child models are
//! cached by the identity of their data node: a child removed and then
//! restored by undo comes back as the same instance.
//!
//! | alias            | value              | child type             |
//! |------------------|--------------------|------------------------|
//! | [`HasOne<T>`]    | `Option<Rc<T>>`    | fixed `T`              |
//! | [`HasMany<T>`]   | `Vec<Rc<T>>`       | fixed `T`              |
//! | [`MorphOne`]     | `Option<ModelRc>`  | resolved from `_type`  |
//! | [`MorphMany`]    | `Vec<ModelRc>`     | resolved from `_type`  |
//!
//! # Construction
//!
//! 1. Read the raw value at `prop` on the parent's untracked node.
//! 2. If absent, use the declared default and write it into the parent off
//!    the record.
//! 3. Validate the shape, resolve the child type, and build each child on
//!    the parent's historian.

mod list;
mod single;

use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use pagecraft_history::{Historian, ObjectRef, Value};

use crate::error::ModelError;
use crate::model::{Model, ModelType, TYPE_KEY};
use crate::registry::{TypeConstraint, TypeMap, resolve_type};

pub use list::ListRelation;
pub use single::SingleRelation;

/// Exactly one child of type `T`.
pub type HasOne<T> = SingleRelation<Fixed<T>>;
/// Ordered children of type `T`.
pub type HasMany<T> = ListRelation<Fixed<T>>;
/// One child whose type is read from its `_type` tag.
pub type MorphOne = SingleRelation<Morph>;
/// Ordered children whose types are read from their `_type` tags.
pub type MorphMany = ListRelation<Morph>;

const TARGET: &str = "pagecraft.model";

/// Common relation surface.
pub trait Relation {
    type Value;

    /// Accessor name on the parent.
    fn name(&self) -> &str;

    /// Data property the relation materializes into.
    fn prop(&self) -> &str;

    fn value(&self) -> Result<Self::Value, ModelError>;

    /// Replace the value, rewriting the parent's data as one undo step.
    fn set_value(&self, value: Self::Value) -> Result<(), ModelError>;

    /// The live data currently backing the value.
    fn build_data(&self) -> Value;
}

/// Name, property and default of a relation.
#[derive(Clone)]
pub struct RelationOptions {
    name: String,
    prop: Option<String>,
    default_data: Option<fn() -> serde_json::Value>,
}

impl fmt::Debug for RelationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationOptions")
            .field("name", &self.name)
            .field("prop", &self.property())
            .field("has_default", &self.default_data.is_some())
            .finish()
    }
}

impl RelationOptions {
    /// Options for a relation named `name`, stored under the same property.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prop: None,
            default_data: None,
        }
    }

    #[must_use]
    pub fn prop(mut self, prop: impl Into<String>) -> Self {
        self.prop = Some(prop.into());
        self
    }

    /// Data used when the parent has nothing at the property.
    #[must_use]
    pub fn default_data(mut self, default: fn() -> serde_json::Value) -> Self {
        self.default_data = Some(default);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn property(&self) -> &str {
        self.prop.as_deref().unwrap_or(&self.name)
    }

    fn default_value(&self) -> Option<serde_json::Value> {
        self.default_data.map(|default| default())
    }
}

/// Reject a child that does not record into the parent's history.
fn check_history<C: Model + ?Sized>(
    options: &RelationOptions,
    parent: &Historian,
    child: &C,
) -> Result<(), ModelError> {
    if child.historian().ptr_eq(parent) {
        Ok(())
    } else {
        Err(ModelError::ForeignHistory {
            relation: options.name().to_owned(),
        })
    }
}

/// Turns a child data node into a child model.
pub trait ChildResolver {
    type Child: Model + ?Sized;

    fn resolve(
        &self,
        prop: &str,
        node: &ObjectRef,
        historian: &Historian,
    ) -> Result<Rc<Self::Child>, ModelError>;

    /// Reject a ready-made child this relation cannot hold.
    fn check(&self, _prop: &str, _child: &Self::Child) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Resolver for a statically known child type.
pub struct Fixed<T>(PhantomData<fn() -> T>);

impl<T> Default for Fixed<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> fmt::Debug for Fixed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed<{}>", std::any::type_name::<T>())
    }
}

impl<T: ModelType> ChildResolver for Fixed<T> {
    type Child = T;

    fn resolve(
        &self,
        _prop: &str,
        node: &ObjectRef,
        historian: &Historian,
    ) -> Result<Rc<T>, ModelError> {
        Ok(Rc::new(T::from_node(node.clone(), historian)?))
    }
}

/// Resolver that reads the child's `_type` tag and looks it up in the
/// local map, then the process-wide one.
#[derive(Debug, Clone, Default)]
pub struct Morph {
    accepts: TypeConstraint,
    types: TypeMap,
}

impl Morph {
    #[must_use]
    pub fn new(accepts: TypeConstraint) -> Self {
        Self {
            accepts,
            types: TypeMap::new(),
        }
    }

    /// Local overrides, checked before the process-wide table.
    #[must_use]
    pub fn with_types(mut self, types: TypeMap) -> Self {
        self.types = types;
        self
    }

    #[must_use]
    pub fn accepts(&self) -> TypeConstraint {
        self.accepts
    }

    #[must_use]
    pub fn types(&self) -> &TypeMap {
        &self.types
    }
}

impl ChildResolver for Morph {
    type Child = dyn Model;

    fn resolve(
        &self,
        prop: &str,
        node: &ObjectRef,
        historian: &Historian,
    ) -> Result<Rc<dyn Model>, ModelError> {
        let tag = node
            .get(TYPE_KEY)
            .and_then(|tag| tag.as_str().map(str::to_owned))
            .ok_or_else(|| ModelError::MissingTypeTag { prop: prop.to_owned() })?;
        let info = resolve_type(&self.types, &tag).ok_or_else(|| ModelError::UnknownType {
            prop: prop.to_owned(),
            tag: tag.clone(),
        })?;
        if !self.accepts.admits(info) {
            return Err(ModelError::TypeMismatch {
                prop: prop.to_owned(),
                tag,
            });
        }
        (info.construct)(node.clone(), historian)
    }

    /// A ready-made child must be resolvable by tag, so that rebuilding it
    /// from data after undo yields the same type.
    fn check(&self, prop: &str, child: &dyn Model) -> Result<(), ModelError> {
        let info = child.type_info();
        if resolve_type(&self.types, info.tag).is_none() {
            return Err(ModelError::UnknownType {
                prop: prop.to_owned(),
                tag: info.tag.to_owned(),
            });
        }
        if self.accepts.admits(info) {
            Ok(())
        } else {
            Err(ModelError::TypeMismatch {
                prop: prop.to_owned(),
                tag: info.tag.to_owned(),
            })
        }
    }
}

/// Child models by data node id.
///
/// Current members are held strongly. Former members are only remembered
/// weakly, so a child that comes back through undo is the same instance for
/// as long as someone still holds it.
pub(crate) struct ChildCache<C: ?Sized> {
    live: AHashMap<usize, Rc<C>>,
    detached: AHashMap<usize, Weak<C>>,
}

impl<C: Model + ?Sized> ChildCache<C> {
    fn new() -> Self {
        Self {
            live: AHashMap::new(),
            detached: AHashMap::new(),
        }
    }

    fn lookup(&self, node: &ObjectRef) -> Option<Rc<C>> {
        let id = node.id();
        self.live
            .get(&id)
            .cloned()
            .or_else(|| self.detached.get(&id).and_then(Weak::upgrade))
            .filter(|child| child.node().ptr_eq(node))
    }

    fn insert(&mut self, child: Rc<C>) {
        let id = child.node().id();
        self.detached.remove(&id);
        self.live.insert(id, child);
    }

    /// Make `members` the live set; everything else becomes detached.
    fn replace_live(&mut self, members: AHashMap<usize, Rc<C>>) {
        let previous = std::mem::replace(&mut self.live, members);
        for (id, child) in previous {
            if !self.live.contains_key(&id) {
                self.detached.insert(id, Rc::downgrade(&child));
            }
        }
        let live = &self.live;
        self.detached
            .retain(|id, child| child.strong_count() > 0 && !live.contains_key(id));
    }
}

/// Generate getter/setter pairs that forward to relation fields.
///
/// ```ignore
/// relation_accessors! {
///     ContainerBlock {
///         children: children / set_children -> Vec<ModelRc>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! relation_accessors {
    ($ty:ty { $( $field:ident : $get:ident / $set:ident -> $value:ty ),* $(,)? }) => {
        impl $ty {
            $(
                #[doc = concat!("Current value of the `", stringify!($field), "` relation.")]
                pub fn $get(&self) -> ::std::result::Result<$value, $crate::ModelError> {
                    $crate::Relation::value(&self.$field)
                }

                #[doc = concat!("Replace the `", stringify!($field), "` relation in one step.")]
                pub fn $set(&self, value: $value) -> ::std::result::Result<(), $crate::ModelError> {
                    $crate::Relation::set_value(&self.$field, value)
                }
            )*
        }
    };
}
