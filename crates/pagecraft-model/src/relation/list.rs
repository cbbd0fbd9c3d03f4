#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use pagecraft_history::{TrackedArray, Value};
use tracing::warn;

use super::{
    ChildCache, ChildResolver, Fixed, Morph, Relation, RelationOptions, TARGET, check_history,
};
use crate::data_controller::DataController;
use crate::error::ModelError;
use crate::model::{Model, ModelType};

/// A property holding an ordered array of child objects.
///
/// Membership is by identity: a child is a member while its data node is an
/// element of the array.
pub struct ListRelation<R: ChildResolver> {
    options: RelationOptions,
    parent: DataController,
    resolver: R,
    cached: RefCell<ChildCache<R::Child>>,
}

impl<R: ChildResolver + fmt::Debug> fmt::Debug for ListRelation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListRelation")
            .field("options", &self.options)
            .field("resolver", &self.resolver)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<T: ModelType> ListRelation<Fixed<T>> {
    pub fn has_many(
        parent: &DataController,
        options: RelationOptions,
    ) -> Result<Self, ModelError> {
        Self::new(parent, options, Fixed::default())
    }
}

impl ListRelation<Morph> {
    pub fn morph_many(
        parent: &DataController,
        options: RelationOptions,
        morph: Morph,
    ) -> Result<Self, ModelError> {
        Self::new(parent, options, morph)
    }
}

impl<R: ChildResolver> ListRelation<R> {
    /// Bind to `parent`, materializing the default (or `[]`) and validating
    /// every member.
    pub fn new(
        parent: &DataController,
        options: RelationOptions,
        resolver: R,
    ) -> Result<Self, ModelError> {
        let relation = Self {
            options,
            parent: parent.clone(),
            resolver,
            cached: RefCell::new(ChildCache::new()),
        };
        relation.materialize_default();
        relation.value()?;
        Ok(relation)
    }

    fn materialize_default(&self) {
        if self.parent.raw().contains_key(self.options.property()) {
            return;
        }
        let default = self
            .options
            .default_value()
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
        let prop = self.options.property().to_owned();
        self.parent
            .historian()
            .off_the_record(|| self.parent.set(prop, default));
    }

    /// Tracked view of the backing array, re-creating it off the record if
    /// the property has gone missing.
    fn array(&self) -> Result<TrackedArray, ModelError> {
        let prop = self.options.property();
        match self.parent.get(prop) {
            Some(Value::Array(_)) => {}
            None => self.materialize_default(),
            Some(other) => return Err(ModelError::invalid(prop, "array of objects", other.kind())),
        }
        self.parent
            .tracked()
            .array(prop)
            .ok_or_else(|| ModelError::invalid(prop, "array of objects", self.build_data().kind()))
    }

    #[must_use]
    pub fn options(&self) -> &RelationOptions {
        &self.options
    }

    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self.build_data() {
            Value::Array(array) => array.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, child: &R::Child) -> bool {
        match self.build_data() {
            Value::Array(array) => array
                .position_of(&Value::Object(child.node().clone()))
                .is_some(),
            _ => false,
        }
    }

    /// Append `child`.
    ///
    /// Rejects a child that is already a member with
    /// [`ModelError::DuplicateMember`].
    pub fn push(&self, child: Rc<R::Child>) -> Result<(), ModelError> {
        let array = self.admit(&child)?;
        array.push(Value::Object(child.node().clone()));
        self.remember(child);
        Ok(())
    }

    /// Insert `child` at `index`.
    pub fn insert(&self, index: usize, child: Rc<R::Child>) -> Result<(), ModelError> {
        let array = self.admit(&child)?;
        array.splice(index, 0, [Value::Object(child.node().clone())])?;
        self.remember(child);
        Ok(())
    }

    /// Remove `child`. A child that is not a member is logged and ignored.
    pub fn remove(&self, child: &R::Child) -> bool {
        let node = Value::Object(child.node().clone());
        let removed = self
            .array()
            .ok()
            .and_then(|array| array.remove_node(&node))
            .is_some();
        if !removed {
            warn!(
                target: TARGET,
                relation = self.options.name(),
                "tried to remove a child that is not a member"
            );
        }
        removed
    }

    fn admit(&self, child: &Rc<R::Child>) -> Result<TrackedArray, ModelError> {
        self.resolver.check(self.options.property(), child)?;
        check_history(&self.options, self.parent.historian(), &**child)?;
        if self.contains(child) {
            return Err(ModelError::DuplicateMember {
                relation: self.options.name().to_owned(),
            });
        }
        self.array()
    }

    fn remember(&self, child: Rc<R::Child>) {
        self.cached.borrow_mut().insert(child);
    }
}

impl<R: ChildResolver> Relation for ListRelation<R> {
    type Value = Vec<Rc<R::Child>>;

    fn name(&self) -> &str {
        self.options.name()
    }

    fn prop(&self) -> &str {
        self.options.property()
    }

    fn value(&self) -> Result<Self::Value, ModelError> {
        let prop = self.options.property();
        let items = match self.parent.get(prop) {
            None => Vec::new(),
            Some(Value::Array(array)) => array.to_vec(),
            Some(other) => return Err(ModelError::invalid(prop, "array of objects", other.kind())),
        };

        let historian = self.parent.historian();
        let mut members = AHashMap::with_capacity(items.len());
        let mut children = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Value::Object(node) = item else {
                return Err(ModelError::invalid(format!("{prop}[{index}]"), "object", item.kind()));
            };
            let cached = self.cached.borrow().lookup(node);
            let child = match cached {
                Some(child) => child,
                None => self.resolver.resolve(prop, node, historian)?,
            };
            members.insert(node.id(), child.clone());
            children.push(child);
        }
        self.cached.borrow_mut().replace_live(members);
        Ok(children)
    }

    /// Replace every member, keeping the backing array node.
    fn set_value(&self, value: Self::Value) -> Result<(), ModelError> {
        let prop = self.options.property();
        let mut nodes: Vec<Value> = Vec::with_capacity(value.len());
        for child in &value {
            self.resolver.check(prop, child)?;
            check_history(&self.options, self.parent.historian(), &**child)?;
            let node = Value::Object(child.node().clone());
            if nodes.iter().any(|n| n.same_node(&node)) {
                return Err(ModelError::DuplicateMember {
                    relation: self.options.name().to_owned(),
                });
            }
            nodes.push(node);
        }

        let array = self.array()?;
        let len = array.len();
        self.parent
            .historian()
            .transaction(|| array.splice(0, len, nodes).map(drop))?;

        let members = value.into_iter().map(|child| (child.node().id(), child)).collect();
        self.cached.borrow_mut().replace_live(members);
        Ok(())
    }

    fn build_data(&self) -> Value {
        self.parent.get(self.options.property()).unwrap_or_default()
    }
}
