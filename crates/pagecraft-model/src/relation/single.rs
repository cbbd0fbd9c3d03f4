#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use pagecraft_history::Value;

use super::{ChildCache, ChildResolver, Fixed, Morph, Relation, RelationOptions, check_history};
use crate::data_controller::DataController;
use crate::error::ModelError;
use crate::model::{Model, ModelRc, ModelType};

/// A property holding one child object or `null`.
pub struct SingleRelation<R: ChildResolver> {
    options: RelationOptions,
    parent: DataController,
    resolver: R,
    cached: RefCell<ChildCache<R::Child>>,
}

impl<R: ChildResolver + fmt::Debug> fmt::Debug for SingleRelation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleRelation")
            .field("options", &self.options)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl<T: ModelType> SingleRelation<Fixed<T>> {
    pub fn has_one(
        parent: &DataController,
        options: RelationOptions,
    ) -> Result<Self, ModelError> {
        Self::new(parent, options, Fixed::default())
    }
}

impl SingleRelation<Morph> {
    pub fn morph_one(
        parent: &DataController,
        options: RelationOptions,
        morph: Morph,
    ) -> Result<Self, ModelError> {
        Self::new(parent, options, morph)
    }
}

impl<R: ChildResolver> SingleRelation<R> {
    /// Bind to `parent`, materializing a declared default and validating
    /// the current data.
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
        if let Some(default) = self.options.default_value().filter(|d| !d.is_null()) {
            let prop = self.options.property().to_owned();
            self.parent
                .historian()
                .off_the_record(|| self.parent.set(prop, default));
        }
    }

    #[must_use]
    pub fn options(&self) -> &RelationOptions {
        &self.options
    }

    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// True if the property currently holds a child object.
    #[must_use]
    pub fn is_some(&self) -> bool {
        matches!(self.parent.get(self.options.property()), Some(Value::Object(_)))
    }

    /// Remove the child, leaving `null`, as one undo step.
    pub fn clear(&self) {
        let prop = self.options.property().to_owned();
        let parent = &self.parent;
        parent.historian().batch(|| parent.set(prop, Value::Null));
        self.cached.borrow_mut().replace_live(AHashMap::new());
    }
}

impl<R: ChildResolver> Relation for SingleRelation<R> {
    type Value = Option<Rc<R::Child>>;

    fn name(&self) -> &str {
        self.options.name()
    }

    fn prop(&self) -> &str {
        self.options.property()
    }

    fn value(&self) -> Result<Self::Value, ModelError> {
        let prop = self.options.property();
        let node = match self.parent.get(prop) {
            None | Some(Value::Null) => {
                self.cached.borrow_mut().replace_live(AHashMap::new());
                return Ok(None);
            }
            Some(Value::Object(node)) => node,
            Some(other) => return Err(ModelError::invalid(prop, "object or null", other.kind())),
        };

        let cached = self.cached.borrow().lookup(&node);
        let child = match cached {
            Some(child) => child,
            None => self.resolver.resolve(prop, &node, self.parent.historian())?,
        };
        self.remember(child.clone());
        Ok(Some(child))
    }

    fn set_value(&self, value: Self::Value) -> Result<(), ModelError> {
        let prop = self.options.property().to_owned();
        let data = match &value {
            Some(child) => {
                self.resolver.check(&prop, child)?;
                check_history(&self.options, self.parent.historian(), &**child)?;
                Value::Object(child.node().clone())
            }
            None => Value::Null,
        };
        let parent = &self.parent;
        parent.historian().batch(|| parent.set(prop, data));
        match value {
            Some(child) => self.remember(child),
            None => self.cached.borrow_mut().replace_live(AHashMap::new()),
        }
        Ok(())
    }

    fn build_data(&self) -> Value {
        self.parent.get(self.options.property()).unwrap_or_default()
    }
}

impl<R: ChildResolver> SingleRelation<R> {
    fn remember(&self, child: Rc<R::Child>) {
        let members = AHashMap::from_iter([(child.node().id(), child)]);
        self.cached.borrow_mut().replace_live(members);
    }
}

/// Convenience for morph values that hold a concrete model.
impl SingleRelation<Morph> {
    /// The child downcast to `T`, if it is one.
    pub fn value_as<T: ModelType>(&self) -> Result<Option<Rc<T>>, ModelError> {
        Ok(self.value()?.and_then(crate::model::downcast_model::<T>))
    }

    pub fn set_model<T: ModelType>(&self, child: Rc<T>) -> Result<(), ModelError> {
        self.set_value(Some(child as ModelRc))
    }
}
