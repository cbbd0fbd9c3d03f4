#![forbid(unsafe_code)]

//! Tracked views over the value graph.
//!
//! [`TrackedObject`] and [`TrackedArray`] wrap a node together with the
//! [`Historian`] that owns its history. Every mutating method builds the
//! matching [`Action`] and hands it to [`Historian::perform`], so the write
//! and its inverse are recorded in one place.
//!
//! Reads hand out raw values. Nested containers are wrapped on demand by
//! [`TrackedObject::tracked`] / [`TrackedArray::tracked`]; wrappers are
//! cached per node so repeated reads return the same handle.
//!
//! # Action mapping
//!
//! | Operation                 | Recorded as                              |
//! |---------------------------|------------------------------------------|
//! | `set` existing key        | `Set { Property }`                       |
//! | `set` absent key          | `Create`                                 |
//! | `delete` present key      | `Delete`                                 |
//! | array `set`               | `Set { Element }`                        |
//! | push/pop/shift/unshift    | `Splice` at the end or front             |
//! | `splice`                  | `Splice` with the clamped deleted run    |
//! | `sort_by`                 | one `Transaction` of element `Set`s      |

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use tracing::warn;

use crate::action::{Action, Slot};
use crate::error::HistoryError;
use crate::historian::Historian;
use crate::value::{ArrayRef, ObjectRef, Value};

const TARGET: &str = "pagecraft.history";

/// A tracked container of either shape.
#[derive(Clone, Debug)]
pub enum Tracked {
    Object(TrackedObject),
    Array(TrackedArray),
}

/// Wrap `value` for tracked mutation. Scalars are returned as `None`.
#[must_use]
pub fn track(historian: &Historian, value: &Value) -> Option<Tracked> {
    match value {
        Value::Object(object) => {
            Some(Tracked::Object(TrackedObject::new(historian, object.clone())))
        }
        Value::Array(array) => Some(Tracked::Array(TrackedArray::new(historian, array.clone()))),
        _ => None,
    }
}

impl Tracked {
    #[must_use]
    pub fn as_object(&self) -> Option<&TrackedObject> {
        match self {
            Self::Object(o) => Some(o),
            Self::Array(_) => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&TrackedArray> {
        match self {
            Self::Array(a) => Some(a),
            Self::Object(_) => None,
        }
    }

    /// The wrapped node as a raw value.
    #[must_use]
    pub fn value(&self) -> Value {
        match self {
            Self::Object(o) => Value::Object(o.target().clone()),
            Self::Array(a) => Value::Array(a.target().clone()),
        }
    }

    fn wraps(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Object(o), Value::Object(node)) => o.target().ptr_eq(node),
            (Self::Array(a), Value::Array(node)) => a.target().ptr_eq(node),
            _ => false,
        }
    }
}

// ============================================================================
// TrackedObject
// ============================================================================

struct ObjectProxy {
    target: ObjectRef,
    historian: Historian,
    children: RefCell<AHashMap<String, Tracked>>,
}

/// Recording handle over an object node.
#[derive(Clone)]
pub struct TrackedObject {
    inner: Rc<ObjectProxy>,
}

impl fmt::Debug for TrackedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TrackedObject").field(&self.inner.target).finish()
    }
}

impl TrackedObject {
    #[must_use]
    pub fn new(historian: &Historian, target: ObjectRef) -> Self {
        Self {
            inner: Rc::new(ObjectProxy {
                target,
                historian: historian.clone(),
                children: RefCell::new(AHashMap::new()),
            }),
        }
    }

    /// The raw node. Writes through it are not possible outside this crate.
    #[must_use]
    pub fn target(&self) -> &ObjectRef {
        &self.inner.target
    }

    #[must_use]
    pub fn historian(&self) -> &Historian {
        &self.inner.historian
    }

    /// True if both handles wrap the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &TrackedObject) -> bool {
        self.inner.target.ptr_eq(&other.inner.target)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.target.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.target.contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.target.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.target.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.target.is_empty()
    }

    /// Tracked wrapper for the container stored at `key`.
    ///
    /// The cached wrapper is reused only while it still wraps the node now
    /// stored under `key`.
    #[must_use]
    pub fn tracked(&self, key: &str) -> Option<Tracked> {
        let value = self.inner.target.get(key)?;
        let cached = self.inner.children.borrow().get(key).cloned();
        if let Some(cached) = cached.filter(|c| c.wraps(&value)) {
            return Some(cached);
        }
        let wrapped = track(&self.inner.historian, &value)?;
        self.inner.children.borrow_mut().insert(key.to_owned(), wrapped.clone());
        Some(wrapped)
    }

    #[must_use]
    pub fn object(&self, key: &str) -> Option<TrackedObject> {
        match self.tracked(key)? {
            Tracked::Object(o) => Some(o),
            Tracked::Array(_) => None,
        }
    }

    #[must_use]
    pub fn array(&self, key: &str) -> Option<TrackedArray> {
        match self.tracked(key)? {
            Tracked::Array(a) => Some(a),
            Tracked::Object(_) => None,
        }
    }

    /// Write `key`. Recorded as `Set` when the key exists, else `Create`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        let prop = key.into();
        let new_value = value.into();
        let object = self.inner.target.clone();
        let action = match object.get(&prop) {
            Some(old_value) => Action::Set {
                slot: Slot::Property {
                    object,
                    prop: prop.clone(),
                },
                old_value,
                new_value,
            },
            None => Action::Create {
                object,
                prop: prop.clone(),
                new_value,
            },
        };
        self.inner.children.borrow_mut().remove(&prop);
        self.inner.historian.perform(action);
    }

    /// Remove `key`. Returns `false` (and records nothing) if it was absent.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.children.borrow_mut().remove(key);
        let Some(old_value) = self.inner.target.get(key) else {
            return false;
        };
        self.inner.historian.perform(Action::Delete {
            object: self.inner.target.clone(),
            prop: key.to_owned(),
            old_value,
        });
        true
    }

    /// Refused: descriptor-level changes cannot be replayed.
    pub fn define_property(&self, key: &str, _value: Value) -> bool {
        warn!(target: TARGET, key, "define_property refused on tracked data");
        false
    }

    /// Refused: extensibility changes cannot be replayed.
    pub fn prevent_extensions(&self) -> bool {
        warn!(target: TARGET, "prevent_extensions refused on tracked data");
        false
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.inner.target.to_json()
    }
}

// ============================================================================
// TrackedArray
// ============================================================================

struct ArrayProxy {
    target: ArrayRef,
    historian: Historian,
    /// Keyed by element node id, so wrappers follow elements across moves.
    children: RefCell<AHashMap<usize, Tracked>>,
}

/// Recording handle over an array node.
#[derive(Clone)]
pub struct TrackedArray {
    inner: Rc<ArrayProxy>,
}

impl fmt::Debug for TrackedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TrackedArray").field(&self.inner.target).finish()
    }
}

impl TrackedArray {
    #[must_use]
    pub fn new(historian: &Historian, target: ArrayRef) -> Self {
        Self {
            inner: Rc::new(ArrayProxy {
                target,
                historian: historian.clone(),
                children: RefCell::new(AHashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn target(&self) -> &ArrayRef {
        &self.inner.target
    }

    #[must_use]
    pub fn historian(&self) -> &Historian {
        &self.inner.historian
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &TrackedArray) -> bool {
        self.inner.target.ptr_eq(&other.inner.target)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.target.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.target.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.target.get(index)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.target.to_vec()
    }

    /// Index of `node`, compared by identity for containers.
    #[must_use]
    pub fn position_of(&self, node: &Value) -> Option<usize> {
        self.inner.target.position_of(node)
    }

    #[must_use]
    pub fn tracked(&self, index: usize) -> Option<Tracked> {
        let value = self.inner.target.get(index)?;
        let id = value.node_id()?;
        let cached = self.inner.children.borrow().get(&id).cloned();
        if let Some(cached) = cached.filter(|c| c.wraps(&value)) {
            return Some(cached);
        }
        let wrapped = track(&self.inner.historian, &value)?;
        self.inner.children.borrow_mut().insert(id, wrapped.clone());
        Some(wrapped)
    }

    #[must_use]
    pub fn object(&self, index: usize) -> Option<TrackedObject> {
        match self.tracked(index)? {
            Tracked::Object(o) => Some(o),
            Tracked::Array(_) => None,
        }
    }

    #[must_use]
    pub fn array(&self, index: usize) -> Option<TrackedArray> {
        match self.tracked(index)? {
            Tracked::Array(a) => Some(a),
            Tracked::Object(_) => None,
        }
    }

    /// Overwrite an existing element.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<(), HistoryError> {
        let Some(old_value) = self.inner.target.get(index) else {
            return Err(HistoryError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        };
        self.forget(std::slice::from_ref(&old_value));
        self.inner.historian.perform(Action::Set {
            slot: Slot::Element {
                array: self.inner.target.clone(),
                index,
            },
            old_value,
            new_value: value.into(),
        });
        Ok(())
    }

    /// Append one item. Returns the new length.
    pub fn push(&self, item: impl Into<Value>) -> usize {
        self.push_many([item.into()])
    }

    pub fn push_many(&self, items: impl IntoIterator<Item = Value>) -> usize {
        let index = self.len();
        self.record_splice(index, Vec::new(), items.into_iter().collect());
        self.len()
    }

    /// Remove the last item.
    ///
    /// An empty array still records a (no-op) splice at index 0.
    pub fn pop(&self) -> Option<Value> {
        let len = self.len();
        let index = len.saturating_sub(1);
        let removed = if len == 0 { None } else { self.get(index) };
        self.record_splice(index, removed.iter().cloned().collect(), Vec::new());
        removed
    }

    /// Remove the first item.
    pub fn shift(&self) -> Option<Value> {
        let removed = self.get(0);
        self.record_splice(0, removed.iter().cloned().collect(), Vec::new());
        removed
    }

    /// Prepend one item. Returns the new length.
    pub fn unshift(&self, item: impl Into<Value>) -> usize {
        self.unshift_many([item.into()])
    }

    pub fn unshift_many(&self, items: impl IntoIterator<Item = Value>) -> usize {
        self.record_splice(0, Vec::new(), items.into_iter().collect());
        self.len()
    }

    /// Replace `delete_count` items at `index` with `items`, returning the
    /// removed run. The run is clamped to the end of the array.
    pub fn splice(
        &self,
        index: usize,
        delete_count: usize,
        items: impl IntoIterator<Item = Value>,
    ) -> Result<Vec<Value>, HistoryError> {
        let len = self.len();
        if index > len {
            return Err(HistoryError::IndexOutOfBounds { index, len });
        }
        let end = index.saturating_add(delete_count).min(len);
        let deleted = self.inner.target.borrow()[index..end].to_vec();
        self.record_splice(index, deleted.clone(), items.into_iter().collect());
        Ok(deleted)
    }

    /// Remove the element that is `node` (identity for containers).
    pub fn remove_node(&self, node: &Value) -> Option<Value> {
        let index = self.position_of(node)?;
        let removed = self.get(index)?;
        self.record_splice(index, vec![removed.clone()], Vec::new());
        Some(removed)
    }

    /// Sort in place. Recorded as one step of element writes.
    pub fn sort_by(&self, mut compare: impl FnMut(&Value, &Value) -> Ordering) {
        let before = self.to_vec();
        let mut after = before.clone();
        after.sort_by(|a, b| compare(a, b));

        let array = &self.inner.target;
        self.inner.historian.batch(|| {
            for (index, (old_value, new_value)) in before.into_iter().zip(after).enumerate() {
                if old_value.same_node(&new_value) {
                    continue;
                }
                self.inner.historian.perform(Action::Set {
                    slot: Slot::Element {
                        array: array.clone(),
                        index,
                    },
                    old_value,
                    new_value,
                });
            }
        });
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.inner.target.to_json()
    }

    fn record_splice(&self, index: usize, deleted: Vec<Value>, items: Vec<Value>) {
        self.forget(&deleted);
        self.inner.historian.perform(Action::Splice {
            array: self.inner.target.clone(),
            index,
            deleted,
            items,
        });
    }

    fn forget(&self, removed: &[Value]) {
        let mut children = self.inner.children.borrow_mut();
        for id in removed.iter().filter_map(Value::node_id) {
            children.remove(&id);
        }
    }
}
