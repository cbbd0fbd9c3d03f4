#![forbid(unsafe_code)]

//! Shared, JSON-shaped value graph.
//!
//! Model data lives in a tree of [`Value`]s whose container nodes
//! ([`ObjectRef`], [`ArrayRef`]) are reference-counted handles. Cloning a
//! `Value` clones the handle, so a child model and its parent can point at
//! the *same* object node: an edit made through either one is visible to
//! both.
//!
//! # Identity vs. equality
//!
//! - `==` compares content (deep structural equality).
//! - [`ObjectRef::ptr_eq`] / [`ArrayRef::ptr_eq`] / [`Value::same_node`]
//!   compare identity.
//!
//! # Mutation
//!
//! Nodes are read-only outside this crate. All writes go through the tracked
//! wrappers in [`crate::proxy`] (which record an [`Action`](crate::Action)),
//! and the only direct writers are the action replay routines.
//!
//! # Failure Modes
//!
//! - **Cycles**: inserting a node into its own subtree creates a reference
//!   cycle. Deep operations (`deep_clone`, `to_json`, `==`, `Debug`) recurse
//!   without a visited set and will not terminate on such a graph.

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

/// Property map stored inside an object node.
pub type Map = BTreeMap<String, Value>;

/// A node in the tracked data graph.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(ArrayRef),
    Object(ObjectRef),
}

/// Coarse shape of a [`Value`], used by data contracts and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// Shared handle to an object node.
#[derive(Clone, Default)]
pub struct ObjectRef(Rc<RefCell<Map>>);

/// Shared handle to an array node.
#[derive(Clone, Default)]
pub struct ArrayRef(Rc<RefCell<Vec<Value>>>);

// ============================================================================
// Value
// ============================================================================

impl Value {
    /// A fresh, empty object node.
    #[must_use]
    pub fn object() -> Self {
        Self::Object(ObjectRef::new())
    }

    /// A fresh array node holding `items`.
    #[must_use]
    pub fn array(items: Vec<Value>) -> Self {
        Self::Array(ArrayRef::from_vec(items))
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Identity of the container node, if this value is one.
    #[must_use]
    pub fn node_id(&self) -> Option<usize> {
        match self {
            Self::Object(o) => Some(o.id()),
            Self::Array(a) => Some(a.id()),
            _ => None,
        }
    }

    /// Identity comparison for containers, equality for scalars.
    #[must_use]
    pub fn same_node(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            (Self::Object(_) | Self::Array(_), _) | (_, Self::Object(_) | Self::Array(_)) => false,
            _ => self == other,
        }
    }

    /// Independent copy of the whole subtree.
    #[must_use]
    pub fn deep_clone(&self) -> Value {
        match self {
            Self::Array(a) => Self::Array(a.deep_clone()),
            Self::Object(o) => Self::Object(o.deep_clone()),
            scalar => scalar.clone(),
        }
    }

    /// Convert to an independent `serde_json::Value`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::Number(n.clone()),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(a) => a.to_json(),
            Self::Object(o) => o.to_json(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(a) => a.fmt(f),
            Self::Object(o) => o.fmt(f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(ObjectRef::from_map(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Self::Object(o)
    }
}

impl From<ArrayRef> for Value {
    fn from(a: ArrayRef) -> Self {
        Self::Array(a)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::array(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(a) => a.serialize(serializer),
            Self::Object(o) => o.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

// ============================================================================
// ObjectRef
// ============================================================================

impl ObjectRef {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(map: Map) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    /// Build an object node from JSON. Returns `None` for non-objects.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match Value::from(json) {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Stable identity of this node for as long as it is alive.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the property map for reading.
    ///
    /// # Panics
    ///
    /// Panics if the node is being replayed at the same time (RefCell rules).
    pub fn borrow(&self) -> Ref<'_, Map> {
        self.0.borrow()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub(crate) fn insert(&self, key: String, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key, value)
    }

    pub(crate) fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    #[must_use]
    pub fn deep_clone(&self) -> ObjectRef {
        let map = self
            .0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.deep_clone()))
            .collect();
        Self::from_map(map)
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

impl Serialize for ObjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map = self.0.borrow();
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (k, v) in map.iter() {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

// ============================================================================
// ArrayRef
// ============================================================================

impl ArrayRef {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Shallow copy of the elements (container handles are shared).
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    /// Position of the element that is the very same node as `node`.
    #[must_use]
    pub fn position_of(&self, node: &Value) -> Option<usize> {
        self.0.borrow().iter().position(|v| v.same_node(node))
    }

    /// Overwrite an element in place. Out-of-range writes are ignored.
    pub(crate) fn replace(&self, index: usize, value: Value) -> Option<Value> {
        let mut items = self.0.borrow_mut();
        let slot = items.get_mut(index)?;
        Some(std::mem::replace(slot, value))
    }

    /// Remove `delete_count` elements at `index` and insert `items` there.
    ///
    /// Both bounds are clamped to the current length so replay never panics.
    pub(crate) fn splice(
        &self,
        index: usize,
        delete_count: usize,
        items: Vec<Value>,
    ) -> Vec<Value> {
        let mut vec = self.0.borrow_mut();
        let start = index.min(vec.len());
        let end = start.saturating_add(delete_count).min(vec.len());
        vec.splice(start..end, items).collect()
    }

    #[must_use]
    pub fn deep_clone(&self) -> ArrayRef {
        Self::from_vec(self.0.borrow().iter().map(Value::deep_clone).collect())
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.0.borrow().iter().map(Value::to_json).collect())
    }
}

impl PartialEq for ArrayRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

impl Serialize for ArrayRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let items = self.0.borrow();
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items.iter() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_preserves_content() {
        let json = json!({"a": [1, 2, {"b": null}], "c": "text", "d": true});
        let value = Value::from(json.clone());
        assert_eq!(value.to_json(), json);
        assert_eq!(value.to_string(), json.to_string());
    }

    #[test]
    fn clone_shares_identity_deep_clone_does_not() {
        let value = Value::from(json!({"inner": {"x": 1}}));
        let shallow = value.clone();
        let deep = value.deep_clone();

        assert!(value.same_node(&shallow));
        assert!(!value.same_node(&deep));
        assert_eq!(value, deep);

        let obj = value.as_object().unwrap();
        obj.insert("y".into(), Value::from(2));
        assert_eq!(shallow.as_object().unwrap().get("y"), Some(Value::from(2)));
        assert!(!deep.as_object().unwrap().contains_key("y"));
    }

    #[test]
    fn equality_is_structural() {
        let a = Value::from(json!([1, {"k": "v"}]));
        let b = Value::from(json!([1, {"k": "v"}]));
        assert_eq!(a, b);
        assert!(!a.same_node(&b));
        assert_ne!(a, Value::from(json!([1, {"k": "w"}])));
    }

    #[test]
    fn scalars_compare_by_value_in_same_node() {
        assert!(Value::from(3).same_node(&Value::from(3)));
        assert!(!Value::from("a").same_node(&Value::object()));
    }

    #[test]
    fn splice_clamps_out_of_range_bounds() {
        let array = ArrayRef::from_vec(vec![Value::from(1), Value::from(2)]);
        let removed = array.splice(1, 10, vec![Value::from(9)]);
        assert_eq!(removed, vec![Value::from(2)]);
        assert_eq!(array.to_json(), json!([1, 9]));

        let removed = array.splice(50, 1, vec![Value::from(3)]);
        assert!(removed.is_empty());
        assert_eq!(array.to_json(), json!([1, 9, 3]));
    }

    #[test]
    fn position_of_uses_identity() {
        let first = Value::object();
        let twin = Value::object();
        let array = ArrayRef::from_vec(vec![twin.clone(), first.clone()]);
        assert_eq!(array.position_of(&first), Some(1));
        assert_eq!(array.position_of(&twin), Some(0));
        assert_eq!(array.position_of(&Value::object()), None);
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert!(Value::from(f64::NAN).is_null());
        assert_eq!(Value::from(1.5).as_f64(), Some(1.5));
    }

    #[test]
    fn serde_matches_json_conversion() {
        let value = Value::from(json!({"list": [1, "two"], "flag": false}));
        let text = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
        assert_eq!(serde_json::from_str::<serde_json::Value>(&text).unwrap(), value.to_json());
    }

    #[test]
    fn kind_display() {
        assert_eq!(Value::object().kind().to_string(), "object");
        assert_eq!(Value::from("x").kind(), ValueKind::String);
    }
}
