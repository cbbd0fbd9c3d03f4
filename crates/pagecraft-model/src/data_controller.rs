#![forbid(unsafe_code)]

//! Owner of a model's backing data node.

use std::fmt;

use pagecraft_history::{Historian, ObjectRef, TrackedObject, Value};

/// Pairs a model's raw data node with the tracked view every edit goes
/// through. Cloning shares both.
#[derive(Clone)]
pub struct DataController {
    node: ObjectRef,
    proxy: TrackedObject,
}

impl fmt::Debug for DataController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataController").field(&self.node).finish()
    }
}

impl DataController {
    #[must_use]
    pub fn new(node: ObjectRef, historian: &Historian) -> Self {
        Self {
            proxy: TrackedObject::new(historian, node.clone()),
            node,
        }
    }

    #[must_use]
    pub fn historian(&self) -> &Historian {
        self.proxy.historian()
    }

    /// The recording view over the data.
    #[must_use]
    pub fn tracked(&self) -> &TrackedObject {
        &self.proxy
    }

    /// The backing node, for reads that must not go through tracking.
    #[must_use]
    pub fn raw(&self) -> &ObjectRef {
        &self.node
    }

    #[must_use]
    pub fn get(&self, prop: &str) -> Option<Value> {
        self.node.get(prop)
    }

    pub fn set(&self, prop: impl Into<String>, value: impl Into<Value>) {
        self.proxy.set(prop, value);
    }

    /// Write several properties as one undo step.
    pub fn set_many<K, V>(&self, values: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.historian().batch(|| {
            for (prop, value) in values {
                self.proxy.set(prop, value);
            }
        });
    }

    pub fn delete(&self, prop: &str) -> bool {
        self.proxy.delete(prop)
    }

    /// Independent deep copy of the data.
    #[must_use]
    pub fn clone_data(&self) -> serde_json::Value {
        self.node.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn controller(json: serde_json::Value) -> DataController {
        DataController::new(ObjectRef::from_json(json).unwrap(), &Historian::default())
    }

    #[test]
    fn set_many_is_one_step() {
        let data = controller(json!({"a": 1}));
        data.set_many([("a", 2), ("b", 3)]);
        assert_eq!(data.clone_data(), json!({"a": 2, "b": 3}));
        assert!(data.historian().undo());
        assert_eq!(data.clone_data(), json!({"a": 1}));
        assert!(!data.historian().undo());
    }

    #[test]
    fn clone_data_is_detached() {
        let data = controller(json!({"list": [1]}));
        let mut copy = data.clone_data();
        copy["list"] = json!([]);
        assert_eq!(data.clone_data(), json!({"list": [1]}));
    }

    #[test]
    fn raw_and_tracked_share_node() {
        let data = controller(json!({}));
        data.set("x", true);
        assert_eq!(data.raw().get("x"), Some(Value::from(true)));
        assert!(data.tracked().target().ptr_eq(data.raw()));
        assert!(data.delete("x"));
        assert!(!data.delete("x"));
    }
}
