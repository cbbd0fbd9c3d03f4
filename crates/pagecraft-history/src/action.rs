#![forbid(unsafe_code)]

//! Recorded, reversible mutations.
//!
//! Every [`Action`] carries the node it touched plus enough before/after
//! state to replay itself in either direction. Replay writes straight into
//! the nodes, bypassing the tracked wrappers, so undo/redo never records.
//!
//! # Invariants
//!
//! - `apply()` followed by `revert()` restores prior state exactly
//! - `revert()` followed by `apply()` restores the applied state exactly
//! - `Create` is only emitted for an absent key, `Delete` only for a present
//!   one, so key sets round-trip through undo
//! - A `Transaction` reverts its children in reverse order

use std::fmt;

use crate::value::{ArrayRef, ObjectRef, Value};

/// Location written by a [`Action::Set`].
#[derive(Clone)]
pub enum Slot {
    /// Existing property of an object node.
    Property { object: ObjectRef, prop: String },
    /// Existing element of an array node.
    Element { array: ArrayRef, index: usize },
}

impl Slot {
    fn write(&self, value: &Value) {
        match self {
            Self::Property { object, prop } => {
                object.insert(prop.clone(), value.clone());
            }
            Self::Element { array, index } => {
                array.replace(*index, value.clone());
            }
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property { object, prop } => write!(f, "#{:x}.{prop}", object.id()),
            Self::Element { array, index } => write!(f, "#{:x}[{index}]", array.id()),
        }
    }
}

/// One recorded mutation.
#[derive(Clone)]
pub enum Action {
    /// Overwrite of a slot that already existed.
    Set {
        slot: Slot,
        old_value: Value,
        new_value: Value,
    },
    /// A property that did not exist before the write.
    Create {
        object: ObjectRef,
        prop: String,
        new_value: Value,
    },
    /// Removal of an existing property.
    Delete {
        object: ObjectRef,
        prop: String,
        old_value: Value,
    },
    /// Any array shape change: at `index`, `deleted` was replaced by `items`.
    Splice {
        array: ArrayRef,
        index: usize,
        deleted: Vec<Value>,
        items: Vec<Value>,
    },
    /// Ordered group committed and replayed as one step.
    Transaction { stack: Vec<Action> },
}

impl Action {
    /// Replay the forward effect.
    pub fn apply(&self) {
        match self {
            Self::Set {
                slot, new_value, ..
            } => slot.write(new_value),
            Self::Create {
                object,
                prop,
                new_value,
            } => {
                object.insert(prop.clone(), new_value.clone());
            }
            Self::Delete { object, prop, .. } => {
                object.remove(prop);
            }
            Self::Splice {
                array,
                index,
                deleted,
                items,
            } => {
                array.splice(*index, deleted.len(), items.clone());
            }
            Self::Transaction { stack } => {
                for action in stack {
                    action.apply();
                }
            }
        }
    }

    /// Replay the inverse effect.
    pub fn revert(&self) {
        match self {
            Self::Set {
                slot, old_value, ..
            } => slot.write(old_value),
            Self::Create { object, prop, .. } => {
                object.remove(prop);
            }
            Self::Delete {
                object,
                prop,
                old_value,
            } => {
                object.insert(prop.clone(), old_value.clone());
            }
            Self::Splice {
                array,
                index,
                deleted,
                items,
            } => {
                array.splice(*index, items.len(), deleted.clone());
            }
            Self::Transaction { stack } => {
                for action in stack.iter().rev() {
                    action.revert();
                }
            }
        }
    }

    /// Short label for logs and history UIs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
            Self::Splice { .. } => "splice",
            Self::Transaction { .. } => "transaction",
        }
    }

    /// Number of primitive (non-transaction) actions contained.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Transaction { stack } => stack.iter().map(Action::leaf_count).sum(),
            _ => 1,
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set {
                slot,
                old_value,
                new_value,
            } => f
                .debug_struct("Set")
                .field("slot", slot)
                .field("old_value", old_value)
                .field("new_value", new_value)
                .finish(),
            Self::Create {
                object,
                prop,
                new_value,
            } => f
                .debug_struct("Create")
                .field("object", &format_args!("#{:x}", object.id()))
                .field("prop", prop)
                .field("new_value", new_value)
                .finish(),
            Self::Delete {
                object,
                prop,
                old_value,
            } => f
                .debug_struct("Delete")
                .field("object", &format_args!("#{:x}", object.id()))
                .field("prop", prop)
                .field("old_value", old_value)
                .finish(),
            Self::Splice {
                array,
                index,
                deleted,
                items,
            } => f
                .debug_struct("Splice")
                .field("array", &format_args!("#{:x}", array.id()))
                .field("index", index)
                .field("deleted", deleted)
                .field("items", items)
                .finish(),
            Self::Transaction { stack } => {
                f.debug_struct("Transaction").field("stack", stack).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(json: serde_json::Value) -> ObjectRef {
        ObjectRef::from_json(json).unwrap()
    }

    #[test]
    fn create_revert_removes_key() {
        let o = obj(json!({"a": 1}));
        let action = Action::Create {
            object: o.clone(),
            prop: "b".into(),
            new_value: Value::from(2),
        };
        action.apply();
        assert_eq!(o.to_json(), json!({"a": 1, "b": 2}));
        action.revert();
        assert!(!o.contains_key("b"));
    }

    #[test]
    fn delete_round_trip() {
        let o = obj(json!({"a": 1}));
        let action = Action::Delete {
            object: o.clone(),
            prop: "a".into(),
            old_value: Value::from(1),
        };
        action.apply();
        assert!(o.is_empty());
        action.revert();
        assert_eq!(o.to_json(), json!({"a": 1}));
    }

    #[test]
    fn splice_round_trip() {
        let array = ArrayRef::from_vec(vec![Value::from(1), Value::from(2), Value::from(3)]);
        let action = Action::Splice {
            array: array.clone(),
            index: 1,
            deleted: vec![Value::from(2)],
            items: vec![Value::from(7), Value::from(8)],
        };
        action.apply();
        assert_eq!(array.to_json(), json!([1, 7, 8, 3]));
        action.revert();
        assert_eq!(array.to_json(), json!([1, 2, 3]));
    }

    #[test]
    fn transaction_reverts_in_reverse_order() {
        // Insert an element, then mutate it: only reverse-order undo round-trips.
        let array = ArrayRef::new();
        let action = Action::Transaction {
            stack: vec![
                Action::Splice {
                    array: array.clone(),
                    index: 0,
                    deleted: vec![],
                    items: vec![Value::from(1)],
                },
                Action::Set {
                    slot: Slot::Element {
                        array: array.clone(),
                        index: 0,
                    },
                    old_value: Value::from(1),
                    new_value: Value::from(5),
                },
            ],
        };
        action.apply();
        assert_eq!(array.to_json(), json!([5]));
        action.revert();
        assert!(array.is_empty());
        assert_eq!(action.leaf_count(), 2);
    }

    #[test]
    fn element_set_out_of_range_is_ignored() {
        let array = ArrayRef::new();
        let action = Action::Set {
            slot: Slot::Element {
                array: array.clone(),
                index: 3,
            },
            old_value: Value::Null,
            new_value: Value::from(1),
        };
        action.apply();
        assert!(array.is_empty());
    }
}
