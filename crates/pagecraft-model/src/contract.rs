#![forbid(unsafe_code)]

//! Declared data shapes checked when a model is built.

use pagecraft_history::{ObjectRef, Value, ValueKind};

use crate::error::ModelError;

/// One field of a model's data contract.
///
/// Optional fields may be absent or `null`; required fields must be present
/// with the declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: ValueKind,
    pub optional: bool,
}

impl FieldSpec {
    #[must_use]
    pub const fn required(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            optional: false,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            optional: true,
        }
    }

    fn check(&self, tag: &'static str, node: &ObjectRef) -> Result<(), ModelError> {
        match node.get(self.name) {
            None | Some(Value::Null) if self.optional => Ok(()),
            None => Err(ModelError::MissingField {
                tag,
                prop: self.name.to_owned(),
            }),
            Some(value) if value.kind() == self.kind => Ok(()),
            Some(value) => Err(ModelError::invalid(self.name, self.kind.to_string(), value.kind())),
        }
    }
}

/// Check every field of `contract` against `node`, stopping at the first
/// violation.
pub fn validate_contract(
    tag: &'static str,
    contract: &[FieldSpec],
    node: &ObjectRef,
) -> Result<(), ModelError> {
    contract.iter().try_for_each(|field| field.check(tag, node))
}
