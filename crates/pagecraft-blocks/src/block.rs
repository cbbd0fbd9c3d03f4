#![forbid(unsafe_code)]

//! The block base: options, capabilities, and the [`Block`] trait.

use pagecraft_history::{Historian, Map, ObjectRef, Value, ValueKind};
use pagecraft_model::{FieldSpec, Model, ModelCore, ModelError, ModelType, TypeInfo, make_model};

/// Property holding a block's options object.
pub const OPTIONS_KEY: &str = "options";

/// Property holding a block's CSS class list.
pub const CLASS_KEY: &str = "class";

/// Contract fields shared by every block. Block types list these first.
pub const OPTIONS_FIELD: FieldSpec = FieldSpec::optional(OPTIONS_KEY, ValueKind::Object);
pub const CLASS_FIELD: FieldSpec = FieldSpec::optional(CLASS_KEY, ValueKind::Array);

/// What the editor may do with a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCapabilities {
    pub have_children: bool,
    pub sort_children: bool,
    pub movable: bool,
    pub editable: bool,
}

impl Default for BlockCapabilities {
    fn default() -> Self {
        Self {
            have_children: false,
            sort_children: false,
            movable: true,
            editable: true,
        }
    }
}

impl BlockCapabilities {
    /// Capabilities of a block that holds a sortable list of children.
    #[must_use]
    pub const fn list() -> Self {
        Self {
            have_children: true,
            sort_children: true,
            movable: true,
            editable: true,
        }
    }

    /// Capabilities of a block that holds a single child slot.
    #[must_use]
    pub const fn slot() -> Self {
        Self {
            have_children: true,
            sort_children: false,
            movable: true,
            editable: true,
        }
    }
}

/// Model state plus block behavior. Concrete blocks embed one and point
/// [`impl_model!`](pagecraft_model::impl_model) at its `model` field.
#[derive(Debug, Clone)]
pub struct BlockCore {
    pub model: ModelCore,
    capabilities: BlockCapabilities,
}

impl BlockCore {
    /// Build the model, then merge `defaults` under any options already in
    /// the data. The merge is written off the record.
    pub fn new(
        info: &'static TypeInfo,
        node: ObjectRef,
        historian: &Historian,
        defaults: serde_json::Value,
        capabilities: BlockCapabilities,
    ) -> Result<Self, ModelError> {
        let model = ModelCore::new(info, node, historian)?;
        let core = Self { model, capabilities };
        if let serde_json::Value::Object(defaults) = defaults {
            historian.off_the_record(|| core.merge_defaults(defaults));
        } else if core.options().is_none() {
            historian.off_the_record(|| core.model.data().set(OPTIONS_KEY, Value::object()));
        }
        Ok(core)
    }

    fn merge_defaults(&self, defaults: serde_json::Map<String, serde_json::Value>) {
        let data = self.model.data();
        match data.tracked().object(OPTIONS_KEY) {
            Some(options) => {
                for (name, value) in defaults {
                    if !options.contains_key(&name) {
                        options.set(name, value);
                    }
                }
            }
            None => data.set(OPTIONS_KEY, serde_json::Value::Object(defaults)),
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> BlockCapabilities {
        self.capabilities
    }

    /// The live options node.
    #[must_use]
    pub fn options(&self) -> Option<ObjectRef> {
        self.model.data().get(OPTIONS_KEY)?.as_object().cloned()
    }

    #[must_use]
    pub fn option(&self, name: &str) -> Option<Value> {
        self.options()?.get(name)
    }

    pub fn set_option(&self, name: impl Into<String>, value: impl Into<Value>) {
        let data = self.model.data();
        match data.tracked().object(OPTIONS_KEY) {
            Some(options) => options.set(name, value),
            None => {
                let options = Map::from([(name.into(), value.into())]);
                data.set(OPTIONS_KEY, ObjectRef::from_map(options));
            }
        }
    }

    /// Write several options as one undo step.
    pub fn set_many_options(&self, options: serde_json::Map<String, serde_json::Value>) {
        if options.is_empty() {
            return;
        }
        self.model.data().historian().batch(|| {
            for (name, value) in options {
                self.set_option(name, value);
            }
        });
    }

    /// CSS classes, in order.
    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        match self.model.data().get(CLASS_KEY) {
            Some(Value::Array(classes)) => classes
                .to_vec()
                .iter()
                .filter_map(|class| class.as_str().map(str::to_owned))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Behavior shared by every block type.
pub trait Block: Model {
    fn block(&self) -> &BlockCore;

    fn capabilities(&self) -> BlockCapabilities {
        self.block().capabilities()
    }

    fn options(&self) -> Option<ObjectRef> {
        self.block().options()
    }

    fn option(&self, name: &str) -> Option<Value> {
        self.block().option(name)
    }

    fn set_option(&self, name: &str, value: Value) {
        self.block().set_option(name, value);
    }

    fn set_many_options(&self, options: serde_json::Map<String, serde_json::Value>) {
        self.block().set_many_options(options);
    }

    /// Build a block that records into this block's history.
    fn make_block<M: ModelType + Block>(
        &self,
        data: serde_json::Value,
        options: serde_json::Map<String, serde_json::Value>,
    ) -> Result<M, ModelError>
    where
        Self: Sized,
    {
        make_block(self.historian(), data, options)
    }
}

/// Build `M` from `data` and apply `options` on top of its defaults.
///
/// Construction and the initial options are not undoable steps; the block
/// starts life as it is handed back.
pub fn make_block<M: ModelType + Block>(
    historian: &Historian,
    data: serde_json::Value,
    options: serde_json::Map<String, serde_json::Value>,
) -> Result<M, ModelError> {
    let block = make_model::<M>(data, historian)?;
    historian.off_the_record(|| block.set_many_options(options));
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::SpacerBlock;
    use serde_json::json;

    #[test]
    fn default_capabilities() {
        let caps = BlockCapabilities::default();
        assert!(!caps.have_children);
        assert!(caps.movable && caps.editable);
        assert!(BlockCapabilities::list().sort_children);
        assert!(!BlockCapabilities::slot().sort_children);
    }

    #[test]
    fn set_option_recreates_missing_options() {
        let historian = Historian::default();
        let spacer =
            make_model::<SpacerBlock>(json!({"class": ["wide", "muted"]}), &historian).unwrap();
        assert_eq!(spacer.block().classes(), ["wide", "muted"]);

        assert!(spacer.data().delete(OPTIONS_KEY));
        spacer.set_option("size", "lg".into());
        assert_eq!(spacer.option("size"), Some(Value::from("lg")));

        assert!(historian.undo());
        assert!(spacer.options().is_none());
        assert!(historian.undo());
        assert_eq!(spacer.option("size"), Some(Value::from("")));
    }

    #[test]
    fn empty_option_batch_records_nothing() {
        let historian = Historian::default();
        let spacer = make_model::<SpacerBlock>(json!({}), &historian).unwrap();
        spacer.set_many_options(serde_json::Map::new());
        assert!(!historian.can_undo());
    }
}
