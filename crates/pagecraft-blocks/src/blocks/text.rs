#![forbid(unsafe_code)]

use pagecraft_history::{Historian, ObjectRef, ValueKind};
use pagecraft_model::{FieldSpec, Model, ModelError, ModelType, TypeInfo, construct, impl_model};

use super::BLOCK_TAG;
use crate::block::{Block, BlockCapabilities, BlockCore, CLASS_FIELD, OPTIONS_FIELD};

/// A run of text. The `tag` option names the element it renders as.
#[derive(Debug)]
pub struct TextBlock {
    block: BlockCore,
}
impl_model!(TextBlock, block.model);

impl ModelType for TextBlock {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "text",
        lineage: &[BLOCK_TAG],
        contract: &[OPTIONS_FIELD, CLASS_FIELD, FieldSpec::required("text", ValueKind::String)],
        construct: construct::<TextBlock>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        Ok(Self {
            block: BlockCore::new(
                Self::TYPE_INFO,
                node,
                historian,
                serde_json::Value::Null,
                BlockCapabilities::default(),
            )?,
        })
    }
}

impl Block for TextBlock {
    fn block(&self) -> &BlockCore {
        &self.block
    }
}

impl TextBlock {
    #[must_use]
    pub fn text(&self) -> String {
        self.get_prop("text")
            .and_then(|text| text.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let text: String = text.into();
        self.data().set("text", text);
    }

    /// Element name from the `tag` option.
    #[must_use]
    pub fn tag(&self) -> Option<String> {
        self.option("tag")?.as_str().map(str::to_owned)
    }
}
