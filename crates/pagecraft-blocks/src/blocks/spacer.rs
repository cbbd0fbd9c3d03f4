#![forbid(unsafe_code)]

use pagecraft_history::{Historian, ObjectRef};
use pagecraft_model::{ModelError, ModelType, TypeInfo, construct, impl_model};

use super::BLOCK_TAG;
use crate::block::{Block, BlockCapabilities, BlockCore, CLASS_FIELD, OPTIONS_FIELD};

/// Vertical whitespace.
#[derive(Debug)]
pub struct SpacerBlock {
    block: BlockCore,
}
impl_model!(SpacerBlock, block.model);

impl ModelType for SpacerBlock {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "spacer",
        lineage: &[BLOCK_TAG],
        contract: &[OPTIONS_FIELD, CLASS_FIELD],
        construct: construct::<SpacerBlock>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        Ok(Self {
            block: BlockCore::new(
                Self::TYPE_INFO,
                node,
                historian,
                serde_json::json!({"size": ""}),
                BlockCapabilities::default(),
            )?,
        })
    }
}

impl Block for SpacerBlock {
    fn block(&self) -> &BlockCore {
        &self.block
    }
}
