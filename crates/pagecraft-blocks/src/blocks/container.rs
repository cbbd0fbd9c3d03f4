#![forbid(unsafe_code)]

use pagecraft_history::{Historian, ObjectRef};
use pagecraft_model::{
    ModelError, ModelRc, ModelType, Morph, MorphMany, RelationOptions, TypeConstraint, TypeInfo,
    construct, impl_model, relation_accessors,
};

use super::{BLOCK_LIST_TAG, BLOCK_TAG};
use crate::block::{Block, BlockCapabilities, BlockCore, CLASS_FIELD, OPTIONS_FIELD};

/// An ordered list of blocks of any type.
#[derive(Debug)]
pub struct ContainerBlock {
    block: BlockCore,
    children: MorphMany,
}
impl_model!(ContainerBlock, block.model);

impl ModelType for ContainerBlock {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "container",
        lineage: &[BLOCK_LIST_TAG, BLOCK_TAG],
        contract: &[OPTIONS_FIELD, CLASS_FIELD],
        construct: construct::<ContainerBlock>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        let block = BlockCore::new(
            Self::TYPE_INFO,
            node,
            historian,
            serde_json::Value::Null,
            BlockCapabilities::list(),
        )?;
        let children = MorphMany::morph_many(
            block.model.data(),
            RelationOptions::new("children"),
            Morph::new(TypeConstraint::Tag(BLOCK_TAG)),
        )?;
        Ok(Self { block, children })
    }
}

impl Block for ContainerBlock {
    fn block(&self) -> &BlockCore {
        &self.block
    }
}

relation_accessors! {
    ContainerBlock {
        children: children / set_children -> Vec<ModelRc>,
    }
}

impl ContainerBlock {
    /// The relation itself, for membership edits.
    #[must_use]
    pub fn children_relation(&self) -> &MorphMany {
        &self.children
    }
}
