#![forbid(unsafe_code)]

use pagecraft_history::{Historian, ObjectRef};
use pagecraft_model::{
    ModelError, ModelRc, ModelType, Morph, MorphOne, RelationOptions, TypeConstraint, TypeInfo,
    construct, impl_model, relation_accessors,
};

use super::BLOCK_TAG;
use crate::block::{Block, BlockCapabilities, BlockCore, CLASS_FIELD, OPTIONS_FIELD};

/// One cell of a [`RowBlock`](super::RowBlock), holding at most one block.
#[derive(Debug)]
pub struct ColumnBlock {
    block: BlockCore,
    child: MorphOne,
}
impl_model!(ColumnBlock, block.model);

impl ModelType for ColumnBlock {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "column",
        lineage: &[BLOCK_TAG],
        contract: &[OPTIONS_FIELD, CLASS_FIELD],
        construct: construct::<ColumnBlock>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        let block = BlockCore::new(
            Self::TYPE_INFO,
            node,
            historian,
            serde_json::Value::Null,
            BlockCapabilities::slot(),
        )?;
        let child = MorphOne::morph_one(
            block.model.data(),
            RelationOptions::new("child"),
            Morph::new(TypeConstraint::Tag(BLOCK_TAG)),
        )?;
        Ok(Self { block, child })
    }
}

impl Block for ColumnBlock {
    fn block(&self) -> &BlockCore {
        &self.block
    }
}

relation_accessors! {
    ColumnBlock {
        child: child / set_child -> Option<ModelRc>,
    }
}

impl ColumnBlock {
    #[must_use]
    pub fn child_relation(&self) -> &MorphOne {
        &self.child
    }
}
