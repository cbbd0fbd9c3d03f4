#![forbid(unsafe_code)]

use std::rc::Rc;

use pagecraft_history::{Historian, ObjectRef};
use pagecraft_model::{
    HasMany, ModelError, ModelType, RelationOptions, TypeInfo, construct, impl_model,
    relation_accessors,
};

use super::{BLOCK_TAG, ColumnBlock};
use crate::block::{Block, BlockCapabilities, BlockCore, CLASS_FIELD, OPTIONS_FIELD};

/// A horizontal run of columns.
#[derive(Debug)]
pub struct RowBlock {
    block: BlockCore,
    columns: HasMany<ColumnBlock>,
}
impl_model!(RowBlock, block.model);

impl ModelType for RowBlock {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "row",
        lineage: &[BLOCK_TAG],
        contract: &[OPTIONS_FIELD, CLASS_FIELD],
        construct: construct::<RowBlock>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        let block = BlockCore::new(
            Self::TYPE_INFO,
            node,
            historian,
            serde_json::Value::Null,
            BlockCapabilities::list(),
        )?;
        let columns = HasMany::has_many(block.model.data(), RelationOptions::new("columns"))?;
        Ok(Self { block, columns })
    }
}

impl Block for RowBlock {
    fn block(&self) -> &BlockCore {
        &self.block
    }
}

relation_accessors! {
    RowBlock {
        columns: columns / set_columns -> Vec<Rc<ColumnBlock>>,
    }
}

impl RowBlock {
    #[must_use]
    pub fn columns_relation(&self) -> &HasMany<ColumnBlock> {
        &self.columns
    }
}
