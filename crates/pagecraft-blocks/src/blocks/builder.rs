#![forbid(unsafe_code)]

use std::rc::Rc;

use pagecraft_history::{Historian, ObjectRef};
use pagecraft_model::{
    HasOne, ModelError, ModelType, RelationOptions, TypeInfo, construct, impl_model, make_model,
    relation_accessors,
};
use serde_json::json;

use super::{BLOCK_TAG, ContainerBlock};
use crate::block::{Block, BlockCapabilities, BlockCore, CLASS_FIELD, OPTIONS_FIELD};

/// Root of a page: one top-level [`ContainerBlock`].
///
/// A builder made from `{}` gets an empty container, written off the
/// record.
#[derive(Debug)]
pub struct Builder {
    block: BlockCore,
    container: HasOne<ContainerBlock>,
}
impl_model!(Builder, block.model);

impl ModelType for Builder {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "builder",
        lineage: &[BLOCK_TAG],
        contract: &[OPTIONS_FIELD, CLASS_FIELD],
        construct: construct::<Builder>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        let block = BlockCore::new(
            Self::TYPE_INFO,
            node,
            historian,
            serde_json::Value::Null,
            BlockCapabilities {
                movable: false,
                ..BlockCapabilities::slot()
            },
        )?;
        let container = HasOne::has_one(
            block.model.data(),
            RelationOptions::new("container").default_data(|| json!({"children": []})),
        )?;
        Ok(Self { block, container })
    }
}

impl Block for Builder {
    fn block(&self) -> &BlockCore {
        &self.block
    }
}

relation_accessors! {
    Builder {
        container: container / set_container -> Option<Rc<ContainerBlock>>,
    }
}

impl Builder {
    /// A builder with its own history.
    pub fn from_json(data: serde_json::Value) -> Result<Self, ModelError> {
        make_model(data, &Historian::default())
    }

    #[must_use]
    pub fn container_relation(&self) -> &HasOne<ContainerBlock> {
        &self.container
    }
}
