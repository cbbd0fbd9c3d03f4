#![forbid(unsafe_code)]

use pagecraft_history::{Historian, ObjectRef, ValueKind};
use pagecraft_model::{FieldSpec, Model, ModelError, ModelType, TypeInfo, construct, impl_model};

use super::BLOCK_TAG;
use crate::block::{Block, BlockCapabilities, BlockCore, CLASS_FIELD, OPTIONS_FIELD};

/// Raw markup, passed through untouched.
#[derive(Debug)]
pub struct HtmlBlock {
    block: BlockCore,
}
impl_model!(HtmlBlock, block.model);

impl ModelType for HtmlBlock {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "html",
        lineage: &[BLOCK_TAG],
        contract: &[OPTIONS_FIELD, CLASS_FIELD, FieldSpec::required("html", ValueKind::String)],
        construct: construct::<HtmlBlock>,
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

impl Block for HtmlBlock {
    fn block(&self) -> &BlockCore {
        &self.block
    }
}

impl HtmlBlock {
    #[must_use]
    pub fn html(&self) -> String {
        self.get_prop("html")
            .and_then(|html| html.as_str().map(str::to_owned))
            .unwrap_or_default()
    }
}
