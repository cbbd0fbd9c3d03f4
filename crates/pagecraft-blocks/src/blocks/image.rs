#![forbid(unsafe_code)]

use std::rc::Rc;

use pagecraft_history::{Historian, ObjectRef, ValueKind};
use pagecraft_model::{
    FieldSpec, HasOne, Model, ModelError, ModelType, RelationOptions, TypeInfo, construct,
    impl_model, relation_accessors,
};
use serde_json::json;

use super::BLOCK_TAG;
use crate::block::{Block, BlockCapabilities, BlockCore, CLASS_FIELD, OPTIONS_FIELD};
use crate::media::Image;

/// A block showing one [`Image`]. Loads lazily unless told otherwise.
#[derive(Debug)]
pub struct ImageBlock {
    block: BlockCore,
    image: HasOne<Image>,
}
impl_model!(ImageBlock, block.model);

impl ModelType for ImageBlock {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "image",
        lineage: &[BLOCK_TAG],
        contract: &[
            OPTIONS_FIELD,
            CLASS_FIELD,
            FieldSpec::optional("alt", ValueKind::String),
        ],
        construct: construct::<ImageBlock>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        let block = BlockCore::new(
            Self::TYPE_INFO,
            node,
            historian,
            json!({"lazy": true}),
            BlockCapabilities::default(),
        )?;
        let image = HasOne::has_one(block.model.data(), RelationOptions::new("image"))?;
        Ok(Self { block, image })
    }
}

impl Block for ImageBlock {
    fn block(&self) -> &BlockCore {
        &self.block
    }
}

relation_accessors! {
    ImageBlock {
        image: image / set_image -> Option<Rc<Image>>,
    }
}

impl ImageBlock {
    #[must_use]
    pub fn image_relation(&self) -> &HasOne<Image> {
        &self.image
    }

    /// Source of the image, or empty when there is none.
    #[must_use]
    pub fn src(&self) -> String {
        self.image().ok().flatten().map(|image| image.src()).unwrap_or_default()
    }

    #[must_use]
    pub fn alt(&self) -> Option<String> {
        self.get_prop("alt")?.as_str().map(str::to_owned)
    }

    #[must_use]
    pub fn is_lazy(&self) -> bool {
        self.option("lazy").and_then(|lazy| lazy.as_bool()).unwrap_or(true)
    }
}
