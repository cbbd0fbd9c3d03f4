#![forbid(unsafe_code)]

//! Media models referenced by blocks.

use pagecraft_history::{Historian, ObjectRef, ValueKind};
use pagecraft_model::{
    FieldSpec, Model, ModelCore, ModelError, ModelType, TypeInfo, construct, impl_model,
};

/// An image asset.
#[derive(Debug)]
pub struct Image {
    core: ModelCore,
}
impl_model!(Image, core);

impl ModelType for Image {
    const TYPE_INFO: &'static TypeInfo = &TypeInfo {
        tag: "media.image",
        lineage: &["media"],
        contract: &[FieldSpec::required("src", ValueKind::String)],
        construct: construct::<Image>,
    };

    fn from_node(node: ObjectRef, historian: &Historian) -> Result<Self, ModelError> {
        Ok(Self {
            core: ModelCore::new(Self::TYPE_INFO, node, historian)?,
        })
    }
}

impl Image {
    #[must_use]
    pub fn src(&self) -> String {
        self.get_prop("src")
            .and_then(|src| src.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    pub fn set_src(&self, src: impl Into<String>) {
        let src: String = src.into();
        self.data().set("src", src);
    }
}
