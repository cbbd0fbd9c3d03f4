#![forbid(unsafe_code)]

//! Registration of the built-in types with the process-wide type table.

use pagecraft_model::{Model, TypeMap, default_types, set_default_type_map};
use tracing::debug;

use crate::block::Block;
use crate::blocks::{
    Builder, ColumnBlock, ContainerBlock, HtmlBlock, ImageBlock, RowBlock, SpacerBlock, TextBlock,
};
use crate::media::Image;

/// Every built-in block and media type, keyed by tag.
#[must_use]
pub fn default_type_map() -> TypeMap {
    TypeMap::new()
        .with::<Builder>()
        .with::<ContainerBlock>()
        .with::<RowBlock>()
        .with::<ColumnBlock>()
        .with::<ImageBlock>()
        .with::<TextBlock>()
        .with::<SpacerBlock>()
        .with::<HtmlBlock>()
        .with::<Image>()
}

/// Add the built-in types to the process-wide table, keeping any other
/// registrations. Calling it again is harmless.
pub fn register_default_types() {
    let mut types = TypeMap::clone(&default_types());
    types.extend(&default_type_map());
    debug!(target: "pagecraft.model", types = types.len(), "registered built-in block types");
    set_default_type_map(types);
}

/// View a type-erased model as a block, if it is one of the built-in block
/// types.
#[must_use]
pub fn as_block(model: &dyn Model) -> Option<&dyn Block> {
    macro_rules! try_block {
        ($($ty:ty),+ $(,)?) => {
            $(
                if let Some(block) = model.downcast_ref::<$ty>() {
                    return Some(block as &dyn Block);
                }
            )+
        };
    }
    try_block!(
        Builder,
        ContainerBlock,
        RowBlock,
        ColumnBlock,
        ImageBlock,
        TextBlock,
        SpacerBlock,
        HtmlBlock,
    );
    None
}
