#![forbid(unsafe_code)]

//! Pagecraft Blocks
//!
//! The page builder's concrete models: a [`Builder`] root, layout blocks
//! ([`ContainerBlock`], [`RowBlock`], [`ColumnBlock`]), content blocks
//! ([`TextBlock`], [`ImageBlock`], [`HtmlBlock`], [`SpacerBlock`]) and the
//! [`Image`] media model.
//!
//! Polymorphic relations (a container's children, a column's child)
//! resolve their members through the process-wide type table, so call
//! [`register_default_types`] once at startup before loading a page.
//!
//! # Example
//!
//! ```
//! use pagecraft_blocks::{Builder, TextBlock, register_default_types};
//! use pagecraft_model::{Model, downcast_model};
//! use serde_json::json;
//!
//! register_default_types();
//! let page = Builder::from_json(json!({
//!     "container": {"children": [{"_type": "text", "text": "Hello"}]}
//! }))
//! .unwrap();
//!
//! let container = page.container().unwrap().unwrap();
//! let first = container.children().unwrap().remove(0);
//! let text = downcast_model::<TextBlock>(first.clone()).unwrap();
//! assert_eq!(text.text(), "Hello");
//!
//! assert!(container.children_relation().remove(&*first));
//! assert!(page.historian().undo());
//! assert_eq!(container.children().unwrap().len(), 1);
//! ```

pub mod block;
pub mod blocks;
pub mod media;
pub mod registry;

pub use block::{Block, BlockCapabilities, BlockCore, CLASS_KEY, OPTIONS_KEY, make_block};
pub use blocks::{
    BLOCK_LIST_TAG, BLOCK_TAG, Builder, ColumnBlock, ContainerBlock, HtmlBlock, ImageBlock,
    RowBlock, SpacerBlock, TextBlock,
};
pub use media::Image;
pub use registry::{as_block, default_type_map, register_default_types};
