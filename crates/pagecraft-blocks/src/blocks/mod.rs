#![forbid(unsafe_code)]

//! Concrete block types.
//!
//! | type          | tag         | relations                          |
//! |---------------|-------------|------------------------------------|
//! | [`Builder`]   | `builder`   | `container`: one [`ContainerBlock`] |
//! | [`ContainerBlock`] | `container` | `children`: any blocks       |
//! | [`RowBlock`]  | `row`       | `columns`: [`ColumnBlock`]s        |
//! | [`ColumnBlock`] | `column`  | `child`: any one block             |
//! | [`ImageBlock`] | `image`    | `image`: one [`Image`](crate::Image) |
//! | [`TextBlock`] | `text`      |                                    |
//! | [`SpacerBlock`] | `spacer`  |                                    |
//! | [`HtmlBlock`] | `html`      |                                    |

mod builder;
mod column;
mod container;
mod html;
mod image;
mod row;
mod spacer;
mod text;

pub use builder::Builder;
pub use column::ColumnBlock;
pub use container::ContainerBlock;
pub use html::HtmlBlock;
pub use image::ImageBlock;
pub use row::RowBlock;
pub use spacer::SpacerBlock;
pub use text::TextBlock;

/// Tag every block type carries in its lineage.
pub const BLOCK_TAG: &str = "block";

/// Tag of blocks that hold an ordered list of children.
pub const BLOCK_LIST_TAG: &str = "block-list";
