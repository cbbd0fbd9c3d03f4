#![forbid(unsafe_code)]

//! Pagecraft History
//!
//! Transactional change tracking for the page-builder data graph.
//!
//! # Key Components
//!
//! - [`Value`] / [`ObjectRef`] / [`ArrayRef`] - Shared JSON-shaped nodes
//! - [`Action`] - A recorded, reversible mutation
//! - [`Almanac`] - Fixed-capacity log with an undo/redo pointer
//! - [`Historian`] - Records actions, groups them into transactions, replays them
//! - [`TrackedObject`] / [`TrackedArray`] - Mutation views that record every write
//! - [`HistoryConfig`] - Almanac size and epoch window
//!
//! # How it fits in the system
//! `pagecraft-model` wraps each model's data in a [`TrackedObject`] bound to
//! a shared [`Historian`]. Everything above it (relations, blocks) mutates
//! through those views, so a single undo reverts an edit no matter which
//! layer made it.
//!
//! # Quick Start
//!
//! ```
//! use pagecraft_history::{Historian, ObjectRef, TrackedObject};
//! use serde_json::json;
//!
//! let historian = Historian::default();
//! let node = ObjectRef::from_json(json!({"title": "Home"})).unwrap();
//! let doc = TrackedObject::new(&historian, node);
//!
//! historian.batch(|| {
//!     doc.set("title", "About");
//!     doc.set("draft", true);
//! });
//! assert!(historian.undo());
//! assert_eq!(doc.to_json(), json!({"title": "Home"}));
//! ```

pub mod action;
pub mod almanac;
pub mod config;
pub mod error;
pub mod historian;
pub mod proxy;
pub mod value;

pub use action::{Action, Slot};
pub use almanac::Almanac;
pub use config::HistoryConfig;
pub use error::{ConfigError, HistoryError, IntegrityError};
pub use historian::{Historian, RecordingMode};
pub use proxy::{Tracked, TrackedArray, TrackedObject, track};
pub use value::{ArrayRef, Map, ObjectRef, Value, ValueKind};
