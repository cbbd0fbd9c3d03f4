#![forbid(unsafe_code)]

//! Pagecraft public facade crate.
//!
//! Re-exports the common types of the history, model and blocks crates and
//! offers a prelude plus [`open_page`] for the usual startup path.

use std::path::Path;

use thiserror::Error;

// --- History re-exports ----------------------------------------------------

pub use pagecraft_history::{
    Action, Almanac, ArrayRef, ConfigError, Historian, HistoryConfig, HistoryError, IntegrityError,
    ObjectRef, RecordingMode, Tracked, TrackedArray, TrackedObject, Value, ValueKind, track,
};

// --- Model re-exports ------------------------------------------------------

pub use pagecraft_model::{
    DataController, HasMany, HasOne, Model, ModelError, ModelRc, ModelType, Morph, MorphMany,
    MorphOne, Relation, RelationOptions, TypeConstraint, TypeInfo, TypeMap, downcast_model,
    make_model,
};

// --- Blocks re-exports -----------------------------------------------------

pub use pagecraft_blocks::{
    Block, BlockCapabilities, Builder, ColumnBlock, ContainerBlock, HtmlBlock, Image, ImageBlock,
    RowBlock, SpacerBlock, TextBlock, as_block, make_block, register_default_types,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for pagecraft callers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Standard result type for pagecraft APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Startup ---------------------------------------------------------------

/// Register the built-in types and load a page with its own history.
pub fn open_page(data: serde_json::Value, config: HistoryConfig) -> Result<Builder> {
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ConfigError::Invalid(problems).into());
    }
    register_default_types();
    Ok(make_model(data, &Historian::new(config))?)
}

/// [`open_page`] with the history settings read from a TOML file.
#[cfg(feature = "toml-config")]
pub fn open_page_with_config_file(
    data: serde_json::Value,
    config: impl AsRef<Path>,
) -> Result<Builder> {
    open_page(data, HistoryConfig::from_toml_file(config)?)
}

/// [`open_page`] with the history settings read from a JSON file.
pub fn open_page_with_json_config(
    data: serde_json::Value,
    config: impl AsRef<Path>,
) -> Result<Builder> {
    open_page(data, HistoryConfig::from_json_file(config)?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Block, Builder, ContainerBlock, Error, Historian, HistoryConfig, Model, ModelRc, Relation,
        Result, TextBlock, Value, open_page,
    };

    pub use crate::{blocks, history, model};
}

pub use pagecraft_blocks as blocks;
pub use pagecraft_history as history;
pub use pagecraft_model as model;
