#![forbid(unsafe_code)]

//! Pagecraft Model
//!
//! Typed models over tracked data, and the relations that connect them.
//!
//! # Key Components
//!
//! - [`DataController`] - Owns a model's data node and its tracked view
//! - [`Model`] / [`ModelType`] / [`ModelCore`] - The model contract
//! - [`TypeInfo`] / [`TypeMap`] - Tag-based type registry with a process-wide default
//! - [`HasOne`] / [`HasMany`] / [`MorphOne`] / [`MorphMany`] - Relations
//! - [`relation_accessors!`] / [`impl_model!`] - Compile-time boilerplate
//!
//! # How it fits in the system
//! Models sit on top of `pagecraft-history`: every model in a document
//! shares one [`Historian`](pagecraft_history::Historian), and relations
//! build children on that same historian, so one undo call reverts an edit
//! made anywhere in the tree. `pagecraft-blocks` defines the concrete page
//! builder types.

pub mod contract;
pub mod data_controller;
pub mod error;
pub mod model;
pub mod registry;
pub mod relation;

pub use contract::{FieldSpec, validate_contract};
pub use data_controller::DataController;
pub use error::ModelError;
pub use model::{
    Model, ModelCore, ModelRc, ModelType, TYPE_KEY, construct, downcast_model, make_model,
};
pub use registry::{
    Constructor, TypeConstraint, TypeInfo, TypeMap, default_types, resolve_type,
    set_default_type_map,
};
pub use relation::{
    ChildResolver, Fixed, HasMany, HasOne, ListRelation, Morph, MorphMany, MorphOne, Relation,
    RelationOptions, SingleRelation,
};
