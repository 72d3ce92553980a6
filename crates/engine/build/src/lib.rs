//! Build-command model and batching for Stratavox.
//!
//! This crate provides:
//! - Validated block identifiers
//! - A closed command enum rendered to the target world's command grammar
//! - Ordered command scripts with per-command criticality
//! - The batcher that folds voxel sets into minimal command scripts

pub mod batch;
pub mod block;
pub mod command;

pub use batch::{BatchOptions, CommandBatcher, Placement};
pub use block::{BlockType, InvalidBlockType};
pub use command::{BuildCommand, CommandScript, ScriptCommand};
