//! State management for requirement items.
//!
//! This module provides the pure transition functions that implement the
//! requirement state machine. All persistence goes through the item store;
//! the functions here only operate on in-memory items.

pub mod item;

pub use item::{begin_stage, fail_stage, merge_artifacts, new_item, succeed_stage, TransitionError};
