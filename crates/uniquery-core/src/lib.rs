//! uniquery-core: Question extraction, assessment sessions and the generation seam.
//!
//! This crate turns free-form model output into validated [`model::Question`]
//! records, drives the quiz lifecycle on top of them, and defines the trait
//! through which text-generation backends are consumed.

pub mod chat;
pub mod error;
pub mod extract;
pub mod model;
pub mod prompts;
pub mod review;
pub mod session;
pub mod time;
pub mod traits;
