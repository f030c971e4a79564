//! MomBot: a Mom Test customer-interview engine.

pub mod analysis;
pub mod config;
pub mod error;
pub mod interview;
pub mod llm;
