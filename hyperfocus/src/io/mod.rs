//! I/O collaborators: configuration, prompt rendering, generation backends and memory.

pub mod config;
pub mod generator;
pub mod memory;
pub mod mistral;
pub mod prompt;
