//! Deterministic, pure logic shared by the hyperfocus services.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod contract;
pub mod routing;
pub mod session;
pub mod types;
