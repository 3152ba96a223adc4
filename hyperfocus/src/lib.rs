//! Focus agents built on the Hyperfocus methodology.
//!
//! This crate wraps a language model in a few narrowly scoped responders (task
//! categorizer, energy advisor, coach, focus guardian), streams guardian
//! messages through timed focus sessions, and routes open questions to the
//! right team member. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (session clock, routing, response
//!   contracts). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting collaborators (configuration, prompt rendering,
//!   the Mistral backend, conversation memory). Isolated behind the
//!   [`io::generator::Generator`] trait to enable scripted tests.
//!
//! Orchestration modules ([`responders`], [`streamer`], [`team`]) combine the
//! two, and [`app::Hyperfocus`] assembles them once at startup.

pub mod app;
pub mod concepts;
pub mod core;
pub mod io;
pub mod logging;
pub mod responders;
pub mod streamer;
pub mod team;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use app::Hyperfocus;
