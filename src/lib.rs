//! Authoring of structured AI directives.
//!
//! The core is [`domain`]: the directive lifecycle, the dense step sequence
//! and the workflow aggregate. Around it sit an event-sourced file store, an
//! application service, renderers, and the ambient configuration and logging
//! used by the `directives` binary.

pub mod authoring;
pub mod cli;
pub mod config;
pub mod domain;
pub mod event_store;
pub mod paths;
pub mod render;
pub mod structured_logger;
