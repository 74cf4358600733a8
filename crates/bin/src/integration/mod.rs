//! Glue between the command line and the accrete libraries.
//!
//! Configuration loading, progress display and report rendering live here so
//! `main.rs` only wires arguments to analyses.

pub(crate) mod progress;
pub(crate) mod render;
pub(crate) mod settings;
