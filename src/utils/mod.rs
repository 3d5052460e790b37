//! Generic utility primitives with zero domain knowledge.
//!
//! - `artifact` - Artifact path resolution (literal and glob)
//! - `command` - Command execution with error handling

pub mod artifact;
pub mod command;
