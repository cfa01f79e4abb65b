//! Domain logic shared by every RivalWatch analysis crate.
//!
//! Nothing in here performs I/O: prompt construction, response parsing,
//! settings validation and recovery-target parsing are pure functions so
//! the store, provider and HTTP layers can be tested against them directly.

pub mod analysis;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod recovery;
pub mod settings;
pub mod types;
