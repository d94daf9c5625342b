#![forbid(unsafe_code)]

//! Strict internal model for the study session engine.
//!
//! The remote service speaks a loosely-versioned JSON dialect; this crate is
//! the stable shape everything else works against. Decoding into these types
//! lives in the `remote` crate.

pub mod model;
pub mod time;

pub use time::Clock;
