#![forbid(unsafe_code)]

//! Session engine services: the controller that drives one study session
//! against the remote service, and the statistics aggregator that
//! guarantees a usable stats object once a session completes.

pub mod controller;
pub mod error;
pub mod stats;

pub use study_core::Clock;

pub use controller::{Phase, SessionController, StudyStep};
pub use error::SessionError;
