#![forbid(unsafe_code)]

//! Remote protocol client for the study service.
//!
//! Three layers: [`decode`] normalizes the service's loosely-versioned JSON
//! into the strict `study-core` model, [`client`] issues the four session
//! operations with the two-attempt reauthentication policy, and [`auth`]
//! is the seam to the external credential holder.

pub mod auth;
pub mod client;
pub mod decode;
pub mod error;
pub mod payload;

pub use auth::{CredentialProvider, SharedCredential};
pub use client::{HttpStudyApi, StudyApi};
pub use error::{ApiError, DecodeError};
pub use payload::{AnswerAck, AnswerCounts, NextCard, SessionOpened};
