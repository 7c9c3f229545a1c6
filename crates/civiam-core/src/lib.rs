//! CIVIAM Core — domain models, repository traits, and shared error
//! types for the municipal permission platform.
//!
//! This crate has no I/O of its own. Storage backends implement the
//! traits in [`repository`]; the decision procedure lives in
//! `civiam-authz`.

pub mod catalog;
pub mod error;
pub mod models;
pub mod repository;

pub use error::{CiviamError, CiviamResult};
