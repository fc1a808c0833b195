//! Client for the model reference REST service.
//!
//! Listing and audit endpoints are public; create, update and delete require
//! an API key sent in the `apikey` header.

pub mod api;
pub mod client;
pub mod error;
pub mod query;

pub use api::ReferenceApi;
pub use client::{API_KEY_HEADER, ReferenceClient, ReferenceClientBuilder};
pub use error::ClientError;
pub use query::AuditQuery;
