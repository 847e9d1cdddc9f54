//! # Pathology Core
//!
//! Core business logic for the pathology API.
//!
//! This crate contains pure request handling:
//! - business rules over a submitted test result bundle ([`handle_request`])
//! - the boundary contract used by every adapter ([`BundleService`]): payload text in,
//!   status code + headers + body out
//!
//! **No transport concerns**: HTTP servers, Lambda-style invocation and process setup belong in
//! `api-rest` and the binaries.

pub mod constants;
pub mod error;
pub mod handler;
pub mod service;

pub use error::{BundleError, BundleResult};
pub use handler::handle_request;
pub use service::{ApiResponse, BundleService};
