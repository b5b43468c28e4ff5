//! Account module: three-layer architecture (domain, repository, service).
//!
//! Registration, profile updates, login and token authentication live here,
//! independent of the HTTP layer.

pub mod decode;
pub mod domain;
pub mod errors;
pub mod password;
pub mod repo;
pub mod repository;
pub mod service;
pub mod token;
pub mod validation;

pub use errors::AccountError;
pub use service::{AccountConfig, AccountService};
pub use validation::FieldErrors;
