//! Service layer providing the account workflows on top of models.
//! - Separates business logic from data access.
//! - Reuses entity definitions in the `models` crate.
//! - Provides field-keyed error payloads for the HTTP layer.

pub mod account;
#[cfg(test)]
pub mod test_support;
