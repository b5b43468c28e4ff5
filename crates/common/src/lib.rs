//! Small pieces shared by the server crate and the binary: the health
//! payload and tracing setup.

pub mod types;
pub mod utils;
