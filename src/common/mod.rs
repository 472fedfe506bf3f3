//! Shared error handling utilities

pub mod error;
pub mod result;

pub use error::MultiRepoError;
pub use result::MultiRepoResult;
