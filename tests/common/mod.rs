//! Common test utilities and helpers
//!
//! Shared by the integration tests: a fake version-control backend and
//! workspace builders.

#![allow(dead_code)]

pub mod mock_services;
pub mod test_helpers;
