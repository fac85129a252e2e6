//! Test helper modules for integration tests

#![allow(dead_code)]

pub mod fake_services;
pub mod flaky_store;
pub mod replacement;
pub mod test_archive;

pub use fake_services::*;
pub use flaky_store::*;
pub use replacement::*;
pub use test_archive::*;
