//! Mock collaborators and fixtures for exercising the shared chatgate
//! pipeline without a live platform connection.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
