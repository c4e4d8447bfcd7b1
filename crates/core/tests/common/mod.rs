//! Common test utilities shared by the integration suites.
//!
//! This module provides:
//! - Test fixtures (statuses, messages, real-time frames)
//! - In-memory fakes of the REST clients
//! - Event and state helpers

pub mod assertions;
pub mod fakes;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fakes::*;
#[allow(unused_imports)]
pub use fixtures::*;
