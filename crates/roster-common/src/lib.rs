//! Roster Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging setup, and error handling for the Roster workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`RosterError`] and the [`Result`] alias used by setup code
//! - **Logging**: `tracing` subscriber configuration shared by every binary
//! - **Types**: [`Locator`], the identity of one CSV data source
//!
//! # Example
//!
//! ```no_run
//! use roster_common::{Locator, Result};
//!
//! fn remote() -> Result<Locator> {
//!     Locator::parse("http://example.com/users.csv")
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, RosterError};
pub use types::Locator;
