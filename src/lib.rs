//! Receiving-hospital assignment for clustered emergency incidents.
//!
//! The [`dispatch`] module holds the assignment engine. The remaining modules
//! load snapshots from CSV or JSON, print results, and serve them over HTTP.

pub mod config;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod parser;
pub mod report;
pub mod web;

pub use dispatch::{assign, occupancy, run_assignment};
pub use error::DispatchError;
