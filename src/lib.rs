//! Daily Skland check-in for Arknights accounts.
//!
//! [`orchestrator::AttendanceOrchestrator`] runs one account: it establishes a
//! session, checks in every bound character concurrently with bounded
//! retries, and pushes the resulting report to every configured
//! [`notify::Channel`], whatever happened before.

pub mod attendance;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod skland;
pub mod ui;
