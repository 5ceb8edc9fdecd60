pub mod client;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod sign;
pub mod types;

pub use client::{SklandApi, SklandClient};
pub use error::{CheckInError, SklandError};
pub use types::{AttendanceResponse, BindingGroup, Character, Session};
