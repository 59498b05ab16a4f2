//! Shared data model for the assignment-efficiency client.
//!
//! Everything in this crate is plain data exchanged with the backend
//! plus the small amount of interpretation the client performs on it
//! (significance classification, import stage ordering). No I/O.

pub mod analysis;
pub mod assignee;
pub mod error;
pub mod import;
pub mod page;
pub mod significance;
pub mod system;
pub mod types;
