//! Domain types and DTOs
//!
//! These types define the data structures for Godown entities: auth users,
//! customer and agent profiles, warehouse listings and their media.

#![allow(dead_code)]

pub mod agents;
pub mod customers;
pub mod search;
pub mod users;
pub mod warehouses;

// Re-export commonly used types
pub use agents::*;
pub use customers::*;
pub use users::*;
pub use warehouses::*;

// Search types are accessed via crate::domain::search:: to avoid namespace pollution
