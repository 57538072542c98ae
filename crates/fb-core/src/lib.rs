//! flatboard/crates/fb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Flatboard.

pub mod error;
pub mod lease;
pub mod models;
pub mod service;
pub mod submission;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use lease::*;
pub use models::*;
pub use service::ForumService;
pub use submission::*;
pub use traits::*;
