//! Request handler module
//!
//! Behaviour selection and the two origins behind the edge: static objects
//! and the API server.

pub mod proxy;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
