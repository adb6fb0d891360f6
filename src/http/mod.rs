//! HTTP protocol layer module
//!
//! Response builders, cache validation and content types shared by the
//! static and API origin handlers.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cache::CachePolicy;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_502_response, build_options_response, build_preflight_response,
};
