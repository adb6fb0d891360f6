//! Edge function layer
//!
//! Holds the viewer-request URI rewrite, the JSON event model the edge
//! runtime speaks, and the function associations attached to static cache
//! behaviours.

pub mod event;
pub mod functions;
pub mod rewrite;

pub use event::{handle_event, handle_event_json, EdgeEvent, ViewerRequest};
pub use functions::{
    EdgeFunction, FunctionAssociations, FunctionEventType, ResponseHeaders, StaticSiteRewrite,
};
pub use rewrite::{rewrite_uri, strip_query, STATIC_ASSET_MARKERS};
