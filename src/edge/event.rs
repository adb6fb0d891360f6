//! Edge function event model
//!
//! The edge runtime hands each function a JSON event carrying the viewer
//! request. Only `uri` is interpreted here, every other field round-trips
//! untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::functions::{EdgeFunction, StaticSiteRewrite};
use crate::error::Result;

/// Viewer request as seen by an edge function
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ViewerRequest {
    /// Request URI, possibly with a query component
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uri: String,
    /// Method, headers, cookies and anything else the runtime sends
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ViewerRequest {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            other: Map::new(),
        }
    }
}

/// Viewer-request event
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeEvent {
    pub request: ViewerRequest,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Run the static-site rewrite over an event and return its request
pub fn handle_event(event: EdgeEvent) -> ViewerRequest {
    StaticSiteRewrite.on_viewer_request(event.request)
}

/// Text-level wrapper around [`handle_event`]
pub fn handle_event_json(input: &str) -> Result<String> {
    let event: EdgeEvent = serde_json::from_str(input)?;
    let request = handle_event(event);
    Ok(serde_json::to_string(&request)?)
}
