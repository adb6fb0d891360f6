//! Distribution module
//!
//! Describes the content-delivery distribution for a site and decides which
//! cache behaviour serves a given request path.

mod pattern;
mod plan;

pub use pattern::{match_behavior, pattern_matches};
pub use plan::{
    apex_of, domain_names_for, hosted_zone_for, AllowedMethods, CacheBehavior, Certificate,
    CorsPreflight, DistributionPlan, DnsRecord, FunctionAssociationPlan, OriginKind,
    OriginRequestPolicy, ServerFunctionPlan, ViewerProtocolPolicy, API_FORWARDED_HEADERS,
    CERTIFICATE_REGION, SERVER_FUNCTION_TIMEOUT_SECS,
};
