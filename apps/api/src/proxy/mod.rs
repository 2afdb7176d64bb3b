// Generation edge function: cache lookup → provider call → cache upsert.
// All provider calls go through llm_client.

pub mod handlers;
pub mod service;

pub use service::{CacheStatus, EdgeProxy, ProxyError, ProxyOutcome};
