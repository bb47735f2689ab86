//! Core types for structured dating-profile extraction.
//!
//! This crate holds everything that does not touch the filesystem or a concrete
//! LLM provider: the profile data model, the extraction schema, the
//! [`StructuredService`](service::StructuredService) capability, and the
//! retry/backoff loop that drives it.

pub mod extraction;
pub mod profile;
pub mod service;

/// Common traits and types for ergonomic usage of the extraction core.
pub mod prelude {
    pub use crate::extraction::{
        profile_schema, ExtractionConfig, ExtractionError, ExtractionMetrics, Extractor,
        RetryPolicy,
    };
    pub use crate::profile::{
        BioSentiment, CommunicationStyle, ExtractedProfile, ProfileRecord, RelationshipGoals,
    };
    pub use crate::service::{
        ExtractionRequest, ServiceError, ServiceReply, StructuredService, ToolSpec,
    };
}
