//! Keep-or-skip decisions for short posts.
//!
//! The engine only knows the [`ShortPostGate`] trait. The CLI implements it
//! with a terminal prompt; tests use scripted gates.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::LegacyPost;

/// Decision for one short post candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Keep,
    Skip,
}

/// Decides whether a short post should be migrated.
///
/// Called only for non-attachment rows whose body is below the configured
/// threshold, and only when the operator asked for confirmation.
#[async_trait]
pub trait ShortPostGate: Send + Sync {
    async fn decide(&self, post: &LegacyPost) -> Result<GateDecision>;
}

/// Gate that keeps every post.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl ShortPostGate for AcceptAll {
    async fn decide(&self, _post: &LegacyPost) -> Result<GateDecision> {
        Ok(GateDecision::Keep)
    }
}
