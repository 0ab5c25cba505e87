//! Resume cursors: where each migration pass starts.

use tracing::info;

use crate::error::Result;
use crate::model::EntityKind;
use crate::store::TargetStore;

/// Default first identifier of a pass.
pub const DEFAULT_START_ID: i64 = 1;

/// Operator choice for the start of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSpec {
    /// Explicit first identifier, also the fallback when resuming an empty table.
    pub from: i64,

    /// Continue after the highest identifier already in the target.
    pub from_end: bool,
}

impl Default for CursorSpec {
    fn default() -> Self {
        Self {
            from: DEFAULT_START_ID,
            from_end: false,
        }
    }
}

impl CursorSpec {
    pub fn from_id(from: i64) -> Self {
        Self {
            from,
            from_end: false,
        }
    }

    pub fn resume() -> Self {
        Self {
            from: DEFAULT_START_ID,
            from_end: true,
        }
    }
}

/// Compute the first identifier for a pass over `kind`.
///
/// With `from_end`, returns one past the highest migrated identifier, or
/// `spec.from` when nothing has been migrated yet. `fresh_schema` means the
/// target tables were just created, so there is nothing to query.
pub async fn resolve_start(
    target: &dyn TargetStore,
    kind: EntityKind,
    spec: CursorSpec,
    fresh_schema: bool,
) -> Result<i64> {
    if !spec.from_end || fresh_schema {
        return Ok(spec.from);
    }

    match target.max_id(kind).await? {
        Some(last) => {
            info!(
                "Last migrated {} is {}, starting from {}",
                kind.singular(),
                last,
                last + 1
            );
            Ok(last + 1)
        }
        None => {
            info!("No migrated {} found, starting from {}", kind.plural(), spec.from);
            Ok(spec.from)
        }
    }
}
