//! Optimistic star toggle.
//!
//! The new star state is layered over the cached repository before the
//! mutation is sent, so every view reading the cache updates at once. The
//! layer is committed, and the server's values upserted, when the mutation
//! succeeds; it is rolled back exactly once when it fails.

use std::fmt;
use std::future::Future;

use tracing::{debug, warn};

use crate::cache::{CacheEntity, EntityKey, SharedCache};
use crate::error::LensError;
use crate::models::StarState;

/// Which mutation a toggle sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarOperation {
    AddStar,
    RemoveStar,
}

impl StarOperation {
    /// The operation that flips `starred`.
    #[must_use]
    pub fn toggling(starred: bool) -> Self {
        if starred { Self::RemoveStar } else { Self::AddStar }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AddStar => "AddStar",
            Self::RemoveStar => "RemoveStar",
        }
    }

    /// The state the server is expected to report after this operation.
    #[must_use]
    pub fn predict(self, current: &StarState) -> StarState {
        let (stargazer_count, viewer_has_starred) = match self {
            Self::AddStar => (current.stargazer_count.saturating_add(1), true),
            Self::RemoveStar => (current.stargazer_count.saturating_sub(1), false),
        };
        StarState {
            id: current.id.clone(),
            stargazer_count,
            viewer_has_starred,
        }
    }
}

impl fmt::Display for StarOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sends star mutations.
pub trait StarMutator {
    /// Apply `op` to the starrable with global id `starrable_id` and return
    /// the confirmed state.
    fn mutate(
        &self,
        op: StarOperation,
        starrable_id: &str,
    ) -> impl Future<Output = Result<StarState, LensError>>;
}

/// Flip the viewer's star on the entity cached under `key`.
///
/// # Errors
///
/// Returns [`LensError::NotFound`] when `key` is not cached and
/// [`LensError::CacheRecord`] when its record lacks usable star fields.
/// Mutation failures are propagated after the optimistic update is rolled
/// back.
pub async fn toggle_star<M: StarMutator>(
    cache: &SharedCache,
    mutator: &M,
    key: &EntityKey,
) -> Result<StarState, LensError> {
    let current: StarState = cache
        .read_as(key)?
        .ok_or_else(|| LensError::not_found("starrable", key.as_str()))?;
    let op = StarOperation::toggling(current.viewer_has_starred);
    let predicted = op.predict(&current);
    let token = cache.apply_optimistic(key.clone(), predicted.to_record()?);
    debug!(%key, %op, count = predicted.stargazer_count, "star toggled optimistically");

    match mutator.mutate(op, &current.id).await {
        Ok(confirmed) => {
            cache.commit(token)?;
            cache.upsert_entity(&confirmed)?;
            Ok(confirmed)
        }
        Err(e) => {
            warn!(%key, %op, "star mutation failed: {e}");
            cache.rollback(token)?;
            Err(e)
        }
    }
}
