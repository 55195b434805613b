use crate::core::error::EngineError;
use crate::models::{Preference, Swipe, UserId};
use crate::services::{StoreError, StoreUnit};

/// Lock both participants' rows for the rest of the unit
///
/// Any two swipes that share a user are ordered by this lock, whichever
/// direction they run in. Fails with `NotFound` when either user is missing.
pub async fn lock_pair(
    unit: &mut dyn StoreUnit,
    actor: UserId,
    target: UserId,
) -> Result<(), EngineError> {
    let mut ids = [actor, target];
    ids.sort_unstable();

    let locked = unit.lock_users(&ids).await?;

    for id in [actor, target] {
        if !locked.contains(&id) {
            return Err(EngineError::user_not_found(id));
        }
    }

    Ok(())
}

/// True iff a swipe for the ordered pair is present in the unit
pub async fn exists(
    unit: &mut dyn StoreUnit,
    actor: UserId,
    target: UserId,
) -> Result<bool, EngineError> {
    Ok(unit.swipe_exists(actor, target).await?)
}

/// Record a new swipe
///
/// The prior `exists` read only short-circuits the common case. The store's
/// uniqueness constraint is what rejects a concurrent duplicate that slipped
/// past the read.
pub async fn record(
    unit: &mut dyn StoreUnit,
    actor: UserId,
    target: UserId,
    preference: Preference,
) -> Result<Swipe, EngineError> {
    if exists(unit, actor, target).await? {
        return Err(EngineError::DuplicateSwipe { actor, target });
    }

    match unit.insert_swipe(actor, target, preference).await {
        Ok(swipe) => Ok(swipe),
        Err(StoreError::UniqueViolation(_)) => Err(EngineError::DuplicateSwipe { actor, target }),
        Err(StoreError::ForeignKeyViolation(detail)) => {
            tracing::debug!(actor, target, %detail, "Swipe references an unknown user");
            Err(EngineError::NotFound(format!(
                "user {} or {} does not exist",
                actor, target
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// Count of YES swipes running from `target` back to `actor`
pub async fn count_reciprocal(
    unit: &mut dyn StoreUnit,
    actor: UserId,
    target: UserId,
) -> Result<i64, EngineError> {
    Ok(unit.count_reciprocal(actor, target).await?)
}
