use crate::core::error::EngineError;
use crate::models::{Preference, UserId};
use crate::services::StoreUnit;

/// Score increment earned by receiving a swipe with this preference
#[inline]
pub fn score_delta(preference: Preference) -> i64 {
    match preference {
        Preference::Yes => 1,
        Preference::No => 0,
    }
}

/// Bump a user's attractiveness score for a received swipe
///
/// The store applies the delta relative to the current row value
/// (`score = score + 1`), so concurrent swipes on the same user never lose
/// an update. A NO preference touches nothing.
pub async fn bump(
    unit: &mut dyn StoreUnit,
    user: UserId,
    preference: Preference,
) -> Result<(), EngineError> {
    let delta = score_delta(preference);
    if delta == 0 {
        return Ok(());
    }

    let touched = unit.increment_score(user, delta).await?;
    if touched == 0 {
        return Err(EngineError::user_not_found(user));
    }

    tracing::trace!(user, delta, "Bumped attractiveness score");
    Ok(())
}
