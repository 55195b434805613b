use crate::core::{error::EngineError, ledger};
use crate::models::{Preference, UserId};
use crate::services::StoreUnit;

/// Whether recording `actor -> target` with `preference` completes a match
///
/// Only a YES can complete a match, and only if `target` already said YES to
/// `actor` inside the same snapshot. A NO never matches, even against a
/// reverse YES, and the store is not consulted for it.
pub async fn check_mutual(
    unit: &mut dyn StoreUnit,
    actor: UserId,
    target: UserId,
    preference: Preference,
) -> Result<bool, EngineError> {
    if !preference.is_yes() {
        return Ok(false);
    }

    let reciprocal = ledger::count_reciprocal(unit, actor, target).await?;
    Ok(reciprocal > 0)
}
