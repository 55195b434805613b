use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use crate::core::filters::{is_unswiped_candidate, matches_filter};
use crate::models::{DiscoveryFilter, NewUser, OrderBy, Preference, Profile, Swipe, User, UserId};
use crate::services::store::{Store, StoreError, StoreUnit};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    swipes: Vec<Swipe>,
    preferences: HashMap<(UserId, UserId), Preference>,
    last_user_id: UserId,
    last_swipe_id: i64,
}

type RowLock = Arc<Mutex<()>>;

/// In-process store with the same transactional contract as Postgres
///
/// Committed state sits behind a read-write lock that is only held for the
/// length of a single read or of a commit. A unit buffers its own writes and
/// publishes them on commit, so reads see committed data the way READ
/// COMMITTED does. `lock_users` takes per-user row locks held until the unit
/// ends.
///
/// Meant for development and tests: nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    row_locks: Arc<Mutex<HashMap<UserId, RowLock>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed swipes, for diagnostics and tests
    pub async fn swipe_count(&self) -> usize {
        self.state.read().await.swipes.len()
    }

    async fn row_lock(&self, id: UserId) -> RowLock {
        self.row_locks.lock().await.entry(id).or_default().clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreUnit>, StoreError> {
        Ok(Box::new(MemoryUnit {
            store: self.clone(),
            row_guards: BTreeMap::new(),
            swipes: Vec::new(),
            score_deltas: HashMap::new(),
        }))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        state.last_user_id += 1;

        let created = User {
            id: state.last_user_id,
            name: user.name,
            age: user.age,
            gender: user.gender,
            location: user.location,
            attractiveness_score: 0,
        };
        state.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn query_candidates(
        &self,
        requester: UserId,
        filter: &DiscoveryFilter,
    ) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;

        let swiped: HashSet<UserId> = state
            .preferences
            .keys()
            .filter(|(actor, _)| *actor == requester)
            .map(|(_, target)| *target)
            .collect();

        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| is_unswiped_candidate(u, requester, &swiped))
            .filter(|u| matches_filter(u, filter))
            .cloned()
            .collect();

        if filter.order_by == Some(OrderBy::AttractivenessScore) {
            users.sort_by(|a, b| {
                b.attractiveness_score
                    .cmp(&a.attractiveness_score)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }

        Ok(users)
    }

    async fn swipes_by_actor(&self, actor: UserId) -> Result<Vec<Swipe>, StoreError> {
        let state = self.state.read().await;

        let mut swipes: Vec<Swipe> = state
            .swipes
            .iter()
            .filter(|s| s.actor_id == actor)
            .cloned()
            .collect();
        swipes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        Ok(swipes)
    }

    async fn mutual_matches(&self, user: UserId) -> Result<Vec<Profile>, StoreError> {
        let state = self.state.read().await;

        let mut matches: Vec<Profile> = state
            .preferences
            .iter()
            .filter(|((actor, _), preference)| *actor == user && preference.is_yes())
            .filter(|((_, target), _)| state.preferences.get(&(*target, user)) == Some(&Preference::Yes))
            .filter_map(|((_, target), _)| state.users.get(target).map(User::profile))
            .collect();
        matches.sort_by_key(|p| p.id);

        Ok(matches)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Open unit of work on a `MemoryStore`
///
/// Holds its row locks and pending writes. Dropping it releases the locks
/// and forgets the writes.
pub struct MemoryUnit {
    store: MemoryStore,
    row_guards: BTreeMap<UserId, OwnedMutexGuard<()>>,
    swipes: Vec<Swipe>,
    score_deltas: HashMap<UserId, i64>,
}

impl MemoryUnit {
    fn pending(&self, actor: UserId, target: UserId) -> Option<&Swipe> {
        self.swipes
            .iter()
            .find(|s| s.actor_id == actor && s.target_id == target)
    }
}

#[async_trait]
impl StoreUnit for MemoryUnit {
    async fn lock_users(&mut self, ids: &[UserId]) -> Result<Vec<UserId>, StoreError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut locked = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.store.state.read().await.users.contains_key(&id) {
                continue;
            }
            if !self.row_guards.contains_key(&id) {
                let guard = self.store.row_lock(id).await.lock_owned().await;
                self.row_guards.insert(id, guard);
            }
            locked.push(id);
        }

        Ok(locked)
    }

    async fn swipe_exists(&mut self, actor: UserId, target: UserId) -> Result<bool, StoreError> {
        if self.pending(actor, target).is_some() {
            return Ok(true);
        }
        Ok(self.store.state.read().await.preferences.contains_key(&(actor, target)))
    }

    async fn insert_swipe(
        &mut self,
        actor: UserId,
        target: UserId,
        preference: Preference,
    ) -> Result<Swipe, StoreError> {
        {
            let state = self.store.state.read().await;
            for id in [actor, target] {
                if !state.users.contains_key(&id) {
                    return Err(StoreError::ForeignKeyViolation(format!("user {} does not exist", id)));
                }
            }
            if state.preferences.contains_key(&(actor, target)) {
                return Err(StoreError::UniqueViolation(format!(
                    "swipe ({}, {}) already exists",
                    actor, target
                )));
            }
        }
        if self.pending(actor, target).is_some() {
            return Err(StoreError::UniqueViolation(format!(
                "swipe ({}, {}) already exists",
                actor, target
            )));
        }

        // Ids are handed out like a sequence: a rolled back unit burns its id
        let id = {
            let mut state = self.store.state.write().await;
            state.last_swipe_id += 1;
            state.last_swipe_id
        };

        let swipe = Swipe {
            id,
            actor_id: actor,
            target_id: target,
            preference,
            created_at: chrono::Utc::now(),
        };
        self.swipes.push(swipe.clone());

        Ok(swipe)
    }

    async fn count_reciprocal(&mut self, actor: UserId, target: UserId) -> Result<i64, StoreError> {
        let pending = self
            .pending(target, actor)
            .map_or(false, |s| s.preference.is_yes());
        let committed = self.store.state.read().await.preferences.get(&(target, actor)) == Some(&Preference::Yes);

        Ok(i64::from(pending || committed))
    }

    async fn increment_score(&mut self, user: UserId, delta: i64) -> Result<u64, StoreError> {
        if !self.store.state.read().await.users.contains_key(&user) {
            return Ok(0);
        }

        *self.score_deltas.entry(user).or_insert(0) += delta;
        Ok(1)
    }

    async fn fetch_profile(&mut self, user: UserId) -> Result<Option<Profile>, StoreError> {
        Ok(self.store.state.read().await.users.get(&user).map(User::profile))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryUnit { store, row_guards, swipes, score_deltas } = *self;
        let mut state = store.state.write().await;

        // A unit that skipped `lock_users` can still race another one
        if let Some(dup) = swipes
            .iter()
            .find(|s| state.preferences.contains_key(&(s.actor_id, s.target_id)))
        {
            return Err(StoreError::UniqueViolation(format!(
                "swipe ({}, {}) already exists",
                dup.actor_id, dup.target_id
            )));
        }

        for (user, delta) in score_deltas {
            if let Some(u) = state.users.get_mut(&user) {
                u.attractiveness_score += delta;
            }
        }
        for swipe in swipes {
            state.preferences.insert((swipe.actor_id, swipe.target_id), swipe.preference);
            state.swipes.push(swipe);
        }

        // Published before the row locks are released
        drop(state);
        drop(row_guards);

        Ok(())
    }
}
