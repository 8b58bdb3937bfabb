//! Bookkeeping for optimistic updates.
//!
//! Each entity moves through `Idle → Pending(previous) → Committed | RolledBack`.
//! The snapshot taken when entering `Pending` is what a rollback restores.

use std::collections::HashMap;

use crate::error::{ClientError, ClientResult};
use crate::models::{Milestone, Task};

/// Identifies an entity across the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Project(i64),
    Milestone(i64),
    Task(i64),
}

/// Copy of an entity taken before an optimistic change
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Milestone(Milestone),
    Task(Task),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationState<T> {
    Idle,
    Pending {
        previous: T,
    },
    Committed,
    RolledBack,
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> MutationState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Enter `Pending`. Refused while another change is still in flight,
    /// since its rollback would restore a snapshot older than ours.
    pub fn begin(&mut self, previous: T) -> Result<(), T> {
        if self.is_pending() {
            return Err(previous);
        }
        *self = Self::Pending { previous };
        Ok(())
    }

    /// The server accepted the change
    pub fn commit(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        *self = Self::Committed;
        true
    }

    /// The server rejected the change; hands back the snapshot to restore
    pub fn rollback(&mut self) -> Option<T> {
        match std::mem::replace(self, Self::RolledBack) {
            Self::Pending { previous } => Some(previous),
            other => {
                *self = other;
                None
            }
        }
    }
}

/// Per-entity optimistic states for one store
#[derive(Debug, Clone, Default)]
pub struct MutationTracker {
    states: HashMap<EntityKey, MutationState<Snapshot>>,
}

impl MutationTracker {
    pub fn state(&self, key: EntityKey) -> MutationState<Snapshot> {
        self.states.get(&key).cloned().unwrap_or_default()
    }

    pub fn begin(&mut self, key: EntityKey, snapshot: Snapshot) -> ClientResult<()> {
        self.states
            .entry(key)
            .or_default()
            .begin(snapshot)
            .map_err(|_| {
                ClientError::Conflict(format!("{:?} already has a change in flight", key))
            })
    }

    pub fn commit(&mut self, key: EntityKey) -> bool {
        self.states
            .get_mut(&key)
            .map(MutationState::commit)
            .unwrap_or(false)
    }

    pub fn rollback(&mut self, key: EntityKey) -> Option<Snapshot> {
        self.states.get_mut(&key).and_then(MutationState::rollback)
    }

    /// Drop state for an entity that no longer exists
    pub fn forget(&mut self, key: EntityKey) {
        self.states.remove(&key);
    }

    /// Forget committed and rolled back states. In-flight changes keep
    /// their snapshot so they can still settle.
    pub fn clear_settled(&mut self) {
        self.states
            .retain(|_, state| matches!(state, MutationState::Pending { .. }));
    }
}
