//! Per-entity update serialization
//!
//! Entities hash onto a fixed set of mutex stripes. An update holds the
//! stripes of both participants for its whole read-decay-compute-commit
//! sequence; stripes are always taken in index order so two updates can never
//! deadlock. Pairs that land on different stripes proceed in parallel.

use crate::error::{RatingError, Result};
use crate::types::EntityId;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

/// Default number of stripes
pub const DEFAULT_STRIPES: usize = 64;

/// Striped entity locks
#[derive(Debug)]
pub struct EntityLocks {
    stripes: Vec<Mutex<()>>,
}

/// Guard over the stripes of one or two entities
#[derive(Debug)]
pub struct EntityGuard<'a> {
    _first: MutexGuard<'a, ()>,
    _second: Option<MutexGuard<'a, ()>>,
}

impl EntityLocks {
    pub fn new(stripes: usize) -> Self {
        let stripes = stripes.max(1);
        Self {
            stripes: (0..stripes).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Stripe index an entity maps to
    pub fn stripe_of(&self, entity_id: &EntityId) -> usize {
        let mut hasher = DefaultHasher::new();
        entity_id.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    fn acquire(&self, index: usize) -> Result<MutexGuard<'_, ()>> {
        self.stripes[index].lock().map_err(|_| {
            RatingError::InternalError {
                message: format!("Entity lock stripe {} is poisoned", index),
            }
            .into()
        })
    }

    /// Lock a single entity
    pub fn lock(&self, entity_id: &EntityId) -> Result<EntityGuard<'_>> {
        Ok(EntityGuard {
            _first: self.acquire(self.stripe_of(entity_id))?,
            _second: None,
        })
    }

    /// Lock both participants of a match
    pub fn lock_pair(&self, a: &EntityId, b: &EntityId) -> Result<EntityGuard<'_>> {
        let (low, high) = {
            let (x, y) = (self.stripe_of(a), self.stripe_of(b));
            (x.min(y), x.max(y))
        };

        let first = self.acquire(low)?;
        let second = if high != low {
            Some(self.acquire(high)?)
        } else {
            None
        };

        Ok(EntityGuard {
            _first: first,
            _second: second,
        })
    }
}

impl Default for EntityLocks {
    fn default() -> Self {
        Self::new(DEFAULT_STRIPES)
    }
}
