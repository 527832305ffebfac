// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation mutual exclusion.
//!
//! Every unit of work that reads and then mutates a conversation (a pipeline
//! run, an operator edit) holds that conversation's [`LockToken`] for its whole
//! duration. Waiters are granted the lock in arrival order, and a waiter that
//! exceeds its timeout gives up with [`CourierError::LockTimeout`] without
//! affecting anyone else.

use std::sync::Arc;
use std::time::{Duration, Instant};

use courier_core::{ConversationId, CourierError};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// Exclusive right to mutate one conversation.
///
/// Released by [`LockToken::release`], by [`ConversationRegistry::release`],
/// or by dropping the token, whichever comes first. Later releases are no-ops.
#[derive(Debug)]
pub struct LockToken {
    conversation_id: ConversationId,
    guard: Option<OwnedMutexGuard<()>>,
    acquired_at: Instant,
}

impl LockToken {
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    /// Gives the lock back. Returns `false` if it was already released.
    pub fn release(&mut self) -> bool {
        match self.guard.take() {
            Some(guard) => {
                drop(guard);
                debug!(
                    conversation_id = %self.conversation_id,
                    held_ms = self.acquired_at.elapsed().as_millis() as u64,
                    "conversation lock released"
                );
                true
            }
            None => false,
        }
    }
}

/// Registry of per-conversation locks, created lazily on first use.
#[derive(Debug, Default)]
pub struct ConversationRegistry {
    locks: DashMap<ConversationId, Arc<Mutex<()>>>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits up to `timeout` for exclusive access to `conversation_id`.
    pub async fn acquire(
        &self,
        conversation_id: &ConversationId,
        timeout: Duration,
    ) -> Result<LockToken, CourierError> {
        // The map entry guard must not live across the await below.
        let lock = self
            .locks
            .entry(conversation_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        let started = Instant::now();
        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => {
                debug!(
                    conversation_id = %conversation_id,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "conversation lock acquired"
                );
                Ok(LockToken {
                    conversation_id: conversation_id.clone(),
                    guard: Some(guard),
                    acquired_at: Instant::now(),
                })
            }
            Err(_) => {
                warn!(
                    conversation_id = %conversation_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "timed out waiting for conversation lock"
                );
                Err(CourierError::LockTimeout {
                    conversation_id: conversation_id.to_string(),
                    waited: timeout,
                })
            }
        }
    }

    /// Releases `token`. Safe to call more than once.
    pub fn release(&self, token: &mut LockToken) {
        token.release();
    }

    /// Whether some unit of work currently holds the conversation.
    pub fn is_locked(&self, conversation_id: &ConversationId) -> bool {
        self.locks
            .get(conversation_id)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Drops entries that nobody holds or waits on. Returns how many were evicted.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        // Holders keep a clone inside their guard and waiters keep one on
        // their stack, so a count of one means the map owns the only handle.
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let evicted = before.saturating_sub(self.locks.len());
        if evicted > 0 {
            debug!(evicted, "pruned idle conversation locks");
        }
        evicted
    }

    /// Forgets every entry. Outstanding tokens stay valid until dropped.
    pub fn clear(&self) {
        self.locks.clear();
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
