//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Admission control
//!
//! The registry is a fixed slot table behind one lock. Admission and removal are
//! rare next to per-session I/O, so every operation simply takes that lock; the
//! lock is never held across an `.await`. The active-session gauge is set while
//! the lock is held, so it always ends on the registry's real count.

use crate::session::SessionHandle;
use crate::types::SessionInfo;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Slots {
    table: Vec<Option<Arc<SessionHandle>>>,
    current: usize,
    lifetime: u64,
}

/// Bounded table of admitted sessions
pub struct SessionRegistry {
    slots: Mutex<Slots>,
}

impl SessionRegistry {
    /// Create a registry with room for `capacity` sessions
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(Slots {
                table: vec![None; capacity],
                current: 0,
                lifetime: 0,
            }),
        }
    }

    /// Maximum number of admitted sessions
    pub fn capacity(&self) -> usize {
        self.slots.lock().table.len()
    }

    /// Claim a slot for `session`
    ///
    /// Returns false, changing nothing, when every slot is taken or the session
    /// already holds one.
    pub fn admit(&self, session: &Arc<SessionHandle>) -> bool {
        let mut slots = self.slots.lock();
        let already_admitted = slots
            .table
            .iter()
            .flatten()
            .any(|held| Arc::ptr_eq(held, session));
        if already_admitted {
            warn!(session = %session.id(), "Session admitted twice");
            return false;
        }

        let Some(free) = slots.table.iter_mut().find(|slot| slot.is_none()) else {
            debug!(session = %session.id(), "Registry saturated");
            counter!("switchboard.sessions.rejected").increment(1);
            return false;
        };
        *free = Some(Arc::clone(session));
        slots.current += 1;
        slots.lifetime += 1;
        let current = slots.current;
        gauge!("switchboard.sessions.active").set(current as f64);
        drop(slots);

        counter!("switchboard.sessions.admitted").increment(1);
        debug!(session = %session.id(), current, "Session admitted");
        true
    }

    /// Free the slot held by `session`
    ///
    /// Returns whether a slot was freed; removing a session that holds none is a
    /// no-op.
    pub fn remove(&self, session: &SessionHandle) -> bool {
        let mut slots = self.slots.lock();
        let Some(slot) = slots
            .table
            .iter_mut()
            .find(|slot| {
                slot.as_deref()
                    .is_some_and(|held| std::ptr::eq(held, session))
            })
        else {
            return false;
        };
        *slot = None;
        slots.current -= 1;
        let current = slots.current;
        gauge!("switchboard.sessions.active").set(current as f64);
        drop(slots);

        debug!(session = %session.id(), current, "Session removed");
        true
    }

    /// Whether every slot is taken
    pub fn is_saturated(&self) -> bool {
        let slots = self.slots.lock();
        slots.current == slots.table.len()
    }

    /// Number of admitted sessions
    pub fn current_count(&self) -> usize {
        self.slots.lock().current
    }

    /// Number of successful admissions since the registry was created
    pub fn lifetime_count(&self) -> u64 {
        self.slots.lock().lifetime
    }

    /// Snapshot of every admitted session, in slot order
    pub fn sessions(&self) -> Vec<SessionInfo> {
        let held: Vec<Arc<SessionHandle>> =
            self.slots.lock().table.iter().flatten().cloned().collect();
        held.iter().map(|handle| handle.info()).collect()
    }

    /// Ask every admitted session to end
    ///
    /// Sessions release their own slots as they tear down. Returns how many were
    /// signalled.
    pub fn shutdown_all(&self) -> usize {
        let held: Vec<Arc<SessionHandle>> =
            self.slots.lock().table.iter().flatten().cloned().collect();
        for handle in &held {
            handle.cancel();
        }
        info!(count = held.len(), "Signalled admitted sessions to close");
        held.len()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.lock();
        f.debug_struct("SessionRegistry")
            .field("capacity", &slots.table.len())
            .field("current", &slots.current)
            .field("lifetime", &slots.lifetime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SessionId, SessionState};
    use proptest::prelude::*;
    use tokio_util::sync::CancellationToken;

    fn handle(id: u64) -> Arc<SessionHandle> {
        Arc::new(SessionHandle::new(
            SessionId::new(id),
            None,
            CancellationToken::new(),
        ))
    }

    #[test]
    fn test_admit_until_saturated() {
        let registry = SessionRegistry::new(2);
        let (a, b, c) = (handle(1), handle(2), handle(3));

        assert!(registry.admit(&a));
        assert!(!registry.is_saturated());
        assert!(registry.admit(&b));
        assert!(registry.is_saturated());
        assert!(!registry.admit(&c));

        assert_eq!(registry.current_count(), 2);
        assert_eq!(registry.lifetime_count(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SessionRegistry::new(2);
        let a = handle(1);
        assert!(registry.admit(&a));

        assert!(registry.remove(&a));
        assert!(!registry.remove(&a));
        assert_eq!(registry.current_count(), 0);
        assert_eq!(registry.lifetime_count(), 1);
    }

    #[test]
    fn test_remove_unknown_session_is_noop() {
        let registry = SessionRegistry::new(1);
        let (a, b) = (handle(1), handle(2));
        assert!(registry.admit(&a));
        assert!(!registry.remove(&b));
        assert_eq!(registry.current_count(), 1);
    }

    #[test]
    fn test_double_admit_refused() {
        let registry = SessionRegistry::new(3);
        let a = handle(1);
        assert!(registry.admit(&a));
        assert!(!registry.admit(&a));
        assert_eq!(registry.current_count(), 1);
        assert_eq!(registry.lifetime_count(), 1);
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let registry = SessionRegistry::new(1);
        let (a, b) = (handle(1), handle(2));
        assert!(registry.admit(&a));
        registry.remove(&a);
        assert!(registry.admit(&b));
        assert_eq!(registry.lifetime_count(), 2);
        assert_eq!(registry.sessions()[0].id, SessionId::new(2));
    }

    #[test]
    fn test_shutdown_all_cancels_admitted_sessions() {
        let registry = SessionRegistry::new(3);
        let (a, b, outsider) = (handle(1), handle(2), handle(3));
        registry.admit(&a);
        registry.admit(&b);

        assert_eq!(registry.shutdown_all(), 2);
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(!outsider.is_cancelled());
    }

    #[test]
    fn test_sessions_snapshot() {
        let registry = SessionRegistry::new(2);
        let a = handle(7);
        registry.admit(&a);
        let sessions = registry.sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, SessionId::new(7));
        assert_eq!(sessions[0].state, SessionState::New);
    }

    #[test]
    fn test_concurrent_admission_never_exceeds_capacity() {
        let registry = Arc::new(SessionRegistry::new(4));
        let threads: Vec<_> = (0..8)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let mut admitted = 0u64;
                    for round in 0..200 {
                        let session = handle(worker * 1000 + round);
                        if registry.admit(&session) {
                            admitted += 1;
                            assert!(registry.current_count() <= 4);
                            registry.remove(&session);
                        }
                    }
                    admitted
                })
            })
            .collect();

        let admitted: u64 = threads.into_iter().map(|t| t.join().unwrap()).sum();
        assert_eq!(registry.current_count(), 0);
        assert_eq!(registry.lifetime_count(), admitted);
    }

    proptest! {
        #[test]
        fn prop_counters_stay_consistent(
            capacity in 1usize..6,
            ops in proptest::collection::vec((any::<bool>(), 0usize..8), 0..64),
        ) {
            let registry = SessionRegistry::new(capacity);
            let pool: Vec<_> = (0..8).map(handle).collect();
            let mut admitted = 0u64;
            let mut last_lifetime = 0u64;

            for (is_admit, index) in ops {
                if is_admit {
                    if registry.admit(&pool[index]) {
                        admitted += 1;
                    }
                } else {
                    registry.remove(&pool[index]);
                }
                let current = registry.current_count();
                let lifetime = registry.lifetime_count();
                prop_assert!(current <= capacity);
                prop_assert!(lifetime >= last_lifetime);
                prop_assert_eq!(lifetime, admitted);
                prop_assert_eq!(registry.sessions().len(), current);
                last_lifetime = lifetime;
            }
        }
    }
}
