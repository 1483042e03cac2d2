//! Per-scope refresh serialisation.

use cukemirror_protocol::{MirrorKind, Scope};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockKey = (Scope, MirrorKind);

/// Async locks keyed by `(scope, kind)`.
///
/// Refreshes of the same scope and kind queue behind each other; different
/// scopes, or folders vs scenarios of one scope, proceed in parallel.
#[derive(Clone, Default)]
pub struct ScopeLocks {
    inner: Arc<Mutex<HashMap<LockKey, Arc<Mutex<()>>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `(scope, kind)`. Released on drop.
    pub async fn lock(&self, scope: Scope, kind: MirrorKind) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.inner.lock().await;
            // Drop slots nobody holds or waits on.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry((scope, kind)).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Number of scopes currently locked or awaited.
    pub async fn active(&self) -> usize {
        let slots = self.inner.lock().await;
        slots
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_scope_is_exclusive() {
        let locks = ScopeLocks::new();
        let scope = Scope::new(1, 1);

        let guard = locks.lock(scope, MirrorKind::Folders).await;
        let second = tokio::time::timeout(
            Duration::from_millis(50),
            locks.lock(scope, MirrorKind::Folders),
        )
        .await;
        assert!(second.is_err(), "second lock should wait");

        drop(guard);
        let _again = locks.lock(scope, MirrorKind::Folders).await;
    }

    #[tokio::test]
    async fn test_other_scopes_and_kinds_do_not_block() {
        let locks = ScopeLocks::new();
        let scope = Scope::new(1, 1);

        let _folders = locks.lock(scope, MirrorKind::Folders).await;
        let _scenarios = locks.lock(scope, MirrorKind::Scenarios).await;
        let _other_user = locks.lock(Scope::new(1, 2), MirrorKind::Folders).await;
        assert_eq!(locks.active().await, 3);
    }

    #[tokio::test]
    async fn test_released_slots_are_pruned() {
        let locks = ScopeLocks::new();
        for user in 0..10 {
            let _guard = locks.lock(Scope::new(1, user), MirrorKind::Folders).await;
        }
        let _last = locks.lock(Scope::new(2, 2), MirrorKind::Folders).await;
        assert_eq!(locks.inner.lock().await.len(), 1);
    }
}
