//! # Handles
//!
//! A `Handle` is the caller's only reference to a native object. It is not
//! `Clone`, and the native `InstanceId` it carries is an opaque token that
//! only the issuing core can act on.
//!
//! ## Lifecycle
//!
//! ```text
//! create ──▶ live ──destroy──▶ destroyed (every call fails with a domain error)
//!              │
//!              └─ derive ──▶ child (invalid as soon as the parent is destroyed)
//! ```
//!
//! Calls hold a shared gate for their whole round trip; destroy takes the
//! gate exclusively, so it waits for calls already in flight.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use ferry_bus::SubscriptionSet;
use ferry_telemetry::LIVE_HANDLES;
use ferry_types::{HandleId, HandleKind, InstanceId, NativeCore};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::BridgeError;

/// Live handle ids and their kinds.
pub(crate) type HandleTable = DashMap<HandleId, HandleKind>;

/// Shared state behind a `Handle`.
pub(crate) struct HandleSlot {
    pub(crate) id: HandleId,
    pub(crate) kind: HandleKind,
    pub(crate) instance: InstanceId,
    pub(crate) core: Arc<dyn NativeCore>,
    pub(crate) parent: Option<Arc<HandleSlot>>,
    pub(crate) subscriptions: SubscriptionSet,
    pub(crate) clears_listeners: bool,
    gate: RwLock<()>,
    /// Serializes listener changes so the native table and `subscriptions`
    /// move together.
    listener_lock: AsyncMutex<()>,
    destroyed: AtomicBool,
    children: Mutex<Vec<Weak<HandleSlot>>>,
    table: Arc<HandleTable>,
}

/// Shared gates held for the duration of one native call.
pub(crate) struct CallGuard<'a> {
    _own: RwLockReadGuard<'a, ()>,
    _parent: Option<RwLockReadGuard<'a, ()>>,
}

impl HandleSlot {
    pub(crate) fn new(
        id: HandleId,
        kind: HandleKind,
        instance: InstanceId,
        core: Arc<dyn NativeCore>,
        parent: Option<Arc<HandleSlot>>,
        table: Arc<HandleTable>,
        clears_listeners: bool,
    ) -> Self {
        table.insert(id, kind);
        LIVE_HANDLES.with_label_values(&[kind.as_str()]).inc();
        Self {
            id,
            kind,
            instance,
            core,
            parent,
            subscriptions: SubscriptionSet::new(),
            clears_listeners,
            gate: RwLock::new(()),
            listener_lock: AsyncMutex::new(()),
            destroyed: AtomicBool::new(false),
            children: Mutex::new(Vec::new()),
            table,
        }
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Destroyed itself, or derived from a destroyed parent.
    pub(crate) fn is_usable(&self) -> bool {
        !self.is_destroyed() && self.parent.as_ref().map_or(true, |parent| parent.is_usable())
    }

    /// Waits for shared access and checks the handle (and its parent) is
    /// still alive.
    pub(crate) async fn enter(&self) -> Result<CallGuard<'_>, BridgeError> {
        let parent = match &self.parent {
            Some(parent) => {
                let guard = parent.gate.read().await;
                if parent.is_destroyed() {
                    return Err(BridgeError::destroyed(parent.kind));
                }
                Some(guard)
            }
            None => None,
        };
        let own = self.gate.read().await;
        if self.is_destroyed() {
            return Err(BridgeError::destroyed(self.kind));
        }
        Ok(CallGuard {
            _own: own,
            _parent: parent,
        })
    }

    /// Exclusive access for destroy.
    pub(crate) async fn lock_exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().await
    }

    /// Held across a native listen or clear and the matching
    /// `subscriptions` update.
    pub(crate) async fn lock_listeners(&self) -> MutexGuard<'_, ()> {
        self.listener_lock.lock().await
    }

    pub(crate) fn adopt(&self, child: &Arc<HandleSlot>) {
        let mut children = self.children.lock();
        children.retain(|weak| weak.strong_count() > 0);
        children.push(Arc::downgrade(child));
    }

    /// Flags the slot destroyed and stops every caller-side worker attached
    /// to it or its children. Returns `false` if it was already destroyed.
    pub(crate) fn mark_destroyed(&self) -> bool {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.subscriptions.close_all();
        for child in self.children.lock().drain(..) {
            if let Some(child) = child.upgrade() {
                child.subscriptions.close_all();
            }
        }
        self.table.remove(&self.id);
        LIVE_HANDLES.with_label_values(&[self.kind.as_str()]).dec();
        true
    }
}

/// Opaque reference to a native object.
pub struct Handle {
    pub(crate) slot: Arc<HandleSlot>,
}

impl Handle {
    pub(crate) fn new(slot: Arc<HandleSlot>) -> Self {
        Self { slot }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.slot.id
    }

    #[must_use]
    pub fn kind(&self) -> HandleKind {
        self.slot.kind
    }

    /// Native object behind this handle. Only meaningful to the core that
    /// issued it.
    #[must_use]
    pub fn instance(&self) -> InstanceId {
        self.slot.instance
    }

    /// Whether this handle was obtained from a wallet rather than created.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.slot.parent.is_some()
    }

    /// Whether calls through this handle can still succeed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.slot.is_usable()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.slot.id)
            .field("kind", &self.slot.kind)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.slot.is_destroyed() {
            crate::service::registry::release_in_background(Arc::clone(&self.slot));
        }
    }
}
