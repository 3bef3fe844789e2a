//! Handle Registry
//!
//! Creates handles for native objects and runs their destroy sequence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ferry_types::{redact, HandleId, HandleKind, NativeCore};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::handle::{HandleSlot, HandleTable};
use crate::domain::{BridgeConfig, Handle};
use crate::error::BridgeError;

/// Single owner of handle ids for one native core.
pub struct HandleRegistry {
    core: Arc<dyn NativeCore>,
    config: BridgeConfig,
    table: Arc<HandleTable>,
    next_id: AtomicU64,
}

impl HandleRegistry {
    pub fn new(core: Arc<dyn NativeCore>, config: BridgeConfig) -> Self {
        Self {
            core,
            config,
            table: Arc::new(HandleTable::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn core(&self) -> &Arc<dyn NativeCore> {
        &self.core
    }

    /// Creates a root native object. Suspends while the core initializes.
    pub async fn create(&self, kind: HandleKind, options: &Value) -> Result<Handle, BridgeError> {
        debug!(%kind, options = %redact(options), "Creating native object");
        let instance = self
            .core
            .create(kind, options.to_string())
            .await
            .map_err(|message| BridgeError::domain(kind.error_kind(), message))?;
        let handle = self.register(kind, instance, None);
        info!(handle = %handle.id(), %kind, "Handle created");
        Ok(handle)
    }

    /// Obtains a client or secret manager owned by `wallet`. The result
    /// shares the wallet's lifecycle.
    pub async fn derive(&self, wallet: &Handle, kind: HandleKind) -> Result<Handle, BridgeError> {
        if wallet.kind() != HandleKind::Wallet {
            return Err(BridgeError::domain(
                HandleKind::Wallet.error_kind(),
                format!("cannot get a {kind} from a {} handle", wallet.kind()),
            ));
        }
        let instance = {
            let _guard = wallet.slot.enter().await?;
            self.core
                .derive(wallet.slot.instance, kind)
                .await
                .map_err(|message| BridgeError::domain(kind.error_kind(), message))?
        };
        let handle = self.register(kind, instance, Some(Arc::clone(&wallet.slot)));
        wallet.slot.adopt(&handle.slot);
        debug!(handle = %handle.id(), parent = %wallet.id(), %kind, "Derived handle created");
        Ok(handle)
    }

    /// Frees the native object once. Repeated calls are a no-op.
    pub async fn destroy(&self, handle: &Handle) -> Result<(), BridgeError> {
        destroy_slot(&handle.slot).await
    }

    #[must_use]
    pub fn is_valid(&self, handle: &Handle) -> bool {
        handle.is_valid()
    }

    /// Handles created and not yet destroyed.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.table.len()
    }

    /// Kind of a live handle, by id.
    #[must_use]
    pub fn kind_of(&self, id: HandleId) -> Option<HandleKind> {
        self.table.get(&id).map(|entry| *entry.value())
    }

    fn register(
        &self,
        kind: HandleKind,
        instance: ferry_types::InstanceId,
        parent: Option<Arc<HandleSlot>>,
    ) -> Handle {
        let id = HandleId(self.next_id.fetch_add(1, Ordering::Relaxed));
        Handle::new(Arc::new(HandleSlot::new(
            id,
            kind,
            instance,
            Arc::clone(&self.core),
            parent,
            Arc::clone(&self.table),
            self.config.destroy_clears_listeners,
        )))
    }
}

/// Destroy sequence: wait for in-flight calls, clear native listeners (root
/// handles only), free the native object, then stop caller-side workers.
///
/// If the native destroy fails the handle stays valid. Subscriptions whose
/// native listeners were already cleared are closed so their streams end.
pub(crate) async fn destroy_slot(slot: &HandleSlot) -> Result<(), BridgeError> {
    let _exclusive = slot.lock_exclusive().await;
    if slot.is_destroyed() {
        debug!(handle = %slot.id, kind = %slot.kind, "Handle already destroyed");
        return Ok(());
    }

    let parent_gone = slot
        .parent
        .as_ref()
        .is_some_and(|parent| !parent.is_usable());

    if !parent_gone {
        let cleared = if slot.parent.is_none() && slot.clears_listeners {
            match slot.core.clear_listeners(slot.instance, Vec::new()).await {
                Ok(()) => true,
                Err(message) => {
                    warn!(
                        handle = %slot.id,
                        error = %message,
                        "Failed to clear listeners before destroy"
                    );
                    false
                }
            }
        } else {
            false
        };
        if let Err(message) = slot.core.destroy(slot.instance).await {
            if cleared {
                let closed = slot.subscriptions.clear(&[]);
                warn!(
                    handle = %slot.id,
                    closed,
                    "Native destroy failed; closed cleared subscriptions"
                );
            }
            return Err(BridgeError::domain(slot.kind.error_kind(), message));
        }
    }

    slot.mark_destroyed();
    info!(
        handle = %slot.id,
        kind = %slot.kind,
        derived = slot.parent.is_some(),
        "Handle destroyed"
    );
    Ok(())
}

/// Destroys a dropped, never-destroyed handle on the current runtime.
pub(crate) fn release_in_background(slot: Arc<HandleSlot>) {
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            if slot.parent.is_some() {
                debug!(handle = %slot.id, kind = %slot.kind, "Derived handle dropped; releasing");
            } else {
                warn!(
                    handle = %slot.id,
                    kind = %slot.kind,
                    "Handle dropped without destroy; releasing"
                );
            }
            runtime.spawn(async move {
                if let Err(e) = destroy_slot(&slot).await {
                    warn!(handle = %slot.id, error = %e, "Background destroy failed");
                }
            });
        }
        Err(_) => {
            warn!(
                handle = %slot.id,
                kind = %slot.kind,
                "Handle dropped outside a runtime; native object leaked"
            );
        }
    }
}
