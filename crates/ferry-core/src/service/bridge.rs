//! Bridge Service
//!
//! Facade over the registry, dispatcher, account multiplexer and event
//! bridge. Implements the `BridgeApi` port and adds typed conveniences.

use std::sync::Arc;

use async_trait::async_trait;
use ferry_bus::{EventCallback, EventStream, SubscriptionId};
use ferry_types::{AccountId, EventType, HandleKind, MethodEnvelope, NativeCore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::{BridgeConfig, Handle};
use crate::error::BridgeError;
use crate::ports::BridgeApi;
use crate::service::accounts::{self, Account};
use crate::service::registry::HandleRegistry;
use crate::service::{dispatcher, events};

/// Caller-side bridge to one native core.
#[derive(Clone)]
pub struct Bridge {
    registry: Arc<HandleRegistry>,
}

impl Bridge {
    /// Bridge with default configuration.
    pub fn new(core: Arc<dyn NativeCore>) -> Self {
        Self {
            registry: Arc::new(HandleRegistry::new(core, BridgeConfig::default())),
        }
    }

    /// Bridge with a validated configuration.
    pub fn with_config(
        core: Arc<dyn NativeCore>,
        config: BridgeConfig,
    ) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(HandleRegistry::new(core, config)),
        })
    }

    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    pub async fn create_client(&self, options: &Value) -> Result<Handle, BridgeError> {
        self.registry.create(HandleKind::Client, options).await
    }

    pub async fn create_wallet(&self, options: &Value) -> Result<Handle, BridgeError> {
        self.registry.create(HandleKind::Wallet, options).await
    }

    pub async fn create_secret_manager(&self, options: &Value) -> Result<Handle, BridgeError> {
        self.registry.create(HandleKind::SecretManager, options).await
    }

    /// The wallet's client, as a derived handle.
    pub async fn get_client(&self, wallet: &Handle) -> Result<Handle, BridgeError> {
        self.registry.derive(wallet, HandleKind::Client).await
    }

    /// The wallet's secret manager, as a derived handle.
    pub async fn get_secret_manager(&self, wallet: &Handle) -> Result<Handle, BridgeError> {
        self.registry.derive(wallet, HandleKind::SecretManager).await
    }

    pub async fn call<M: Serialize + Sync>(
        &self,
        handle: &Handle,
        method: &M,
    ) -> Result<Value, BridgeError> {
        dispatcher::call(&self.registry, handle, method).await
    }

    pub async fn call_as<M: Serialize + Sync, R: DeserializeOwned>(
        &self,
        handle: &Handle,
        method: &M,
    ) -> Result<R, BridgeError> {
        dispatcher::call_as(&self.registry, handle, method).await
    }

    pub async fn call_utils<M: Serialize + Sync>(&self, method: &M) -> Result<Value, BridgeError> {
        dispatcher::dispatch_utils(&self.registry, MethodEnvelope::from_typed(method)?).await
    }

    /// View of one account of `wallet`.
    #[must_use]
    pub fn account<'a>(&'a self, wallet: &'a Handle, id: impl Into<AccountId>) -> Account<'a> {
        Account::new(&self.registry, wallet, id.into())
    }

    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.registry.live_handles()
    }
}

#[async_trait]
impl BridgeApi for Bridge {
    async fn create(&self, kind: HandleKind, options: &Value) -> Result<Handle, BridgeError> {
        self.registry.create(kind, options).await
    }

    async fn destroy(&self, handle: &Handle) -> Result<(), BridgeError> {
        self.registry.destroy(handle).await
    }

    fn is_valid(&self, handle: &Handle) -> bool {
        self.registry.is_valid(handle)
    }

    async fn dispatch(
        &self,
        handle: &Handle,
        method: MethodEnvelope,
    ) -> Result<Value, BridgeError> {
        dispatcher::dispatch(&self.registry, handle, method).await
    }

    async fn dispatch_utils(&self, method: MethodEnvelope) -> Result<Value, BridgeError> {
        dispatcher::dispatch_utils(&self.registry, method).await
    }

    async fn dispatch_account_method(
        &self,
        wallet: &Handle,
        account_id: AccountId,
        inner: MethodEnvelope,
    ) -> Result<Value, BridgeError> {
        accounts::dispatch_account_method(&self.registry, wallet, account_id, inner).await
    }

    async fn listen(
        &self,
        handle: &Handle,
        event_types: Vec<EventType>,
        callback: EventCallback,
    ) -> Result<SubscriptionId, BridgeError> {
        events::listen(&self.registry, handle, event_types, callback).await
    }

    async fn subscribe(
        &self,
        handle: &Handle,
        event_types: Vec<EventType>,
    ) -> Result<EventStream, BridgeError> {
        events::subscribe(&self.registry, handle, event_types).await
    }

    async fn clear_listeners(
        &self,
        handle: &Handle,
        event_types: Vec<EventType>,
    ) -> Result<(), BridgeError> {
        events::clear_listeners(handle, event_types).await
    }
}
