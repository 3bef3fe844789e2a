//! # Handle Lifecycle
//!
//! Create, derive, destroy and drop against the in-memory core.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use ferry_core::{
        Bridge, BridgeApi, BridgeError, DomainErrorKind, EventType, HandleKind, InMemoryCore,
    };
    use ferry_types::{ClientMethod, InstanceId, NativeCore, PushSink, WalletMethod};
    use serde_json::json;
    use tokio::time::timeout;

    use crate::integration::fixtures::{bridge, eventually, wallet_with_accounts, WAIT};

    /// In-memory core whose `destroy` always fails.
    struct StuckCore {
        inner: Arc<InMemoryCore>,
    }

    #[async_trait]
    impl NativeCore for StuckCore {
        async fn create(&self, kind: HandleKind, options: String) -> Result<InstanceId, String> {
            self.inner.create(kind, options).await
        }

        async fn derive(&self, parent: InstanceId, kind: HandleKind) -> Result<InstanceId, String> {
            self.inner.derive(parent, kind).await
        }

        async fn call(&self, instance: InstanceId, method: String) -> String {
            self.inner.call(instance, method).await
        }

        async fn call_utils(&self, method: String) -> String {
            self.inner.call_utils(method).await
        }

        async fn listen(
            &self,
            instance: InstanceId,
            event_types: Vec<EventType>,
            sink: PushSink,
        ) -> Result<(), String> {
            self.inner.listen(instance, event_types, sink).await
        }

        async fn clear_listeners(
            &self,
            instance: InstanceId,
            event_types: Vec<EventType>,
        ) -> Result<(), String> {
            self.inner.clear_listeners(instance, event_types).await
        }

        async fn destroy(&self, _instance: InstanceId) -> Result<(), String> {
            Err("storage is locked".to_string())
        }
    }

    #[tokio::test]
    async fn test_destroyed_handle_never_reaches_core() {
        let (bridge, core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;

        bridge.destroy(&wallet).await.unwrap();
        assert!(!bridge.is_valid(&wallet));
        assert_eq!(core.object_count(), 0);

        let err = bridge
            .call(&wallet, &WalletMethod::GetAccounts)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::domain(DomainErrorKind::Wallet, "wallet got destroyed")
        );

        // Second destroy is a no-op.
        bridge.destroy(&wallet).await.unwrap();
        assert_eq!(bridge.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_non_object_options() {
        let (bridge, _core) = bridge();
        let err = bridge
            .create(HandleKind::Client, &json!(["nodes"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(DomainErrorKind::Client));
        assert_eq!(bridge.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_derived_client_shares_wallet_lifetime() -> anyhow::Result<()> {
        let (bridge, core) = bridge();
        let wallet = bridge
            .create_wallet(&json!({ "clientOptions": { "networkName": "shimmer" } }))
            .await?;
        let client = bridge.get_client(&wallet).await?;
        assert!(client.is_derived());

        let network = bridge.call(&client, &ClientMethod::GetNetworkId).await?;
        assert_eq!(network, json!("shimmer"));

        bridge.destroy(&wallet).await?;
        assert!(!client.is_valid());
        let err = bridge
            .call(&client, &ClientMethod::GetNetworkId)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(DomainErrorKind::Wallet));

        // Destroying the orphan touches nothing native.
        bridge.destroy(&client).await?;
        assert_eq!(core.object_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_destroying_derived_handle_keeps_wallet() -> anyhow::Result<()> {
        let (bridge, core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let secrets = bridge.get_secret_manager(&wallet).await?;
        assert_eq!(core.object_count(), 2);

        bridge.destroy(&secrets).await?;
        assert!(bridge.is_valid(&wallet));
        assert_eq!(core.object_count(), 1);

        let accounts = bridge.call(&wallet, &WalletMethod::GetAccountIndexes).await?;
        assert_eq!(accounts, json!([0]));
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_handle_is_released() {
        let (bridge, core) = bridge();
        let client = bridge.create_client(&json!({})).await.unwrap();
        assert_eq!(core.object_count(), 1);

        drop(client);
        assert!(eventually(|| core.object_count() == 0).await);
        assert!(eventually(|| bridge.live_handles() == 0).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_and_destroy() {
        let (bridge, core) = bridge();
        let wallet = Arc::new(wallet_with_accounts(&bridge, 1).await);

        let mut calls = Vec::new();
        for _ in 0..32 {
            let bridge = bridge.clone();
            let wallet = Arc::clone(&wallet);
            calls.push(tokio::spawn(async move {
                bridge.call(&wallet, &WalletMethod::GetAccounts).await
            }));
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
        bridge.destroy(&wallet).await.unwrap();

        for call in calls {
            match call.await.unwrap() {
                Ok(accounts) => assert_eq!(accounts[0]["index"], json!(0)),
                Err(err) => assert_eq!(
                    err,
                    BridgeError::domain(DomainErrorKind::Wallet, "wallet got destroyed")
                ),
            }
        }
        assert_eq!(core.object_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_destroy_keeps_handle_and_ends_streams() -> anyhow::Result<()> {
        let inner = Arc::new(InMemoryCore::new());
        let bridge = Bridge::new(Arc::new(StuckCore { inner: Arc::clone(&inner) }));
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let mut events = bridge.subscribe(&wallet, vec![]).await?;

        let err = bridge.destroy(&wallet).await.unwrap_err();
        assert_eq!(
            err,
            BridgeError::domain(DomainErrorKind::Wallet, "storage is locked")
        );

        // Still usable, so the caller may retry.
        assert!(bridge.is_valid(&wallet));
        let accounts = bridge.call(&wallet, &WalletMethod::GetAccountIndexes).await?;
        assert_eq!(accounts, json!([0]));

        // Native listeners are gone, so the stream ends rather than going quiet.
        assert_eq!(inner.listener_count(wallet.instance()), 0);
        assert_eq!(timeout(WAIT, events.recv()).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_destroying_derived_client_releases_its_listeners() -> anyhow::Result<()> {
        let (bridge, core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let observer = bridge.get_client(&wallet).await?;

        for _ in 0..3 {
            let client = bridge.get_client(&wallet).await?;
            let mut topics = bridge.subscribe(&client, vec![EventType::from("#")]).await?;
            assert_eq!(core.listener_count(observer.instance()), 1);

            bridge.destroy(&client).await?;
            assert_eq!(timeout(WAIT, topics.recv()).await?, None);
        }

        assert_eq!(core.listener_count(observer.instance()), 0);
        assert!(bridge.is_valid(&wallet));
        Ok(())
    }
}
