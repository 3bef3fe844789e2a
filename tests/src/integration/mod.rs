//! Integration scenarios.

pub mod accounts;
pub mod dispatch;
pub mod events;
pub mod lifecycle;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;
    use std::time::Duration;

    use ferry_core::{Bridge, Handle, InMemoryCore};
    use ferry_types::WalletMethod;
    use serde_json::json;

    pub const WAIT: Duration = Duration::from_secs(2);

    /// Bridge over a fresh in-memory core; the core is returned for
    /// test-side pushes.
    pub fn bridge() -> (Bridge, Arc<InMemoryCore>) {
        let core = Arc::new(InMemoryCore::new());
        (Bridge::new(core.clone()), core)
    }

    /// Wallet with `accounts` accounts created in order.
    pub async fn wallet_with_accounts(bridge: &Bridge, accounts: usize) -> Handle {
        let wallet = bridge.create_wallet(&json!({})).await.unwrap();
        for _ in 0..accounts {
            bridge
                .call(&wallet, &WalletMethod::CreateAccount { alias: None })
                .await
                .unwrap();
        }
        wallet
    }

    /// Polls `check` until it holds or `WAIT` elapses.
    pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        tokio::time::timeout(WAIT, async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }
}
