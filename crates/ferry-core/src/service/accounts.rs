//! Account Multiplexer
//!
//! One wallet handle fronts many accounts. An account call is the inner
//! method wrapped as
//!
//! ```json
//! { "name": "callAccountMethod", "data": { "accountId": 0, "method": { ... } } }
//! ```
//!
//! and dispatched against the wallet. No handle is allocated per account.

use ferry_types::{
    AccountId, AccountMethodCall, CodecError, HandleKind, MethodEnvelope, CALL_ACCOUNT_METHOD,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::Handle;
use crate::error::BridgeError;
use crate::service::dispatcher::{decode_payload, dispatch};
use crate::service::registry::HandleRegistry;

/// Wraps `inner` for `account_id` and dispatches it on `wallet`.
///
/// Non-wallet handles are rejected before anything crosses the boundary.
pub async fn dispatch_account_method(
    registry: &HandleRegistry,
    wallet: &Handle,
    account_id: AccountId,
    inner: MethodEnvelope,
) -> Result<Value, BridgeError> {
    dispatch(registry, wallet, wrap(wallet, account_id, inner)?).await
}

fn wrap(
    wallet: &Handle,
    account_id: AccountId,
    inner: MethodEnvelope,
) -> Result<MethodEnvelope, BridgeError> {
    if wallet.kind() != HandleKind::Wallet {
        return Err(BridgeError::domain(
            HandleKind::Wallet.error_kind(),
            format!("account methods need a wallet handle, got {}", wallet.kind()),
        ));
    }
    let call = AccountMethodCall {
        account_id,
        method: inner.into_value(),
    };
    let data = serde_json::to_value(call).map_err(|e| CodecError::Encode {
        method: CALL_ACCOUNT_METHOD.to_string(),
        reason: e.to_string(),
    })?;
    Ok(MethodEnvelope::new(CALL_ACCOUNT_METHOD).with_data(data))
}

/// One account of a wallet, addressed by id.
pub struct Account<'a> {
    registry: &'a HandleRegistry,
    wallet: &'a Handle,
    id: AccountId,
}

impl<'a> Account<'a> {
    pub(crate) fn new(registry: &'a HandleRegistry, wallet: &'a Handle, id: AccountId) -> Self {
        Self {
            registry,
            wallet,
            id,
        }
    }

    #[must_use]
    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub async fn dispatch(&self, method: MethodEnvelope) -> Result<Value, BridgeError> {
        dispatch_account_method(self.registry, self.wallet, self.id.clone(), method).await
    }

    pub async fn call<M: Serialize>(&self, method: &M) -> Result<Value, BridgeError> {
        self.dispatch(MethodEnvelope::from_typed(method)?).await
    }

    pub async fn call_as<M: Serialize, R: DeserializeOwned>(
        &self,
        method: &M,
    ) -> Result<R, BridgeError> {
        decode_payload(self.call(method).await?)
    }
}
