//! # Method Catalogues
//!
//! Closed tagged unions (`name` tag, `data` content) that convert into a
//! `MethodEnvelope` via `MethodEnvelope::from_typed`. Only the operations the
//! reference backend understands are listed; the full domain catalogue lives
//! with the native core.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::serde_as;

use crate::account::AccountId;
use crate::envelope::redact;
use crate::numeric::U256Hex;
use crate::U256;

/// `Debug` renders the redacted wire form, like `MethodEnvelope`.
macro_rules! redacted_debug {
    ($($ty:ident),+) => {$(
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match serde_json::to_value(self) {
                    Ok(value) => write!(f, "{}({})", stringify!($ty), redact(&value)),
                    Err(_) => f.write_str(stringify!($ty)),
                }
            }
        }
    )+};
}

redacted_debug!(WalletMethod, SecretManagerMethod, UtilsMethod);

/// Methods on a wallet handle.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "name",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum WalletMethod {
    CreateAccount {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    GetAccount {
        account_id: AccountId,
    },
    GetAccounts,
    GetAccountIndexes,
    CallAccountMethod {
        account_id: AccountId,
        method: AccountMethod,
    },
    SetStrongholdPassword {
        password: String,
    },
    /// Pushes `event` to the wallet's listeners as if it came from the ledger.
    EmitTestEvent {
        event: Value,
    },
}

/// Methods scoped to one account of a wallet.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "name",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum AccountMethod {
    GetBalance,
    SyncAccount,
    Addresses,
    GenerateEd25519Addresses {
        amount: u32,
    },
    SetAlias {
        alias: String,
    },
    MintNativeToken {
        token_id: String,
        #[serde_as(as = "U256Hex")]
        amount: U256,
    },
}

/// Methods on a client handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "camelCase")]
pub enum ClientMethod {
    GetInfo,
    GetNetworkId,
}

/// Methods on a secret manager handle.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "name",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum SecretManagerMethod {
    GenerateEd25519Addresses { account_index: u32, amount: u32 },
    StoreMnemonic { mnemonic: String },
}

/// Stateless utility methods, dispatched without a handle.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "camelCase")]
pub enum UtilsMethod {
    GenerateMnemonic,
    VerifyMnemonic { mnemonic: String },
}
