//! # Accounts
//!
//! Accounts are not native objects of their own. They are addressed as
//! `(wallet handle, AccountId)` and reached through the wallet's
//! `callAccountMethod`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, Same};

use crate::numeric::{PairList, TokenAmounts, U256Hex, U64String};

/// Account address inside a wallet: numeric index or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountId {
    Index(u32),
    Alias(String),
}

impl From<u32> for AccountId {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for AccountId {
    fn from(alias: &str) -> Self {
        Self::Alias(alias.to_string())
    }
}

impl From<String> for AccountId {
    fn from(alias: String) -> Self {
        Self::Alias(alias)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Alias(alias) => f.write_str(alias),
        }
    }
}

/// `data` of a `callAccountMethod` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMethodCall {
    pub account_id: AccountId,
    /// Inner `{name, data?}` envelope tree.
    pub method: Value,
}

/// Identity of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub index: u32,
    pub alias: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseCoinBalance {
    #[serde_as(as = "U64String")]
    pub total: u64,
    #[serde_as(as = "U64String")]
    pub available: u64,
}

/// Balance as reported by `getBalance`.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub base_coin: BaseCoinBalance,
    #[serde_as(as = "PairList<Same, U256Hex>")]
    #[serde(default)]
    pub native_tokens: TokenAmounts,
}
