//! # Account Multiplexing
//!
//! Calls scoped to one account never touch another.

#[cfg(test)]
mod tests {
    use ferry_core::{AccountId, BridgeApi, DomainErrorKind};
    use ferry_types::{
        AccountBalance, AccountInfo, AccountMethod, MethodEnvelope, WalletMethod, U256,
    };
    use serde_json::json;

    use crate::integration::fixtures::{bridge, wallet_with_accounts};

    #[tokio::test]
    async fn test_accounts_are_isolated() -> anyhow::Result<()> {
        let (bridge, _core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 2).await;

        bridge
            .account(&wallet, 0u32)
            .call(&AccountMethod::MintNativeToken {
                token_id: "0x01".into(),
                amount: U256::from(500u32),
            })
            .await?;
        let addresses: Vec<String> = bridge
            .account(&wallet, 1u32)
            .call_as(&AccountMethod::GenerateEd25519Addresses { amount: 3 })
            .await?;
        assert_eq!(addresses.len(), 3);

        let first: AccountBalance =
            bridge.account(&wallet, 0u32).call_as(&AccountMethod::GetBalance).await?;
        let second: AccountBalance =
            bridge.account(&wallet, 1u32).call_as(&AccountMethod::GetBalance).await?;
        assert_eq!(first.native_tokens.get("0x01"), Some(&U256::from(500u32)));
        assert!(second.native_tokens.is_empty());

        let first_addresses: Vec<String> = bridge
            .account(&wallet, 0u32)
            .call_as(&AccountMethod::Addresses)
            .await?;
        assert!(first_addresses.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_account_addressed_by_alias() -> anyhow::Result<()> {
        let (bridge, _core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let created: AccountInfo = bridge
            .call_as(&wallet, &WalletMethod::CreateAccount { alias: Some("savings".into()) })
            .await?;
        assert_eq!(created.index, 1);

        bridge
            .account(&wallet, "savings")
            .call(&AccountMethod::SetAlias { alias: "vault".into() })
            .await?;
        let renamed: AccountInfo = bridge
            .call_as(&wallet, &WalletMethod::GetAccount { account_id: AccountId::Index(1) })
            .await?;
        assert_eq!(renamed.alias, "vault");

        let err = bridge
            .account(&wallet, "savings")
            .call(&AccountMethod::GetBalance)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(DomainErrorKind::Wallet));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_alias_rejected() {
        let (bridge, _core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 0).await;
        let create = WalletMethod::CreateAccount { alias: Some("main".into()) };
        bridge.call(&wallet, &create).await.unwrap();

        let err = bridge.call(&wallet, &create).await.unwrap_err();
        assert_eq!(err.kind(), Some(DomainErrorKind::Wallet));
        let indexes = bridge.call(&wallet, &WalletMethod::GetAccountIndexes).await.unwrap();
        assert_eq!(indexes, json!([0]));
    }

    #[tokio::test]
    async fn test_raw_account_dispatch() {
        let (bridge, _core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let balance = bridge
            .dispatch_account_method(
                &wallet,
                AccountId::Index(0),
                MethodEnvelope::new("syncAccount"),
            )
            .await
            .unwrap();
        assert_eq!(balance["baseCoin"], json!({ "total": "0", "available": "0" }));
    }

    #[tokio::test]
    async fn test_account_call_on_client_is_rejected() {
        let (bridge, core) = bridge();
        let client = bridge.create_client(&json!({})).await.unwrap();
        let err = bridge
            .account(&client, 0u32)
            .call(&AccountMethod::GetBalance)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(DomainErrorKind::Wallet));
        assert_eq!(core.object_count(), 1);
    }
}
