//! # Dispatch Outcomes
//!
//! Every native answer resolves to exactly one caller-side result.

#[cfg(test)]
mod tests {
    use ferry_core::{BridgeApi, BridgeError, DomainErrorKind, TRIGGER_PANIC};
    use ferry_types::{
        AccountBalance, AccountId, AccountMethod, ClientMethod, MethodEnvelope, UtilsMethod,
        WalletMethod, U256,
    };
    use serde_json::{json, Value};

    use crate::integration::fixtures::{bridge, wallet_with_accounts};

    #[tokio::test]
    async fn test_panic_does_not_poison_handle() {
        let (bridge, _core) = bridge();
        let client = bridge.create_client(&json!({})).await.unwrap();

        let fault =
            MethodEnvelope::new(TRIGGER_PANIC).with_data(json!({ "message": "native fault" }));
        let err = bridge.dispatch(&client, fault).await.unwrap_err();
        assert_eq!(err, BridgeError::Panic("Internal error: native fault".into()));

        let info = bridge.call(&client, &ClientMethod::GetInfo).await.unwrap();
        assert_eq!(info["url"], json!("http://localhost:14265"));
        assert!(bridge.is_valid(&client));
    }

    #[tokio::test]
    async fn test_domain_error_carries_kind_and_message() {
        let (bridge, _core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;

        let err = bridge
            .call(&wallet, &WalletMethod::GetAccount { account_id: AccountId::Index(7) })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::domain(DomainErrorKind::Wallet, "account #7 not found")
        );
    }

    #[tokio::test]
    async fn test_unknown_method_is_json_error() {
        let (bridge, _core) = bridge();
        let client = bridge.create_client(&json!({})).await.unwrap();
        let err = bridge
            .dispatch(&client, MethodEnvelope::new("getTips"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(DomainErrorKind::Json));
    }

    #[tokio::test]
    async fn test_utils_need_no_handle() -> anyhow::Result<()> {
        let (bridge, _core) = bridge();
        let mnemonic: String = serde_json::from_value(
            bridge.call_utils(&UtilsMethod::GenerateMnemonic).await?,
        )?;
        assert_eq!(mnemonic.split_whitespace().count(), 24);

        let verified = bridge
            .call_utils(&UtilsMethod::VerifyMnemonic { mnemonic })
            .await?;
        assert_eq!(verified, Value::Null);

        let err = bridge
            .call_utils(&UtilsMethod::VerifyMnemonic { mnemonic: "one two".into() })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(DomainErrorKind::Utils));
        Ok(())
    }

    #[tokio::test]
    async fn test_amounts_survive_the_boundary_exactly() -> anyhow::Result<()> {
        let (bridge, _core) = bridge();
        let wallet = bridge
            .create_wallet(&json!({ "initialBaseCoin": u64::MAX.to_string() }))
            .await?;
        bridge
            .call(&wallet, &WalletMethod::CreateAccount { alias: None })
            .await?;

        let huge = U256::MAX - U256::from(1u8);
        let account = bridge.account(&wallet, 0u32);
        account
            .call(&AccountMethod::MintNativeToken { token_id: "0x08ab".into(), amount: huge })
            .await?;

        let balance: AccountBalance = account.call_as(&AccountMethod::GetBalance).await?;
        assert_eq!(balance.base_coin.total, u64::MAX);
        assert_eq!(balance.native_tokens.get("0x08ab"), Some(&huge));

        // Overflow is a domain error, the held amount is unchanged.
        let err = account
            .call(&AccountMethod::MintNativeToken {
                token_id: "0x08ab".into(),
                amount: U256::from(2u8),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(DomainErrorKind::Wallet));
        let balance: AccountBalance = account.call_as(&AccountMethod::GetBalance).await?;
        assert_eq!(balance.native_tokens.get("0x08ab"), Some(&huge));
        Ok(())
    }

    #[tokio::test]
    async fn test_secret_manager_requires_mnemonic() -> anyhow::Result<()> {
        let (bridge, _core) = bridge();
        let secrets = bridge.create_secret_manager(&json!({})).await?;
        let generate = ferry_types::SecretManagerMethod::GenerateEd25519Addresses {
            account_index: 0,
            amount: 2,
        };

        let err = bridge.call(&secrets, &generate).await.unwrap_err();
        assert_eq!(err.kind(), Some(DomainErrorKind::SecretManager));

        let mnemonic = bridge.call_utils(&UtilsMethod::GenerateMnemonic).await?;
        let mnemonic = mnemonic.as_str().unwrap_or_default().to_string();
        bridge
            .call(&secrets, &ferry_types::SecretManagerMethod::StoreMnemonic { mnemonic })
            .await?;
        let addresses: Vec<String> = bridge.call_as(&secrets, &generate).await?;
        assert_eq!(addresses.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_outcomes_are_counted() -> anyhow::Result<()> {
        ferry_telemetry::register_metrics()?;
        let counter =
            ferry_telemetry::DISPATCH_TOTAL.with_label_values(&["secretManager", "panic"]);
        let before = counter.get();

        let (bridge, _core) = bridge();
        let secrets = bridge.create_secret_manager(&json!({})).await?;
        let err = bridge
            .dispatch(&secrets, MethodEnvelope::new(TRIGGER_PANIC))
            .await
            .unwrap_err();
        assert!(err.is_panic());

        assert!(counter.get() >= before + 1.0);
        assert!(ferry_telemetry::gather_text()?.contains("ferry_dispatch_calls_total"));
        Ok(())
    }
}
