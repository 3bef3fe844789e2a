//! # Event Bridge
//!
//! Listener registration, filtering, clearing and MQTT topic delivery.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ferry_core::{BridgeApi, BridgeEvent, EventCallback, EventError, EventType};
    use ferry_types::{AccountMethod, WalletMethod, U256};
    use parking_lot::Mutex;
    use serde_json::json;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use crate::integration::fixtures::{bridge, eventually, wallet_with_accounts, WAIT};

    fn collector() -> (EventCallback, Arc<Mutex<Vec<BridgeEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::clone(&seen);
        let callback: EventCallback = Arc::new(move |item: Result<BridgeEvent, EventError>| {
            if let Ok(event) = item {
                store.lock().push(event);
            }
        });
        (callback, seen)
    }

    fn emit(event_type: &str) -> WalletMethod {
        WalletMethod::EmitTestEvent {
            event: json!({ "type": event_type, "note": event_type }),
        }
    }

    #[tokio::test]
    async fn test_disjoint_listeners_each_get_their_type() {
        let (bridge, _core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let (outputs, seen_outputs) = collector();
        let (spent, seen_spent) = collector();
        bridge.listen(&wallet, vec![EventType::NewOutput], outputs).await.unwrap();
        bridge.listen(&wallet, vec![EventType::SpentOutput], spent).await.unwrap();

        bridge.call(&wallet, &emit("NewOutput")).await.unwrap();
        bridge.call(&wallet, &emit("SpentOutput")).await.unwrap();
        bridge.call(&wallet, &emit("NewOutput")).await.unwrap();

        assert!(
            eventually(|| seen_outputs.lock().len() == 2 && seen_spent.lock().len() == 1).await
        );
        assert!(seen_outputs
            .lock()
            .iter()
            .all(|event| event.event_type() == EventType::NewOutput));
        assert_eq!(seen_spent.lock()[0].event_type(), EventType::SpentOutput);
    }

    #[tokio::test]
    async fn test_clear_all_stops_every_listener() {
        let (bridge, core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let (callback, seen) = collector();
        bridge.listen(&wallet, vec![], callback).await.unwrap();
        let mut stream = bridge.subscribe(&wallet, vec![EventType::NewOutput]).await.unwrap();
        assert_eq!(core.listener_count(wallet.instance()), 2);

        bridge.clear_listeners(&wallet, vec![]).await.unwrap();
        assert_eq!(core.listener_count(wallet.instance()), 0);

        bridge.call(&wallet, &emit("NewOutput")).await.unwrap();
        assert_eq!(timeout(WAIT, stream.recv()).await.unwrap(), None);
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_clearing_one_type_narrows_all_type_listener() {
        let (bridge, _core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let mut stream = bridge.subscribe(&wallet, vec![]).await.unwrap();

        bridge
            .clear_listeners(&wallet, vec![EventType::SpentOutput])
            .await
            .unwrap();
        bridge.call(&wallet, &emit("SpentOutput")).await.unwrap();
        bridge.call(&wallet, &emit("TransactionInclusion")).await.unwrap();

        let event = timeout(WAIT, stream.recv()).await.unwrap().unwrap().unwrap();
        assert_eq!(event.event_type(), EventType::TransactionInclusion);
    }

    #[tokio::test]
    async fn test_account_events_carry_account_index() {
        let (bridge, _core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 2).await;
        let mut stream = bridge.subscribe(&wallet, vec![EventType::NewOutput]).await.unwrap();

        bridge
            .account(&wallet, 1u32)
            .call(&AccountMethod::MintNativeToken {
                token_id: "0x02".into(),
                amount: U256::from(9u8),
            })
            .await
            .unwrap();

        match timeout(WAIT, stream.recv()).await.unwrap() {
            Some(Ok(BridgeEvent::Wallet(event))) => {
                assert_eq!(event.account_index, 1);
                assert_eq!(event.payload["output"]["amount"], json!("0x9"));
            }
            other => panic!("unexpected delivery: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_push_is_skipped() {
        let (bridge, core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let mut stream = bridge.subscribe(&wallet, vec![]).await.unwrap();

        core.push_raw(wallet.instance(), Ok("{not json".into()));
        core.push_raw(wallet.instance(), Ok(json!({ "accountIndex": 0 }).to_string()));
        bridge.call(&wallet, &emit("SpentOutput")).await.unwrap();
        core.push_raw(wallet.instance(), Err("node connection lost".into()));

        let first = timeout(WAIT, stream.recv()).await.unwrap().unwrap();
        assert_eq!(first.unwrap().event_type(), EventType::SpentOutput);
        let second = timeout(WAIT, stream.recv()).await.unwrap().unwrap();
        assert_eq!(second, Err(EventError::Delivery("node connection lost".into())));
    }

    #[tokio::test]
    async fn test_numeric_event_codes_decode() {
        let (bridge, _core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let mut stream = bridge.subscribe(&wallet, vec![]).await.unwrap();

        bridge
            .call(&wallet, &WalletMethod::EmitTestEvent { event: json!({ "type": 2 }) })
            .await
            .unwrap();
        let event = timeout(WAIT, stream.recv()).await.unwrap().unwrap().unwrap();
        assert_eq!(event.event_type(), EventType::WALLET[2]);
    }

    #[tokio::test]
    async fn test_mqtt_payload_decoded_once() {
        let (bridge, core) = bridge();
        let client = bridge.create_client(&json!({})).await.unwrap();
        let mut stream = bridge
            .subscribe(&client, vec![EventType::from("milestones/+")])
            .await
            .unwrap();

        core.publish("blocks", &json!({ "id": "0x00" }));
        core.publish("milestones/confirmed", &json!({ "index": 42, "raw": "{\"a\":1}" }));

        let Some(Ok(BridgeEvent::Mqtt(message))) = stream.next().await else {
            panic!("no topic message");
        };
        assert_eq!(message.topic, "milestones/confirmed");
        assert_eq!(message.payload, json!({ "index": 42, "raw": "{\"a\":1}" }));
    }

    #[tokio::test]
    async fn test_client_listen_without_topics_fails() {
        let (bridge, _core) = bridge();
        let client = bridge.create_client(&json!({})).await.unwrap();
        let Err(err) = bridge.subscribe(&client, vec![]).await else {
            panic!("client listen without topics succeeded");
        };
        assert!(err.kind().is_some());
    }

    #[tokio::test]
    async fn test_destroy_ends_streams() {
        let (bridge, core) = bridge();
        let wallet = wallet_with_accounts(&bridge, 1).await;
        let client = bridge.get_client(&wallet).await.unwrap();
        let mut wallet_events = bridge.subscribe(&wallet, vec![]).await.unwrap();
        let mut topics = bridge.subscribe(&client, vec![EventType::from("#")]).await.unwrap();

        bridge.destroy(&wallet).await.unwrap();
        core.publish("milestones/latest", &json!({}));

        assert_eq!(timeout(WAIT, wallet_events.recv()).await.unwrap(), None);
        assert_eq!(timeout(WAIT, topics.recv()).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_listen_and_clear_stay_consistent() {
        let (bridge, _core) = bridge();
        let wallet = Arc::new(wallet_with_accounts(&bridge, 1).await);

        let mut subscribers = Vec::new();
        let mut clearers = Vec::new();
        for _ in 0..16 {
            let (bridge_a, wallet_a) = (bridge.clone(), Arc::clone(&wallet));
            subscribers.push(tokio::spawn(async move {
                bridge_a.subscribe(&wallet_a, vec![]).await
            }));
            let (bridge_b, wallet_b) = (bridge.clone(), Arc::clone(&wallet));
            clearers.push(tokio::spawn(async move {
                bridge_b.clear_listeners(&wallet_b, vec![]).await
            }));
        }
        for clearer in clearers {
            clearer.await.unwrap().unwrap();
        }
        let mut streams = Vec::new();
        for subscriber in subscribers {
            streams.push(subscriber.await.unwrap().unwrap());
        }

        bridge.call(&wallet, &emit("NewOutput")).await.unwrap();

        // Every stream was either cleared (ended) or still receives events.
        for stream in &mut streams {
            match timeout(WAIT, stream.recv()).await.expect("stream went silent") {
                None => {}
                Some(Ok(event)) => assert_eq!(event.event_type(), EventType::NewOutput),
                Some(Err(err)) => panic!("unexpected delivery error: {err}"),
            }
        }
    }
}
