//! # Multi-Instance Federation Scenarios
//!
//! Two pipeline instances, each owning part of the key space, queried
//! through one instance's federation client. Per-instance failures must
//! degrade to partial results, never batch failures.

#[cfg(test)]
mod tests {
    use payrail_pipeline::AccountLedgerStage;
    use payrail_query::InstanceInfo;
    use payrail_runtime::{PipelineRuntime, RuntimeConfig};
    use rust_decimal::Decimal;
    use shared_types::Payment;
    use std::time::Duration;
    use tokio::time::timeout;

    fn config(instance_id: &str, peers: Vec<InstanceInfo>) -> RuntimeConfig {
        RuntimeConfig {
            instance_id: instance_id.to_string(),
            query_listen_addr: "127.0.0.1:0".to_string(),
            peers,
            ..RuntimeConfig::default()
        }
    }

    fn now_ms() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_millis() as i64
    }

    /// Settle one payment on a runtime: wait for its confirmation and for
    /// the ledger (which runs concurrently) to post both legs.
    async fn settle(runtime: &PipelineRuntime, txn: &str, from: &str, to: &str, amount: i64) {
        let mut confirmed = runtime.bus().subscribe("payments.confirmed");
        let payment = Payment::incoming(
            txn,
            format!("rec-{txn}"),
            from,
            to,
            Decimal::from(amount),
            now_ms(),
        );
        runtime.submit(&payment).await.expect("submit");
        timeout(Duration::from_secs(2), confirmed.recv())
            .await
            .expect("confirmation");

        let balances = runtime.balance_store();
        for _ in 0..200 {
            if balances.get(from).is_some() && balances.get(to).is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("legs for {txn} never reached the ledger");
    }

    #[tokio::test]
    async fn test_key_set_unions_across_instances() {
        // Instance B runs alone; A lists B as a peer.
        let mut b = PipelineRuntime::new(config("b", vec![]));
        b.start().await.unwrap();
        settle(&b, "txn-b", "carol", "dave", 5).await;

        let b_peer = InstanceInfo::new("b", b.query_addr().unwrap().to_string());
        let mut a = PipelineRuntime::new(config("a", vec![b_peer]));
        a.start().await.unwrap();
        settle(&a, "txn-a", "neil", "john", 10).await;

        let client = a.client_for(AccountLedgerStage::STORE_NAME);
        let key_set = client.key_set().await.unwrap();
        assert!(key_set.is_complete());
        assert_eq!(
            key_set.keys,
            ["carol", "dave", "john", "neil"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        );

        // size() == |key_set()| with disjoint account populations.
        let size = client.size().await.unwrap();
        assert!(size.is_complete());
        assert_eq!(size.count, key_set.keys.len() as u64);

        a.shutdown().await;
        b.shutdown().await;
    }

    #[tokio::test]
    async fn test_down_peer_degrades_not_fails() {
        // A's peer is a dead address: nothing listens there.
        let dead_peer = InstanceInfo::new("b", "127.0.0.1:1".to_string());
        let mut a = PipelineRuntime::new(config("a", vec![dead_peer]));
        a.start().await.unwrap();
        settle(&a, "txn-a", "neil", "john", 10).await;

        let client = a.client_for(AccountLedgerStage::STORE_NAME);

        let key_set = client.key_set().await.unwrap();
        assert!(!key_set.is_complete());
        assert_eq!(key_set.unavailable_instances, vec!["b".to_string()]);
        // The local contribution still arrives.
        assert!(key_set.keys.contains("neil"));
        assert!(key_set.keys.contains("john"));

        let size = client.size().await.unwrap();
        assert!(!size.is_complete());
        assert_eq!(size.count, 2);

        // A batch get over local and dead-owned keys returns per-key
        // statuses; keys owned by the dead peer degrade individually.
        let batch = client
            .get(&["neil".to_string(), "john".to_string()])
            .await
            .unwrap();
        assert_eq!(batch.rows.len(), 2);

        a.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_batch_get() {
        let mut a = PipelineRuntime::new(config("a", vec![]));
        a.start().await.unwrap();

        let client = a.client_for(AccountLedgerStage::STORE_NAME);
        let batch = client.get(&[]).await.unwrap();
        assert!(batch.rows.is_empty());
        assert!(batch.is_complete());

        a.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_store_is_distinguishable_not_found() {
        let mut a = PipelineRuntime::new(config("a", vec![]));
        a.start().await.unwrap();
        let addr = a.query_addr().unwrap();

        let response = reqwest::get(format!("http://{addr}/stores/no-such-store/count"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

        // A known store on the same endpoint answers normally.
        let response = reqwest::get(format!(
            "http://{addr}/stores/{}/count",
            AccountLedgerStage::STORE_NAME
        ))
        .await
        .unwrap();
        assert!(response.status().is_success());

        a.shutdown().await;
    }

    #[tokio::test]
    async fn test_stopped_client_reports_stopped() {
        let mut a = PipelineRuntime::new(config("a", vec![]));
        a.start().await.unwrap();

        let mut client = a.client_for(AccountLedgerStage::STORE_NAME);
        client.stop();
        assert!(client.get(&["neil".to_string()]).await.is_err());

        a.shutdown().await;
    }
}
