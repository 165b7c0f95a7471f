//! # End-to-End Pipeline Flows
//!
//! A payment submitted to the incoming channel must flow through all three
//! stages - split into legs, posted to balances, aggregated and confirmed -
//! with the stores of every stage agreeing on the outcome.

#[cfg(test)]
mod tests {
    use payrail_pipeline::{AccountLedgerStage, ConfirmationStage, InflightMatchingStage};
    use payrail_runtime::{PipelineRuntime, RuntimeConfig};
    use rust_decimal::Decimal;
    use shared_bus::Subscription;
    use shared_types::{BincodeCodec, Payment, PaymentCodec, PaymentState};
    use std::time::Duration;
    use tokio::time::timeout;

    fn test_config() -> RuntimeConfig {
        RuntimeConfig {
            query_listen_addr: "127.0.0.1:0".to_string(),
            ..RuntimeConfig::default()
        }
    }

    async fn running_runtime() -> PipelineRuntime {
        let mut runtime = PipelineRuntime::new(test_config());
        runtime.start().await.expect("runtime starts");
        runtime
    }

    fn now_ms() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_millis() as i64
    }

    async fn recv_payment(subscription: &mut Subscription) -> Payment {
        let record = timeout(Duration::from_secs(2), subscription.recv())
            .await
            .expect("timed out waiting for record");
        BincodeCodec
            .deserialize(&record.value)
            .expect("payment decodes")
    }

    /// The ledger stage runs concurrently with the confirmation path, so
    /// store assertions poll until the condition holds.
    async fn eventually(what: &str, check: impl Fn() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition never held: {what}");
    }

    fn balance_of(runtime: &PipelineRuntime, account: &str) -> Option<Decimal> {
        runtime.balance_store().get(account).map(|b| b.balance)
    }

    #[tokio::test]
    async fn test_single_payment_settles_end_to_end() {
        let mut runtime = running_runtime().await;
        let mut confirmed = runtime.bus().subscribe("payments.confirmed");

        let payment =
            Payment::incoming("tnxId", "record1", "neil", "john", Decimal::from(10), now_ms());
        runtime.submit(&payment).await.unwrap();

        // One confirmed event, echoing the payment.
        let echo = recv_payment(&mut confirmed).await;
        assert_eq!(echo.state, PaymentState::Confirmed);
        assert_eq!(echo.transaction_id, "tnxId");
        assert_eq!(echo.amount, Decimal::from(10));

        // Ledger: neil == -10, john == 10.
        eventually("both legs posted", || {
            balance_of(&runtime, "neil") == Some(Decimal::from(-10))
                && balance_of(&runtime, "john") == Some(Decimal::from(10))
        })
        .await;
        assert_eq!(runtime.balance_store().len(), 2);

        // Matching store: both legs observed, net back to zero.
        let entries = runtime.inflight_store().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.key, "tnxId");
        assert_eq!(entries[0].1.count, 2);
        assert_eq!(entries[0].1.net_amount, Decimal::ZERO);

        // Confirmation store: one window carrying the full amount.
        let stats = runtime.confirmed_store().entries();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].1.amount, Decimal::from(10));
        assert_eq!(stats[0].1.count, 1);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_ten_payments_from_distinct_senders() {
        let mut runtime = running_runtime().await;
        let mut confirmed = runtime.bus().subscribe("payments.confirmed");
        let base = now_ms();

        for i in 0..10 {
            let payment = Payment::incoming(
                format!("txn-{i}"),
                format!("id-{i}"),
                format!("frank-{i}"),
                "neil",
                Decimal::from(100),
                base,
            );
            runtime.submit(&payment).await.unwrap();
        }

        for _ in 0..10 {
            let echo = recv_payment(&mut confirmed).await;
            assert_eq!(echo.state, PaymentState::Confirmed);
        }

        // neil received all ten credits; ten debited senders plus neil; the
        // ledger is zero-sum over a closed set of transactions.
        eventually("all twenty legs posted", || {
            let balances = runtime.balance_store();
            let total: Decimal = balances.entries().iter().map(|(_, b)| b.balance).sum();
            balances.len() == 11
                && balance_of(&runtime, "neil") == Some(Decimal::from(1_000))
                && total == Decimal::ZERO
        })
        .await;

        // Confirmation windows sum to the full settled volume.
        let stats = runtime.confirmed_store().entries();
        let confirmed_total: Decimal = stats.iter().map(|(_, s)| s.amount).sum();
        let confirmed_count: u64 = stats.iter().map(|(_, s)| s.count).sum();
        assert_eq!(confirmed_total, Decimal::from(1_000));
        assert_eq!(confirmed_count, 10);

        // No open legs remain anywhere.
        for (_, stats) in runtime.inflight_store().entries() {
            assert_eq!(stats.net_amount, Decimal::ZERO);
            assert!(stats.is_matched());
        }

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_duplicate_submission_confirms_once() {
        let mut runtime = running_runtime().await;
        let mut confirmed = runtime.bus().subscribe("payments.confirmed");

        let payment =
            Payment::incoming("txn-dup", "rec-dup", "neil", "john", Decimal::from(10), now_ms());
        runtime.submit(&payment).await.unwrap();
        runtime.submit(&payment).await.unwrap();

        let echo = recv_payment(&mut confirmed).await;
        assert_eq!(echo.state, PaymentState::Confirmed);
        // A second confirmation must never arrive.
        assert!(
            timeout(Duration::from_millis(300), confirmed.recv())
                .await
                .is_err()
        );

        // Balances moved exactly once; a double-post would show as -20/20.
        eventually("legs posted once", || {
            balance_of(&runtime, "neil") == Some(Decimal::from(-10))
                && balance_of(&runtime, "john") == Some(Decimal::from(10))
        })
        .await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_payment_never_reaches_ledger() {
        let mut runtime = running_runtime().await;

        let bad = Payment::incoming("txn-bad", "rec-bad", "neil", "", Decimal::from(10), now_ms());
        runtime.submit(&bad).await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(runtime.balance_store().is_empty());
        assert!(runtime.inflight_store().is_empty());

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_pause_holds_position_resume_continues() {
        let mut runtime = running_runtime().await;
        let mut confirmed = runtime.bus().subscribe("payments.confirmed");
        let control = runtime.pause_control();

        control.pause();
        let payment =
            Payment::incoming("txn-p", "rec-p", "neil", "john", Decimal::from(7), now_ms());
        runtime.submit(&payment).await.unwrap();

        // Paused stages do not consume.
        assert!(
            timeout(Duration::from_millis(300), confirmed.recv())
                .await
                .is_err()
        );
        assert!(runtime.balance_store().is_empty());

        // Resume continues from the held position; nothing was lost.
        control.resume();
        let echo = recv_payment(&mut confirmed).await;
        assert_eq!(echo.transaction_id, "txn-p");
        assert_eq!(echo.state, PaymentState::Confirmed);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_federated_queries_over_local_stores() {
        let mut runtime = running_runtime().await;
        let mut confirmed = runtime.bus().subscribe("payments.confirmed");

        let payment =
            Payment::incoming("txn-q", "rec-q", "neil", "john", Decimal::from(10), now_ms());
        runtime.submit(&payment).await.unwrap();
        recv_payment(&mut confirmed).await;
        eventually("both legs posted", || runtime.balance_store().len() == 2).await;

        // Account store: keys, point get, size all agree with the ledger.
        let accounts = runtime.client_for(AccountLedgerStage::STORE_NAME);
        let key_set = accounts.key_set().await.unwrap();
        assert!(key_set.is_complete());
        assert_eq!(
            key_set.keys,
            ["john", "neil"].iter().map(|s| s.to_string()).collect()
        );

        let keys: Vec<String> = key_set.keys.iter().cloned().collect();
        let batch = accounts.get(&keys).await.unwrap();
        assert!(batch.is_complete());
        let neil = batch.value_of("neil").expect("neil resolves");
        assert_eq!(neil["balance"], serde_json::json!("-10"));

        let size = accounts.size().await.unwrap();
        assert_eq!(size.count, key_set.keys.len() as u64);

        // Windowed stores federate through composite keys.
        let inflight = runtime.client_for(InflightMatchingStage::STORE_NAME);
        assert_eq!(inflight.size().await.unwrap().count, 1);

        let confirmed_client = runtime.client_for(ConfirmationStage::STORE_NAME);
        let confirmed_keys = confirmed_client.key_set().await.unwrap();
        assert_eq!(confirmed_keys.keys.len(), 1);
        let composite: Vec<String> = confirmed_keys.keys.iter().cloned().collect();
        let stats = confirmed_client.get(&composite).await.unwrap();
        assert!(stats.is_complete());
        let value = stats.value_of(&composite[0]).expect("window resolves");
        assert_eq!(value["amount"], serde_json::json!("10"));

        runtime.shutdown().await;
    }
}
