use chrono::Utc;
use orchestrator_result_store::{NewTestRun, RunFilter, Store};
use orchestrator_types::{ErrorCategory, RunId, RunMode, TestResult, TestType, Totals, Wei};

fn sample_result(run_id: RunId) -> TestResult {
    TestResult {
        run_id,
        network_id: "sepolia".into(),
        test_type: TestType::Evm,
        test_name: "ecrecover".into(),
        success: true,
        start: Utc::now(),
        end: Utc::now(),
        duration_ms: 12,
        gas_used: Wei(21_000),
        gas_price: Wei::from_gwei(2),
        tx_hash: Some("0xabc".into()),
        block_number: Some(100),
        error_message: None,
        error_category: None,
        cost_native: Wei(42_000),
        cost_usd_cents: 1,
        metadata: serde_json::json!({}),
    }
}

#[tokio::test]
async fn inserts_and_reads_back_a_run_with_results() {
    let store = Store::open_in_memory().unwrap();
    let run_id = RunId::new();
    store
        .insert_test_run(NewTestRun {
            run_id,
            mode: RunMode::Parallel,
            parallel: true,
            network_ids: vec!["sepolia".into()],
            test_types: vec![TestType::Evm],
            raw_config: serde_json::json!({"seed": 1}),
        })
        .await
        .unwrap();

    store.insert_test_result(sample_result(run_id)).await.unwrap();

    let mut totals = Totals::default();
    totals.add_result(&sample_result(run_id));
    store.update_test_run(run_id, Utc::now(), totals).await.unwrap();

    let runs = store.get_test_runs(RunFilter::default()).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, run_id);
    assert_eq!(runs[0].totals.tests, 1);

    let results = store.get_test_results(run_id, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].test_name, "ecrecover");
}

#[tokio::test]
async fn failed_result_carries_error_category() {
    let store = Store::open_in_memory().unwrap();
    let run_id = RunId::new();
    store
        .insert_test_run(NewTestRun {
            run_id,
            mode: RunMode::Sequential,
            parallel: false,
            network_ids: vec!["sepolia".into()],
            test_types: vec![TestType::Evm],
            raw_config: serde_json::json!({}),
        })
        .await
        .unwrap();

    let mut failed = sample_result(run_id);
    failed.success = false;
    failed.error_category = Some(ErrorCategory::Revert);
    failed.error_message = Some("execution reverted".into());
    store.insert_test_result(failed).await.unwrap();

    let results = store.get_test_results(run_id, None).await.unwrap();
    assert_eq!(results[0].error_category, Some(ErrorCategory::Revert));
}

#[tokio::test]
async fn purge_all_without_confirmation_is_rejected() {
    let store = Store::open_in_memory().unwrap();
    let result = store.purge_all(false).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn purge_all_with_confirmation_clears_every_table() {
    let store = Store::open_in_memory().unwrap();
    let run_id = RunId::new();
    store
        .insert_test_run(NewTestRun {
            run_id,
            mode: RunMode::Standard,
            parallel: false,
            network_ids: vec!["sepolia".into()],
            test_types: vec![TestType::Evm],
            raw_config: serde_json::json!({}),
        })
        .await
        .unwrap();
    store.purge_all(true).await.unwrap();
    let runs = store.get_test_runs(RunFilter::default()).await.unwrap();
    assert!(runs.is_empty());
}

#[tokio::test]
async fn unknown_run_id_resolves_to_an_error() {
    let store = Store::open_in_memory().unwrap();
    let result = store.get_test_results(RunId::new(), None).await;
    assert!(result.is_err());
}
