/// Concurrent access tests
///
/// Racing writers on one tenant and independent writers on separate tenants.
/// Run with: cargo test --test concurrent_access_tests
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Barrier;
use univera::core::payload_from_json;
use univera::{EngineConfig, EngineError, FieldDefinition, Platform, Principal, TenantId, UserId};

async fn platform_with_accounts(tenant: TenantId) -> Arc<Platform> {
    let platform = Platform::in_memory(EngineConfig::default());
    platform
        .schemas()
        .declare(
            tenant,
            "accounts",
            vec![FieldDefinition::string("email").required().unique()],
        )
        .await
        .unwrap();
    Arc::new(platform)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unique_race_has_one_winner() {
    let tenant = TenantId::new();
    let platform = platform_with_accounts(tenant).await;
    let num_tasks = 16;
    let barrier = Arc::new(Barrier::new(num_tasks));

    let mut handles = vec![];
    for _ in 0..num_tasks {
        let platform = Arc::clone(&platform);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            let user = Principal::new(tenant, UserId::new(), "user");
            let payload = payload_from_json(json!({"email": "same@example.com"})).unwrap();
            barrier.wait().await;
            platform.records().create(&user, "accounts", payload).await
        }));
    }

    let mut created = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(EngineError::Uniqueness(_)) => duplicates += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(duplicates, num_tasks - 1);

    let reader = Principal::new(tenant, UserId::new(), "user");
    assert_eq!(platform.records().list(&reader, "accounts").await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_values_all_land() {
    let tenant = TenantId::new();
    let platform = platform_with_accounts(tenant).await;
    let num_tasks = 8;
    let writes_per_task = 10;

    let mut handles = vec![];
    for task_id in 0..num_tasks {
        let platform = Arc::clone(&platform);
        handles.push(tokio::spawn(async move {
            let user = Principal::new(tenant, UserId::new(), "user");
            for i in 0..writes_per_task {
                let payload =
                    payload_from_json(json!({"email": format!("t{task_id}-{i}@example.com")})).unwrap();
                platform.records().create(&user, "accounts", payload).await.unwrap();
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let reader = Principal::new(tenant, UserId::new(), "user");
    let records = platform.records().list(&reader, "accounts").await.unwrap();
    assert_eq!(records.len(), num_tasks * writes_per_task);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tenants_write_independently() {
    let platform = Arc::new(Platform::in_memory(EngineConfig::default()));
    let tenants: Vec<TenantId> = (0..4).map(|_| TenantId::new()).collect();

    let mut handles = vec![];
    for tenant in tenants.clone() {
        let platform = Arc::clone(&platform);
        handles.push(tokio::spawn(async move {
            platform
                .schemas()
                .declare(tenant, "accounts", vec![FieldDefinition::string("email").unique()])
                .await
                .unwrap();
            let user = Principal::new(tenant, UserId::new(), "user");
            let payload = payload_from_json(json!({"email": "shared@example.com"})).unwrap();
            platform.records().create(&user, "accounts", payload).await.unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(platform.storage().tenants().await.len(), tenants.len());
}
