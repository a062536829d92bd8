//! Integration tests for the match-pool matchmaking service
//!
//! These tests validate the entire system working together, including:
//! - Complete add -> recalculate -> statistics workflows
//! - Write-behind persistence and the flush barrier
//! - Store resynchronization before listing groups
//! - Concurrent request handling

// Modules for organizing tests
mod fixtures;

use match_pool::engine::MatchEngine;
use match_pool::metrics::MetricsCollector;
use match_pool::pool::GamerPool;
use match_pool::service::MatchmakingService;
use match_pool::storage::{GamerStore, InMemoryGamerStore};
use match_pool::types::GroupStatistics;
use std::collections::HashSet;
use std::sync::Arc;

use fixtures::{close_pair_with_outlier, gamer, RejectingStore};

/// Integration test setup for a memory-only service
fn create_test_service(group_size: usize) -> Arc<MatchmakingService> {
    let pool = Arc::new(GamerPool::new());
    let engine = Arc::new(MatchEngine::new(group_size));
    let metrics = Arc::new(MetricsCollector::new().unwrap());
    Arc::new(MatchmakingService::new(pool, engine, metrics))
}

/// Integration test setup for a service backed by an in-memory store
fn create_persistent_service(
    group_size: usize,
) -> (Arc<MatchmakingService>, Arc<InMemoryGamerStore>) {
    let pool = Arc::new(GamerPool::new());
    let engine = Arc::new(MatchEngine::new(group_size));
    let metrics = Arc::new(MetricsCollector::new().unwrap());
    let store = Arc::new(InMemoryGamerStore::new());
    let (service, _errors) =
        MatchmakingService::with_storage(pool, engine, metrics, store.clone(), 16);
    (Arc::new(service), store)
}

#[tokio::test]
async fn test_complete_matchmaking_workflow() {
    let service = create_test_service(2);

    // Three gamers: a close pair and an outlier.
    for record in close_pair_with_outlier() {
        service.add_gamer(record).await.unwrap();
    }
    assert_eq!(service.pool_size().unwrap(), 3);

    // One group of two forms; the outlier stays unassigned.
    let groups = service.list_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].number, 0);
    assert_eq!(groups[0].len(), 2);

    // Statistics for the formed group.
    let stats = service.group_stats(0).unwrap();
    assert_eq!(stats.group_number, 0);
    assert_eq!(stats.player_names, vec!["alice", "bob"]);
    assert_eq!(stats.min_skill, 10.0);
    assert_eq!(stats.max_skill, 12.0);
    assert_eq!(stats.avg_skill, 11.0);
    assert_eq!(stats.min_latency, 5.0);
    assert_eq!(stats.max_latency, 6.0);
    assert!(stats.min_wait_seconds >= 0.0);
    assert!(stats.max_wait_seconds >= stats.min_wait_seconds);

    // Only group 0 exists; index 1 yields the zeroed sentinel.
    assert_eq!(service.group_stats(1).unwrap(), GroupStatistics::default());
}

#[tokio::test]
async fn test_recalculation_replaces_previous_batch() {
    let service = create_test_service(2);

    for i in 0..6 {
        service
            .add_gamer(gamer(&format!("gamer-{}", i), i as f64, i as f64))
            .await
            .unwrap();
    }

    let first = service.list_groups().await.unwrap();
    assert_eq!(first.len(), 3);

    // Removing gamers and recalculating rebuilds from scratch.
    service.delete_gamer("gamer-0").await.unwrap();
    service.delete_gamer("gamer-1").await.unwrap();

    let second = service.reset_groups().unwrap();
    assert_eq!(second.len(), 2);
    let numbers: Vec<usize> = second.iter().map(|g| g.number).collect();
    assert_eq!(numbers, vec![0, 1]);

    let members: HashSet<String> = second
        .iter()
        .flat_map(|g| g.members.keys().cloned())
        .collect();
    assert!(!members.contains("gamer-0"));
    assert!(!members.contains("gamer-1"));
}

#[tokio::test]
async fn test_group_membership_is_disjoint_across_batch() {
    let service = create_test_service(3);

    for i in 0..10 {
        service
            .add_gamer(gamer(
                &format!("gamer-{:02}", i),
                (i % 4) as f64 * 5.0,
                (i % 3) as f64 * 2.0,
            ))
            .await
            .unwrap();
    }

    let groups = service.list_groups().await.unwrap();
    assert_eq!(groups.len(), 3);

    let mut seen = HashSet::new();
    for group in &groups {
        assert_eq!(group.len(), 3);
        for name in group.members.keys() {
            assert!(seen.insert(name.clone()), "{} assigned twice", name);
        }
    }
}

#[tokio::test]
async fn test_write_behind_persists_mutations() {
    let (service, store) = create_persistent_service(2);

    service.add_gamer(gamer("alice", 10.0, 5.0)).await.unwrap();
    service.add_gamer(gamer("bob", 12.0, 6.0)).await.unwrap();
    service.delete_gamer("alice").await.unwrap();

    // The flush barrier guarantees every submitted job has run.
    service.shutdown().await.unwrap();

    assert_eq!(store.len(), 1);
    assert!(store.contains("bob"));
    assert!(!store.contains("alice"));
}

#[tokio::test]
async fn test_listing_resynchronizes_from_the_store() {
    let (service, store) = create_persistent_service(2);

    // Records persisted by an earlier process generation.
    store.insert(gamer("dora", 11.0, 5.5)).await.unwrap();
    store.insert(gamer("ed", 11.5, 5.0)).await.unwrap();
    store.insert(gamer("frank", 80.0, 90.0)).await.unwrap();

    let groups = service.list_groups().await.unwrap();

    assert_eq!(service.pool_size().unwrap(), 3);
    assert_eq!(groups.len(), 1);
}

#[tokio::test]
async fn test_store_failures_do_not_unwind_pool_state() {
    let pool = Arc::new(GamerPool::new());
    let engine = Arc::new(MatchEngine::new(2));
    let metrics = Arc::new(MetricsCollector::new().unwrap());
    let store = Arc::new(RejectingStore::new());
    let (service, mut errors) =
        MatchmakingService::with_storage(pool, engine, metrics, store.clone(), 16);

    service.add_gamer(gamer("alice", 10.0, 5.0)).await.unwrap();

    // The failure is observable on the error channel...
    let reported = errors.recv().await.expect("expected a store failure");
    assert!(reported.to_string().contains("alice"));
    assert_eq!(store.attempts(), 1);

    // ...and the in-memory pool is untouched by it.
    assert_eq!(service.pool_size().unwrap(), 1);
    assert!(service.get_gamer("alice").is_ok());
}

#[tokio::test]
async fn test_concurrent_joins_then_one_batch() {
    let service = create_test_service(4);

    let mut handles = Vec::new();
    for worker in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..5 {
                service
                    .add_gamer(gamer(
                        &format!("gamer-{}-{}", worker, i),
                        (worker * 10 + i) as f64,
                        (worker + i) as f64,
                    ))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(service.pool_size().unwrap(), 40);

    let groups = service.list_groups().await.unwrap();
    assert_eq!(groups.len(), 10);

    let assigned: HashSet<String> = groups
        .iter()
        .flat_map(|g| g.members.keys().cloned())
        .collect();
    assert_eq!(assigned.len(), 40);
}

#[tokio::test]
async fn test_delete_then_delete_again_is_not_found() {
    let service = create_test_service(2);

    service.add_gamer(gamer("alice", 10.0, 5.0)).await.unwrap();
    service.delete_gamer("alice").await.unwrap();

    assert!(service.delete_gamer("alice").await.is_err());
    assert_eq!(service.pool_size().unwrap(), 0);
}
