use std::sync::Arc;
use std::time::Duration;

use clinicflow_models::Role;

use crate::fixtures::test_feed::TestFeed;

/// Lets spawned refresh tasks run to completion on the paused clock.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn staff_feed_refreshes_every_thirty_seconds() {
    let feed = TestFeed::open(Role::Staff, "staff-1");
    feed.seed(Role::Staff, 3, 3);
    assert!(feed.controller.start_auto_refresh());

    tokio::time::sleep(Duration::from_secs(65)).await;
    settle().await;

    assert_eq!(feed.gateway.list_calls().len(), 2);
    assert_eq!(feed.controller.snapshot().records.len(), 3);
    feed.controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn patient_feed_polls_slower_than_staff() {
    let feed = TestFeed::open(Role::Patient, "patient-1");
    feed.controller.start_auto_refresh();

    tokio::time::sleep(Duration::from_secs(65)).await;
    settle().await;

    assert_eq!(feed.gateway.list_calls().len(), 1);
    feed.controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn starting_twice_keeps_a_single_timer() {
    let feed = TestFeed::open(Role::Staff, "staff-1");
    assert!(feed.controller.start_auto_refresh());
    assert!(!feed.controller.start_auto_refresh());

    tokio::time::sleep(Duration::from_secs(95)).await;
    settle().await;

    assert_eq!(feed.gateway.list_calls().len(), 3);
    feed.controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_all_ticks() {
    let feed = TestFeed::open(Role::Staff, "staff-1");
    feed.controller.start_auto_refresh();

    tokio::time::sleep(Duration::from_secs(35)).await;
    settle().await;
    assert_eq!(feed.gateway.list_calls().len(), 1);

    feed.controller.shutdown();
    assert!(!feed.controller.is_auto_refreshing());

    tokio::time::sleep(Duration::from_secs(3600)).await;
    settle().await;
    assert_eq!(feed.gateway.list_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn closed_feed_refuses_to_start_a_timer() {
    let feed = TestFeed::open(Role::Staff, "staff-1");
    feed.controller.shutdown();

    assert!(!feed.controller.start_auto_refresh());
    assert!(!feed.controller.is_auto_refreshing());

    tokio::time::sleep(Duration::from_secs(600)).await;
    settle().await;
    assert!(feed.gateway.list_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_controller_stops_the_timer() {
    let TestFeed {
        gateway,
        controller,
        ..
    } = TestFeed::open(Role::Staff, "staff-1");
    controller.start_auto_refresh();
    assert_eq!(Arc::strong_count(&controller), 1);
    drop(controller);

    tokio::time::sleep(Duration::from_secs(600)).await;
    settle().await;
    assert!(gateway.list_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stopped_timer_can_be_restarted() {
    let feed = TestFeed::open(Role::Admin, "admin-1");
    feed.controller.start_auto_refresh();
    assert!(feed.controller.stop_auto_refresh());
    assert!(!feed.controller.stop_auto_refresh());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(feed.gateway.list_calls().is_empty());

    assert!(feed.controller.start_auto_refresh());
    tokio::time::sleep(Duration::from_secs(65)).await;
    settle().await;
    assert_eq!(feed.gateway.list_calls().len(), 1);
    feed.controller.shutdown();
}
