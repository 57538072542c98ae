//! End-to-end behaviour of the forum service over the flat-file backend.

use fb_core::error::AppError;
use fb_core::models::ThreadId;
use integration_tests::{origin, reply_draft, thread_draft, timestamp, Harness};

#[tokio::test]
async fn first_thread_gets_id_one() {
    let h = Harness::new();

    let id = h
        .forum
        .create_thread(thread_draft("Hello", "Ann", "Hi"), origin())
        .await
        .unwrap();

    assert_eq!(id.to_string(), "00000001");
    assert_eq!(h.thread_files(), vec!["thread_00000001.json".to_string()]);

    let thread = h.forum.get_thread("00000001").await.unwrap().unwrap();
    assert_eq!(thread.title, "Hello");
    assert_eq!(thread.author, "Ann");
    assert_eq!(thread.body, "Hi");
    assert!(thread.replies.is_empty());
    assert_eq!(thread.created_at, thread.updated_at);
}

#[tokio::test]
async fn reply_advances_activity() {
    let h = Harness::new();
    h.clock.set(1_000);
    let id = h
        .forum
        .create_thread(thread_draft("Hello", "Ann", "Hi"), origin())
        .await
        .unwrap();

    h.clock.set(2_000);
    let rid = h
        .forum
        .append_reply("00000001", reply_draft("Bob", "Welcome"), origin())
        .await
        .unwrap();
    assert_eq!(rid, 1);

    let thread = h.forum.get_thread(&id.to_string()).await.unwrap().unwrap();
    assert_eq!(thread.replies.len(), 1);
    assert_eq!(thread.replies[0].rid, 1);
    assert_eq!(thread.replies[0].author, "Bob");
    assert_eq!(thread.created_at, timestamp(1_000));
    assert_eq!(thread.updated_at, timestamp(2_000));
}

#[tokio::test]
async fn unpadded_id_resolves_to_same_thread() {
    let h = Harness::new();
    h.forum
        .create_thread(thread_draft("Hello", "Ann", "Hi"), origin())
        .await
        .unwrap();

    let padded = h.forum.get_thread("00000001").await.unwrap();
    let bare = h.forum.get_thread("1").await.unwrap();
    assert!(padded.is_some());
    assert_eq!(padded, bare);
}

#[tokio::test]
async fn unknown_thread_is_absent() {
    let h = Harness::new();
    assert!(h.forum.get_thread("99999999").await.unwrap().is_none());
    assert!(h.forum.get_thread("../counter").await.unwrap().is_none());
    assert!(h.forum.get_thread("").await.unwrap().is_none());
}

#[tokio::test]
async fn reply_to_missing_thread_writes_nothing() {
    let h = Harness::new();

    let err = h
        .forum
        .append_reply("99999999", reply_draft("Bob", "Anyone?"), origin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(..)));
    assert!(h.thread_files().is_empty());
}

#[tokio::test]
async fn listing_follows_latest_activity() {
    let h = Harness::new();

    h.clock.set(1);
    let a = h
        .forum
        .create_thread(thread_draft("A", "", "first"), origin())
        .await
        .unwrap();
    h.clock.set(2);
    let b = h
        .forum
        .create_thread(thread_draft("B", "", "second"), origin())
        .await
        .unwrap();

    let ids: Vec<ThreadId> = h
        .forum
        .list_threads()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![b, a]);

    h.clock.set(5);
    h.forum
        .append_reply(&a.to_string(), reply_draft("", "bump"), origin())
        .await
        .unwrap();

    let listing = h.forum.list_threads().await.unwrap();
    let ids: Vec<ThreadId> = listing.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a, b]);
    assert_eq!(listing[0].reply_count, 1);
    assert_eq!(listing[0].author, "Anonymous");
    assert_eq!(listing[0].updated_at, timestamp(5));

    // Listing again without writes yields the same order.
    assert_eq!(h.forum.list_threads().await.unwrap(), listing);
}

#[tokio::test]
async fn ids_survive_a_restart() {
    let h = Harness::new();
    h.forum
        .create_thread(thread_draft("One", "Ann", "1"), origin())
        .await
        .unwrap();

    let restarted = h.second_worker();
    let id = restarted
        .create_thread(thread_draft("Two", "Ann", "2"), origin())
        .await
        .unwrap();
    assert_eq!(id, ThreadId::new(2));
    assert_eq!(restarted.list_threads().await.unwrap().len(), 2);
}

#[tokio::test]
async fn stored_record_keeps_origin_metadata() {
    let h = Harness::new();
    h.forum
        .create_thread(thread_draft("Hello", "Ann", "Hi"), origin())
        .await
        .unwrap();

    let path = h.backend.layout.thread_path(ThreadId::new(1));
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(raw["id"], "00000001");
    assert_eq!(raw["_ua"], "integration-tests");
    assert_eq!(raw["_ip"].as_str().unwrap().len(), 64);
    assert_ne!(raw["_ip"], "198.51.100.4");
}
