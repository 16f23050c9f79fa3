//! Integration tests for the Event Store and its broadcast path.
//!
//! Uses the in-memory backend so no `Dragonfly` server is needed.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chrono::NaiveDate;
use tempo_store::{EventStore, KvBackend, Publisher};
use tempo_types::{ChangeKind, ChangeNotification, ClockTime, Event, EventId, UserId};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn event(title: &str, start: &str, end: Option<&str>) -> Event {
    Event {
        id: EventId::generate(),
        title: title.to_owned(),
        start: ClockTime::parse(start).unwrap(),
        end: end.map(|e| ClockTime::parse(e).unwrap()),
        date: day(),
        color: None,
    }
}

fn make_store() -> EventStore {
    let kv = KvBackend::memory();
    EventStore::new(kv.clone(), Publisher::new(kv))
}

fn is_sorted(events: &[Event]) -> bool {
    events.windows(2).all(|w| match w {
        [a, b] => a.start <= b.start,
        _ => true,
    })
}

#[tokio::test]
async fn lunch_then_standup_scenario() {
    let store = make_store();
    let user = UserId::from("alice");

    store
        .add(&user, event("Lunch", "12:00", Some("13:00")))
        .await
        .unwrap();
    let events = store.read(&user, day()).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Lunch");

    store
        .add(&user, event("Standup", "09:00", Some("09:30")))
        .await
        .unwrap();
    let titles: Vec<_> = store
        .read(&user, day())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(titles, vec!["Standup", "Lunch"]);
}

#[tokio::test]
async fn add_grows_day_by_exactly_one() {
    let store = make_store();
    let user = UserId::from("alice");
    store.add(&user, event("A", "08:00", None)).await.unwrap();

    let before = store.read(&user, day()).await.unwrap().len();
    let added = store.add(&user, event("B", "07:00", None)).await.unwrap();
    let after = store.read(&user, day()).await.unwrap();

    assert_eq!(after.len(), before + 1);
    assert!(after.iter().any(|e| e.id == added.id));
}

#[tokio::test]
async fn reads_stay_sorted_across_mixed_mutations() {
    let store = make_store();
    let user = UserId::from("alice");
    let starts = ["14:00", "09:15", "23:00", "00:30", "09:15", "12:00"];
    let mut ids = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        let e = store
            .add(&user, event(&format!("E{i}"), start, None))
            .await
            .unwrap();
        ids.push(e.id);
        assert!(is_sorted(&store.read(&user, day()).await.unwrap()));
    }
    for id in ids.iter().step_by(2) {
        store.remove(&user, day(), id).await.unwrap();
        assert!(is_sorted(&store.read(&user, day()).await.unwrap()));
    }
    assert_eq!(store.read(&user, day()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn remove_absent_id_reports_not_found_and_keeps_list() {
    let store = make_store();
    let user = UserId::from("alice");
    store.add(&user, event("Lunch", "12:00", None)).await.unwrap();
    let before = store.read(&user, day()).await.unwrap();

    let result = store
        .remove(&user, day(), &EventId::from("missing"))
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(store.read(&user, day()).await.unwrap(), before);
}

#[tokio::test]
async fn days_and_users_are_isolated() {
    let store = make_store();
    let alice = UserId::from("alice");
    let bob = UserId::from("bob");
    store.add(&alice, event("Gym", "07:00", None)).await.unwrap();

    assert!(store.read(&bob, day()).await.unwrap().is_empty());
    let tomorrow = day().succ_opt().unwrap();
    assert!(store.read(&alice, tomorrow).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_broadcast_reaches_owner_but_not_other_user() {
    let store = make_store();
    let alice = UserId::from("alice");
    let bob = UserId::from("bob");

    let mut alice_sub = store.publisher().subscribe(&alice).await.unwrap();
    let mut bob_sub = store.publisher().subscribe(&bob).await.unwrap();

    let added = store
        .add(&alice, event("Lunch", "12:00", Some("13:00")))
        .await
        .unwrap();

    let payload = tokio::time::timeout(Duration::from_secs(1), alice_sub.next_payload())
        .await
        .unwrap()
        .unwrap();
    let notification: ChangeNotification = serde_json::from_str(&payload).unwrap();
    assert_eq!(notification.kind, ChangeKind::Add);
    assert_eq!(notification.event.id, added.id);
    assert!(notification.is_for(&alice));

    let nothing = tokio::time::timeout(Duration::from_millis(100), bob_sub.next_payload()).await;
    assert!(nothing.is_err(), "bob must not see alice's notification");
}

#[tokio::test]
async fn remove_broadcasts_removed_event() {
    let store = make_store();
    let alice = UserId::from("alice");
    let added = store.add(&alice, event("Lunch", "12:00", None)).await.unwrap();

    let mut sub = store.publisher().subscribe(&alice).await.unwrap();
    store.remove(&alice, day(), &added.id).await.unwrap();

    let payload = tokio::time::timeout(Duration::from_secs(1), sub.next_payload())
        .await
        .unwrap()
        .unwrap();
    let notification: ChangeNotification = serde_json::from_str(&payload).unwrap();
    assert_eq!(notification.kind, ChangeKind::Remove);
    assert_eq!(notification.event.id, added.id);
}

#[tokio::test]
async fn concurrent_adds_to_same_day_are_all_kept() {
    let store = make_store();
    let user = UserId::from("alice");

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            let start = format!("{:02}:00", i % 24);
            store.add(&user, event(&format!("E{i}"), &start, None)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let events = store.read(&user, day()).await.unwrap();
    assert_eq!(events.len(), 20);
    assert!(is_sorted(&events));
}

#[tokio::test]
async fn move_rewrites_once_and_broadcasts_remove_then_add() {
    let store = make_store();
    let alice = UserId::from("alice");
    let standup = store
        .add(&alice, event("Standup", "09:00", Some("09:30")))
        .await
        .unwrap();
    store.add(&alice, event("Lunch", "12:00", None)).await.unwrap();

    let mut sub = store.publisher().subscribe(&alice).await.unwrap();
    let moved = store
        .move_event(&alice, day(), &standup.id, ClockTime::parse("13:00").unwrap(), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.id, standup.id);
    assert_eq!(moved.end, Some(ClockTime::parse("13:30").unwrap()));

    let titles: Vec<_> = store
        .read(&alice, day())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(titles, vec!["Lunch", "Standup"]);

    let mut kinds = Vec::new();
    for _ in 0..2 {
        let payload = tokio::time::timeout(Duration::from_secs(1), sub.next_payload())
            .await
            .unwrap()
            .unwrap();
        let notification: ChangeNotification = serde_json::from_str(&payload).unwrap();
        assert_eq!(notification.event.id, standup.id);
        kinds.push((notification.kind, notification.event.start));
    }
    assert_eq!(
        kinds,
        vec![
            (ChangeKind::Remove, ClockTime::parse("09:00").unwrap()),
            (ChangeKind::Add, ClockTime::parse("13:00").unwrap()),
        ]
    );
}

#[tokio::test]
async fn concurrent_moves_and_adds_lose_nothing() {
    let store = make_store();
    let user = UserId::from("alice");
    let target = store.add(&user, event("Focus", "08:00", Some("09:00"))).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        let user = user.clone();
        let id = target.id.clone();
        handles.push(tokio::spawn(async move {
            let start = ClockTime::parse(&format!("{:02}:00", 10 + i)).unwrap();
            store.move_event(&user, day(), &id, start, None).await.map(|_| ())?;
            store
                .add(&user, event(&format!("E{i}"), "07:00", None))
                .await
                .map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let events = store.read(&user, day()).await.unwrap();
    assert_eq!(events.len(), 11);
    assert_eq!(events.iter().filter(|e| e.id == target.id).count(), 1);
    assert!(is_sorted(&events));
}
