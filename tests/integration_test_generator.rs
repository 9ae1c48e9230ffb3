mod common;

use std::collections::HashSet;

use agenda_engine::domain::models::{EventStatus, Setting};
use agenda_engine::domain::ports::DataStore;
use chrono::Duration;
use common::{manual_event, now_minute, student_with_slot, weekday_in, TestHarness};

#[tokio::test]
async fn reconcile_is_idempotent() {
    let harness = TestHarness::new();
    let student = student_with_slot("Ana", weekday_in(1), "10:00");
    harness.store.upsert_student(&student).await.unwrap();

    let generator = harness.state().generator.clone();
    generator.generate().await.unwrap();
    let first = harness.store.list_events().await.unwrap();
    assert!(!first.is_empty());

    generator.generate().await.unwrap();
    let second = harness.store.list_events().await.unwrap();

    assert_eq!(first.len(), second.len());
    let first_keys: Vec<_> = first.iter().map(|e| e.gen_key.clone()).collect();
    let second_keys: Vec<_> = second.iter().map(|e| e.gen_key.clone()).collect();
    assert_eq!(first_keys, second_keys);
}

#[tokio::test]
async fn one_event_per_matching_weekday_in_horizon() {
    let harness = TestHarness::new();
    // today's weekday with the default 14-day horizon matches days 0, 7 and 14
    let student = student_with_slot("Ana", weekday_in(0), "10:00");
    harness.store.upsert_student(&student).await.unwrap();

    harness.state().generator.generate().await.unwrap();
    let events = harness.store.list_events().await.unwrap();
    assert_eq!(events.len(), 3);

    let keys: HashSet<_> = events.iter().map(|e| e.gen_key.clone().unwrap()).collect();
    assert_eq!(keys.len(), 3, "gen keys must be unique");
    for event in &events {
        assert_eq!(event.status, EventStatus::Scheduled);
        assert!(!event.added_manually);
        assert_eq!(event.original_date, event.date);
        assert_eq!(event.original_time, "10:00");
        assert_eq!(
            event.gen_key.as_deref().unwrap(),
            format!("{}::{}::10:00", student.id_student, event.date)
        );
    }
}

#[tokio::test]
async fn generated_events_seed_policy_from_student_then_config() {
    let harness = TestHarness::new();
    let mut student = student_with_slot("Ana", weekday_in(1), "10:00");
    student.policy.cost = Setting::Num(80.0);
    student.policy.charge_cancelation = Setting::Flag(true);
    harness.store.upsert_student(&student).await.unwrap();

    harness.state().generator.generate().await.unwrap();
    let events = harness.store.list_events().await.unwrap();
    let event = events.first().unwrap();

    assert_eq!(event.policy.cost, Setting::Num(80.0));
    assert_eq!(event.policy.charge_cancelation, Setting::Flag(true));
    // config tier fills what the student leaves unset
    assert_eq!(event.policy.duration, Setting::Num(1.0));
    assert_eq!(event.policy.variable_cost, Setting::Flag(true));
    assert_eq!(event.policy.minutes_before, Setting::Num(15.0));
}

#[tokio::test]
async fn manual_events_are_never_reconciled_away() {
    let harness = TestHarness::new();
    let student = student_with_slot("Ana", weekday_in(1), "10:00");
    harness.store.upsert_student(&student).await.unwrap();

    // a manual lesson on a slot no template produces
    let manual = manual_event(&student, now_minute() + Duration::days(30));
    harness.store.insert_event(&manual).await.unwrap();

    let generator = harness.state().generator.clone();
    generator.generate().await.unwrap();
    generator.generate().await.unwrap();

    let events = harness.store.list_events().await.unwrap();
    assert!(events.iter().any(|e| e.id_event == manual.id_event));
}

#[tokio::test]
async fn soft_deleted_slot_is_not_recreated() {
    let harness = TestHarness::new();
    let student = student_with_slot("Ana", weekday_in(1), "10:00");
    harness.store.upsert_student(&student).await.unwrap();

    let generator = harness.state().generator.clone();
    generator.generate().await.unwrap();
    let before = harness.store.list_events().await.unwrap();

    let victim = before.first().unwrap().id_event.clone();
    harness.store.remove_event(&victim).await.unwrap();
    let softened = harness.store.find_event(&victim).await.unwrap().unwrap();
    assert!(softened.deleted);

    generator.generate().await.unwrap();
    let after = harness.store.list_events().await.unwrap();
    assert_eq!(after.len(), before.len(), "deleted slot must not come back");
    assert_eq!(
        after.iter().filter(|e| e.deleted).count(),
        1,
        "exactly the soft-deleted instance remains"
    );
}

#[tokio::test]
async fn shrinking_the_horizon_removes_stale_future_events() {
    let harness = TestHarness::new();
    // tomorrow's weekday: matches days 1 and 8 of the default horizon
    let student = student_with_slot("Ana", weekday_in(1), "10:00");
    harness.store.upsert_student(&student).await.unwrap();

    let generator = harness.state().generator.clone();
    generator.generate().await.unwrap();
    assert_eq!(harness.store.list_events().await.unwrap().len(), 2);

    let mut config = harness.store.config().await.unwrap();
    config.number_of_days = 6;
    harness.store.update_config(&config).await.unwrap();

    generator.generate().await.unwrap();
    let events = harness.store.list_events().await.unwrap();
    assert_eq!(events.len(), 1, "the day-8 instance falls out of the window");
}

#[tokio::test]
async fn paused_student_is_excluded_and_history_is_kept() {
    let harness = TestHarness::new();
    let mut student = student_with_slot("Ana", weekday_in(1), "10:00");
    harness.store.upsert_student(&student).await.unwrap();

    let generator = harness.state().generator.clone();
    generator.generate().await.unwrap();
    assert!(!harness.store.list_events().await.unwrap().is_empty());

    // a finished lesson from last week must survive the purge
    let mut done = common::scheduled_event(&student, now_minute() - Duration::days(7));
    done.status = EventStatus::Done;
    harness.store.insert_event(&done).await.unwrap();

    student.paused = true;
    harness.store.upsert_student(&student).await.unwrap();
    generator.remove_scheduled_for_paused().await.unwrap();

    let events = harness.store.list_events().await.unwrap();
    assert!(events.iter().all(|e| e.status != EventStatus::Scheduled));
    assert!(events.iter().any(|e| e.id_event == done.id_event));

    generator.generate().await.unwrap();
    let events = harness.store.list_events().await.unwrap();
    assert!(
        events.iter().all(|e| e.status != EventStatus::Scheduled),
        "reconcile must not regenerate for a paused student"
    );
}

#[tokio::test]
async fn differential_pass_leaves_other_students_alone() {
    let harness = TestHarness::new();
    let ana = student_with_slot("Ana", weekday_in(1), "10:00");
    let bia = student_with_slot("Bia", weekday_in(2), "14:00");
    harness.store.upsert_student(&ana).await.unwrap();
    harness.store.upsert_student(&bia).await.unwrap();

    let generator = harness.state().generator.clone();
    generator.generate().await.unwrap();
    let bia_before: Vec<_> = harness
        .store
        .list_events()
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.id_student == bia.id_student)
        .collect();

    // Ana's template moves to a different time; Bia's instances must be
    // byte-for-byte untouched
    let mut ana_changed = ana.clone();
    ana_changed.weekly_schedule[0].time_day = "11:00".to_string();
    harness.store.upsert_student(&ana_changed).await.unwrap();
    generator
        .remove_scheduled_for_student(&ana.id_student)
        .await
        .unwrap();
    generator
        .generate_for_student(&ana.id_student)
        .await
        .unwrap();

    let events = harness.store.list_events().await.unwrap();
    let bia_after: Vec<_> = events
        .iter()
        .filter(|e| e.id_student == bia.id_student)
        .cloned()
        .collect();
    assert_eq!(bia_before, bia_after);

    assert!(events
        .iter()
        .filter(|e| e.id_student == ana.id_student)
        .all(|e| e.time == "11:00"));
}

#[tokio::test]
async fn strip_overdue_past_respects_grace_and_switches() {
    let harness = TestHarness::new();
    let student = student_with_slot("Ana", weekday_in(1), "10:00");
    harness.store.upsert_student(&student).await.unwrap();

    // overdue beyond the 48h grace, and a recent one inside it
    let stale = common::scheduled_event(&student, now_minute() - Duration::hours(80));
    let recent = common::scheduled_event(&student, now_minute() - Duration::hours(3));
    harness.store.insert_event(&stale).await.unwrap();
    harness.store.insert_event(&recent).await.unwrap();

    let generator = harness.state().generator.clone();

    // switch off: nothing happens
    generator.strip_overdue_past().await.unwrap();
    assert_eq!(harness.store.list_events().await.unwrap().len(), 2);

    let mut config = harness.store.config().await.unwrap();
    config.auto_remove_past_events = true;
    harness.store.update_config(&config).await.unwrap();

    generator.strip_overdue_past().await.unwrap();
    let events = harness.store.list_events().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id_event, recent.id_event);
}
