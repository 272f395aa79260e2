mod common;

use chrono::{Duration, NaiveDate};
use timesheet_backend::{
    dto::session_dto::{CreateEntryPayload, StartTimerPayload, UpdateEntryPayload},
    error::Error,
    models::user::Role,
};
use tokio_test::{assert_err, assert_ok};

use common::{monday_morning, setup};

fn entry(start_hour: i64, end_hour: i64, break_minutes: i32) -> CreateEntryPayload {
    let day = monday_morning() - Duration::hours(9);
    CreateEntryPayload {
        project_id: None,
        started_at: day + Duration::hours(start_hour),
        stopped_at: day + Duration::hours(end_hour),
        break_minutes,
        billable: None,
        notes: Some("  manual  ".into()),
    }
}

#[tokio::test]
async fn second_start_conflicts_and_leaves_first_session_alone() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let alice = ctx.actor(Role::Employee).await;

    let first = assert_ok!(timer.start(&alice, StartTimerPayload::default()).await);
    assert!(first.is_running());
    assert_eq!(first.started_at, monday_morning());

    ctx.time.advance(Duration::minutes(5));
    let err = assert_err!(timer.start(&alice, StartTimerPayload::default()).await);
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");

    let running = timer.running(alice.id).await.unwrap().expect("still running");
    assert_eq!(running.id, first.id);
    assert_eq!(running.started_at, monday_morning());
}

#[tokio::test]
async fn stop_records_elapsed_minutes_and_allows_a_new_start() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let bob = ctx.actor(Role::Employee).await;

    timer.start(&bob, StartTimerPayload::default()).await.unwrap();
    ctx.time.advance(Duration::minutes(90) + Duration::seconds(59));
    let stopped = assert_ok!(timer.stop(&bob).await);

    let stopped_at = stopped.stopped_at.expect("stopped");
    assert!(stopped_at >= stopped.started_at);
    assert_eq!(stopped.duration_minutes, 90);
    assert!(timer.running(bob.id).await.unwrap().is_none());

    let day = monday_morning().date_naive();
    assert_eq!(timer.total_hours(bob.id, day, day).await.unwrap(), 1.5);

    ctx.time.advance(Duration::minutes(1));
    assert_ok!(timer.start(&bob, StartTimerPayload::default()).await);
}

#[tokio::test]
async fn stop_without_running_session_is_not_found() {
    let Some(ctx) = setup().await else { return };
    let carol = ctx.actor(Role::Employee).await;

    let err = assert_err!(ctx.state.timer_service.stop(&carol).await);
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn clock_skew_is_clamped_to_a_zero_length_session() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let dave = ctx.actor(Role::Employee).await;

    timer.start(&dave, StartTimerPayload::default()).await.unwrap();
    ctx.time.advance(-Duration::minutes(3));
    let stopped = timer.stop(&dave).await.unwrap();

    assert_eq!(stopped.stopped_at, Some(stopped.started_at));
    assert_eq!(stopped.duration_minutes, 0);
    assert_eq!(stopped.elapsed_seconds(ctx.time.get()), 0);
}

#[tokio::test]
async fn sessions_are_listed_newest_first() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let erin = ctx.actor(Role::Employee).await;

    for _ in 0..3 {
        timer.start(&erin, StartTimerPayload::default()).await.unwrap();
        ctx.time.advance(Duration::minutes(30));
        timer.stop(&erin).await.unwrap();
        ctx.time.advance(Duration::minutes(10));
    }

    let history = timer.list_for_user(erin.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].started_at > w[1].started_at));
}

#[tokio::test]
async fn manual_entries_validate_interval_and_overlap() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let frank = ctx.actor(Role::Employee).await;

    let created = assert_ok!(timer.create_entry(&frank, entry(13, 15, 30)).await);
    assert_eq!(created.duration_minutes, 90);
    assert_eq!(created.notes, "manual");
    assert_eq!(created.work_date, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());

    // touching is fine, overlapping is not
    assert_ok!(timer.create_entry(&frank, entry(15, 16, 0)).await);
    let err = assert_err!(timer.create_entry(&frank, entry(14, 17, 0)).await);
    assert!(matches!(err, Error::BadRequest(_)));

    let err = assert_err!(timer.create_entry(&frank, entry(18, 17, 0)).await);
    assert!(matches!(err, Error::BadRequest(_)));
    let err = assert_err!(timer.create_entry(&frank, entry(18, 19, 60)).await);
    assert!(matches!(err, Error::BadRequest(_)));
}

#[tokio::test]
async fn starting_inside_a_finished_entry_conflicts() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let gina = ctx.actor(Role::Employee).await;

    // covers 08:00-10:00, clock is at 09:00
    timer.create_entry(&gina, entry(8, 10, 0)).await.unwrap();
    let err = assert_err!(timer.start(&gina, StartTimerPayload::default()).await);
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn running_sessions_cannot_be_edited_and_others_cannot_edit() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let owner = ctx.actor(Role::Employee).await;
    let other = ctx.actor(Role::Employee).await;
    let manager = ctx.actor(Role::Manager).await;

    let running = timer.start(&owner, StartTimerPayload::default()).await.unwrap();
    let err = assert_err!(
        timer
            .update_entry(&owner, running.id, UpdateEntryPayload::default())
            .await
    );
    assert!(matches!(err, Error::InvalidState(_)));

    let finished = timer.create_entry(&owner, entry(1, 2, 0)).await.unwrap();
    let err = assert_err!(
        timer
            .update_entry(&other, finished.id, UpdateEntryPayload::default())
            .await
    );
    assert!(matches!(err, Error::Forbidden(_)));

    let updated = assert_ok!(
        timer
            .update_entry(
                &owner,
                finished.id,
                UpdateEntryPayload {
                    break_minutes: Some(15),
                    ..Default::default()
                },
            )
            .await
    );
    assert_eq!(updated.duration_minutes, 45);

    let err = assert_err!(timer.delete_entry(&other, finished.id).await);
    assert!(matches!(err, Error::Forbidden(_)));
    assert_ok!(timer.delete_entry(&manager, finished.id).await);
    let err = assert_err!(timer.get(finished.id).await);
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn manual_entries_cannot_overlap_a_running_timer() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let hana = ctx.actor(Role::Employee).await;

    timer.start(&hana, StartTimerPayload::default()).await.unwrap();
    ctx.time.advance(Duration::hours(3));

    // 10:00-11:00 lies inside the running span, 13:00-14:00 after it
    let err = assert_err!(timer.create_entry(&hana, entry(10, 11, 0)).await);
    assert!(matches!(err, Error::BadRequest(_)), "got {err:?}");
    let err = assert_err!(timer.create_entry(&hana, entry(13, 14, 0)).await);
    assert!(matches!(err, Error::BadRequest(_)), "got {err:?}");
    assert_ok!(timer.create_entry(&hana, entry(7, 9, 0)).await);

    let stopped = timer.stop(&hana).await.unwrap();
    assert_eq!(stopped.duration_minutes, 180);

    let day = monday_morning().date_naive();
    assert_eq!(timer.list_for_user(hana.id).await.unwrap().len(), 2);
    assert_eq!(timer.total_hours(hana.id, day, day).await.unwrap(), 5.0);
}

#[tokio::test]
async fn a_later_logged_entry_blocks_starting_the_timer() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let ivan = ctx.actor(Role::Employee).await;

    // logged 13:00-14:00 while the clock is still at 09:00
    timer.create_entry(&ivan, entry(13, 14, 0)).await.unwrap();
    let err = assert_err!(timer.start(&ivan, StartTimerPayload::default()).await);
    assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
    assert!(timer.running(ivan.id).await.unwrap().is_none());

    ctx.time.advance(Duration::hours(5));
    assert_ok!(timer.start(&ivan, StartTimerPayload::default()).await);
}

#[tokio::test]
async fn concurrent_manual_entries_admit_only_one() {
    let Some(ctx) = setup().await else { return };
    let timer = &ctx.state.timer_service;
    let jade = ctx.actor(Role::Employee).await;

    let (a, b) = tokio::join!(
        timer.create_entry(&jade, entry(10, 12, 0)),
        timer.create_entry(&jade, entry(11, 13, 0)),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(timer.list_for_user(jade.id).await.unwrap().len(), 1);
}
