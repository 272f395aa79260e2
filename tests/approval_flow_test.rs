mod common;

use chrono::{Duration, NaiveDate};
use timesheet_backend::{
    dto::report_dto::{DecisionPayload, SubmitReportPayload},
    dto::session_dto::StartTimerPayload,
    error::Error,
    models::report::{Decision, ReportStatus},
    models::user::Role,
};
use tokio_test::{assert_err, assert_ok};

use common::{monday_morning, setup};

fn eight_hours(period: &str) -> SubmitReportPayload {
    SubmitReportPayload {
        period: period.into(),
        content: "Invoicing and month-end close".into(),
        duration_hours: Some(8.0),
        week_start: None,
    }
}

#[tokio::test]
async fn submitted_report_is_pending_for_owner_and_queue() {
    let Some(ctx) = setup().await else { return };
    let employee = ctx.actor(Role::Employee).await;

    let report = assert_ok!(
        ctx.state
            .report_service
            .submit(&employee, eight_hours("2024-W1"))
            .await
    );
    assert_eq!(report.status, ReportStatus::Pending);
    assert_eq!(report.duration_hours, 8.0);
    assert!(report.reviewer_id.is_none());
    assert!(report.reviewed_at.is_none());

    let mine = ctx.state.report_service.list_for_user(employee.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, report.id);

    let queue = ctx.state.approval_service.list_pending().await.unwrap();
    assert!(queue.iter().any(|r| r.report.id == report.id));
}

#[tokio::test]
async fn reports_are_listed_most_recent_first() {
    let Some(ctx) = setup().await else { return };
    let employee = ctx.actor(Role::Employee).await;
    let reports = &ctx.state.report_service;

    let older = reports.submit(&employee, eight_hours("2024-W1")).await.unwrap();
    ctx.time.advance(Duration::hours(1));
    let newer = reports.submit(&employee, eight_hours("2024-W2")).await.unwrap();

    let listed = reports.list_for_user(employee.id).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn manager_approval_is_terminal() {
    let Some(ctx) = setup().await else { return };
    let employee = ctx.actor(Role::Employee).await;
    let manager = ctx.actor(Role::Manager).await;
    let other_manager = ctx.actor(Role::Manager).await;
    let approvals = &ctx.state.approval_service;

    let report = ctx
        .state
        .report_service
        .submit(&employee, eight_hours("2024-W1"))
        .await
        .unwrap();

    ctx.time.advance(Duration::hours(2));
    let approved = assert_ok!(
        approvals
            .decide(&manager, report.id, DecisionPayload::new(Decision::Approved))
            .await
    );
    assert_eq!(approved.status, ReportStatus::Approved);
    assert_eq!(approved.reviewer_id, Some(manager.id));
    assert_eq!(approved.reviewed_at, Some(ctx.time.get()));

    let queue = approvals.list_pending().await.unwrap();
    assert!(queue.iter().all(|r| r.report.id != report.id));

    let err = assert_err!(
        approvals
            .decide(&other_manager, report.id, DecisionPayload::new(Decision::Rejected))
            .await
    );
    assert!(matches!(err, Error::InvalidState(_)), "got {err:?}");

    let reloaded = ctx.state.report_service.get(&employee, report.id).await.unwrap();
    assert_eq!(reloaded.status, ReportStatus::Approved);
    assert_eq!(reloaded.reviewer_id, Some(manager.id));

    let history = ctx.state.report_service.history(&employee, report.id).await.unwrap();
    let actions: Vec<_> = history.iter().map(|h| h.action.as_str()).collect();
    assert_eq!(actions, vec!["report.submitted", "report.decided"]);
}

#[tokio::test]
async fn employees_cannot_decide() {
    let Some(ctx) = setup().await else { return };
    let employee = ctx.actor(Role::Employee).await;
    let colleague = ctx.actor(Role::Employee).await;

    let report = ctx
        .state
        .report_service
        .submit(&employee, eight_hours("2024-W1"))
        .await
        .unwrap();

    for actor in [&employee, &colleague] {
        let err = assert_err!(
            ctx.state
                .approval_service
                .decide(actor, report.id, DecisionPayload::new(Decision::Approved))
                .await
        );
        assert!(matches!(err, Error::Forbidden(_)));
    }

    let reloaded = ctx.state.report_service.get(&employee, report.id).await.unwrap();
    assert_eq!(reloaded.status, ReportStatus::Pending);
    assert!(reloaded.reviewer_id.is_none());
}

#[tokio::test]
async fn rejection_keeps_comment_and_frees_the_period() {
    let Some(ctx) = setup().await else { return };
    let employee = ctx.actor(Role::Employee).await;
    let manager = ctx.actor(Role::Manager).await;
    let reports = &ctx.state.report_service;

    let first = reports.submit(&employee, eight_hours("2024-W10")).await.unwrap();
    let err = assert_err!(reports.submit(&employee, eight_hours("2024-W10")).await);
    assert!(matches!(err, Error::Conflict(_)));

    let rejected = ctx
        .state
        .approval_service
        .decide(
            &manager,
            first.id,
            DecisionPayload {
                decision: Decision::Rejected,
                manager_comment: Some(" missing Friday ".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, ReportStatus::Rejected);
    assert_eq!(rejected.manager_comment.as_deref(), Some("missing Friday"));

    assert_ok!(reports.submit(&employee, eight_hours("2024-W10")).await);

    let reviewed = ctx
        .state
        .approval_service
        .list_reviewed(&manager, ReportStatus::Rejected, None)
        .await
        .unwrap();
    assert!(reviewed.iter().any(|r| r.report.id == first.id));
}

#[tokio::test]
async fn missing_reports_and_foreign_reads_are_refused() {
    let Some(ctx) = setup().await else { return };
    let owner = ctx.actor(Role::Employee).await;
    let stranger = ctx.actor(Role::Employee).await;
    let manager = ctx.actor(Role::Manager).await;

    let report = ctx
        .state
        .report_service
        .submit(&owner, eight_hours("2024-W3"))
        .await
        .unwrap();

    let err = assert_err!(ctx.state.report_service.get(&stranger, report.id).await);
    assert!(matches!(err, Error::Forbidden(_)));
    assert_ok!(ctx.state.report_service.get(&manager, report.id).await);

    let err = assert_err!(
        ctx.state
            .approval_service
            .decide(&manager, uuid::Uuid::new_v4(), DecisionPayload::new(Decision::Approved))
            .await
    );
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn weekly_report_totals_the_weeks_sessions() {
    let Some(ctx) = setup().await else { return };
    let employee = ctx.actor(Role::Employee).await;
    let timer = &ctx.state.timer_service;

    for _ in 0..2 {
        timer.start(&employee, StartTimerPayload::default()).await.unwrap();
        ctx.time.advance(Duration::minutes(150));
        timer.stop(&employee).await.unwrap();
        ctx.time.advance(Duration::days(1));
    }

    let report = ctx
        .state
        .report_service
        .submit(
            &employee,
            SubmitReportPayload {
                period: String::new(),
                content: "Week summary".into(),
                duration_hours: None,
                // a Wednesday in the same week
                week_start: Some(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()),
            },
        )
        .await
        .unwrap();

    assert_eq!(report.week_start, Some(monday_morning().date_naive()));
    assert_eq!(report.period, "2024-W11");
    assert_eq!(report.duration_hours, 5.0);
}
