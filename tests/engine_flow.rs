use attendance_engine::config::EngineConfig;
use attendance_engine::error::EngineError;
use attendance_engine::model::category::HourCategory;
use attendance_engine::model::leave_request::{LeaveDraft, LeaveType};
use attendance_engine::model::role::{Actor, Role};
use attendance_engine::model::status::ApprovalStatus;
use attendance_engine::model::time_entry::{ProofRef, TimeEntryDraft};
use attendance_engine::service::ReconciliationService;
use attendance_engine::store::RecordStore;
use attendance_engine::store::memory::InMemoryStore;
use chrono::NaiveDate;
use std::sync::Arc;

const EMP_A: u64 = 1;
const EMP_B: u64 = 2;
const EMP_C: u64 = 3;
const EMP_D: u64 = 4;
const EMP_ADMIN_OWNED: u64 = 100;

async fn setup() -> (
    Arc<InMemoryStore>,
    ReconciliationService<InMemoryStore, InMemoryStore>,
) {
    // captured per test, shown on failure
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = Arc::new(InMemoryStore::new());
    for id in [EMP_A, EMP_B, EMP_C, EMP_D] {
        store.put_role(id, Role::Employee).await;
    }
    store.put_role(EMP_ADMIN_OWNED, Role::Admin).await;

    let config = EngineConfig {
        expected_working_days: 20,
        ..EngineConfig::default()
    };
    let service = ReconciliationService::new(Arc::clone(&store), Arc::clone(&store), config);
    (store, service)
}

fn admin() -> Actor {
    Actor::new(9001, "alice", Role::Admin)
}

fn manager() -> Actor {
    Actor::new(9002, "morgan", Role::Manager)
}

fn employee(employee_id: u64) -> Actor {
    Actor::new(9000 + employee_id, "worker", Role::Employee).with_employee(employee_id)
}

fn draft(date: NaiveDate, clock_in: &str, clock_out: &str, category: HourCategory) -> TimeEntryDraft {
    TimeEntryDraft {
        date,
        clock_in: clock_in.into(),
        clock_out: clock_out.into(),
        category,
        notes: None,
        proof: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn overlapping_submission_conflicts_back_to_back_does_not() -> anyhow::Result<()> {
    let (_store, service) = setup().await;
    let day = date(2025, 3, 10);

    // approved 08:00-16:00 regular entry, administratively entered
    let entry = service
        .submit_entry(EMP_A, draft(day, "08:00", "16:00", HourCategory::Regular), &admin())
        .await?;
    assert_eq!(entry.status, ApprovalStatus::Approved);

    // 15:30-18:00 overlaps
    let err = service
        .submit_entry(EMP_A, draft(day, "15:30", "18:00", HourCategory::Regular), &employee(EMP_A))
        .await
        .unwrap_err();
    match err {
        EngineError::Conflict {
            employee_id,
            category,
            date: conflict_date,
        } => {
            assert_eq!(employee_id, EMP_A);
            assert_eq!(category, HourCategory::Regular);
            assert_eq!(conflict_date, day);
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    // 16:00-18:00 is back-to-back and self-submitted, so it lands pending
    let entry = service
        .submit_entry(EMP_A, draft(day, "16:00", "18:00", HourCategory::Regular), &employee(EMP_A))
        .await?;
    assert_eq!(entry.status, ApprovalStatus::Pending);
    assert!(entry.approved_by.is_none());
    Ok(())
}

#[tokio::test]
async fn bulk_submission_partial_success() -> anyhow::Result<()> {
    let (store, service) = setup().await;
    let christmas = date(2025, 12, 25);

    // B already worked that holiday
    service
        .submit_entry(EMP_B, draft(christmas, "09:00", "17:00", HourCategory::Holiday), &admin())
        .await?;

    let outcome = service
        .submit_bulk(
            draft(christmas, "09:00", "17:00", HourCategory::Holiday),
            &[EMP_A, EMP_B, EMP_C],
            &admin(),
        )
        .await?;

    let accepted_ids: Vec<u64> = outcome.accepted.iter().map(|e| e.employee_id).collect();
    assert_eq!(accepted_ids, vec![EMP_A, EMP_C]);
    for entry in &outcome.accepted {
        assert_eq!(entry.status, ApprovalStatus::Approved);
        assert_eq!(entry.approved_by, Some(admin().user_id));
        assert!(entry.approved_at.is_some());
    }

    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].employee_id, EMP_B);
    assert!(outcome.skipped[0].reason.contains("2025-12-25"));

    // exactly one entry per accepted target was inserted
    for (id, expected) in [(EMP_A, 1), (EMP_B, 1), (EMP_C, 1)] {
        let entries = store
            .find_entries(id, christmas, christmas, Some(HourCategory::Holiday))
            .await?;
        assert_eq!(entries.len(), expected, "employee {id}");
    }
    Ok(())
}

#[tokio::test]
async fn bulk_submission_all_conflicting_fails() -> anyhow::Result<()> {
    let (_store, service) = setup().await;
    let day = date(2025, 12, 25);

    for id in [EMP_A, EMP_B] {
        service
            .submit_entry(id, draft(day, "08:00", "18:00", HourCategory::Holiday), &admin())
            .await?;
    }

    let err = service
        .submit_bulk(
            draft(day, "09:00", "17:00", HourCategory::Holiday),
            &[EMP_A, EMP_B],
            &admin(),
        )
        .await
        .unwrap_err();
    match err {
        EngineError::AllConflicting {
            employee_ids,
            category,
            ..
        } => {
            assert_eq!(employee_ids, vec![EMP_A, EMP_B]);
            assert_eq!(category, HourCategory::Holiday);
        }
        other => panic!("expected AllConflicting, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn bulk_submission_requires_supervisor() {
    let (_store, service) = setup().await;
    let err = service
        .submit_bulk(
            draft(date(2025, 5, 1), "09:00", "17:00", HourCategory::Regular),
            &[EMP_B],
            &employee(EMP_A),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn leave_days_follow_the_approval_workflow() -> anyhow::Result<()> {
    let (store, service) = setup().await;

    let leave = service
        .submit_leave(
            EMP_D,
            LeaveDraft {
                leave_type: LeaveType::Vacation,
                start_date: date(2025, 6, 1),
                end_date: date(2025, 6, 5),
                reason: Some("summer break".into()),
            },
            &employee(EMP_D),
        )
        .await?;
    assert_eq!(leave.days_count, 5);
    assert_eq!(leave.status, ApprovalStatus::Pending);

    // pending leave already counts
    let summary = service.period_summary(EMP_D, 6, 2025).await?;
    assert_eq!(summary.leave_days, 5);

    let rejected = service
        .reject_leave(leave.id, &admin(), Some("project deadline".into()))
        .await?;
    assert_eq!(rejected.status, ApprovalStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("project deadline"));

    // recomputed, not served stale from cache
    let summary = service.period_summary(EMP_D, 6, 2025).await?;
    assert_eq!(summary.leave_days, 0);

    let stored = store.leave_request(leave.id).await?.unwrap();
    assert_eq!(stored.approved_by, Some(admin().user_id));
    Ok(())
}

#[tokio::test]
async fn manager_cannot_transition_admin_owned_records() -> anyhow::Result<()> {
    let (store, service) = setup().await;
    let day = date(2025, 4, 7);

    // self-submitted by the admin-role employee, so it stays pending
    let owner = Actor::new(9100, "dana", Role::Admin).with_employee(EMP_ADMIN_OWNED);
    let entry = service
        .submit_entry(EMP_ADMIN_OWNED, draft(day, "09:00", "17:00", HourCategory::Regular), &owner)
        .await?;
    assert_eq!(entry.status, ApprovalStatus::Pending);

    let err = service.approve_entry(entry.id, &manager()).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // no mutation happened
    let stored = store.entry(entry.id).await?.unwrap();
    assert_eq!(stored.status, ApprovalStatus::Pending);

    // an admin actor may still approve it
    let approved = service.approve_entry(entry.id, &admin()).await?;
    assert_eq!(approved.status, ApprovalStatus::Approved);
    Ok(())
}

#[tokio::test]
async fn employees_cannot_approve_their_own_records() -> anyhow::Result<()> {
    let (_store, service) = setup().await;
    let entry = service
        .submit_entry(
            EMP_A,
            draft(date(2025, 4, 8), "09:00", "17:00", HourCategory::Regular),
            &employee(EMP_A),
        )
        .await?;

    let err = service.approve_entry(entry.id, &employee(EMP_A)).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    Ok(())
}

#[tokio::test]
async fn concurrent_transitions_have_exactly_one_winner() -> anyhow::Result<()> {
    let (store, service) = setup().await;
    let entry = service
        .submit_entry(
            EMP_A,
            draft(date(2025, 4, 9), "09:00", "17:00", HourCategory::Regular),
            &employee(EMP_A),
        )
        .await?;

    let admin_actor = admin();
    let (approve, reject) = tokio::join!(
        service.approve_entry(entry.id, &admin_actor),
        service.reject_entry(entry.id, &admin_actor),
    );
    assert_ne!(
        approve.is_ok(),
        reject.is_ok(),
        "exactly one transition may win"
    );

    let stored = store.entry(entry.id).await?.unwrap();
    assert!(stored.status.is_terminal());
    let expected = if approve.is_ok() {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Rejected
    };
    assert_eq!(stored.status, expected);
    Ok(())
}

#[tokio::test]
async fn concurrent_overlapping_submissions_have_one_winner() -> anyhow::Result<()> {
    let (store, service) = setup().await;
    let day = date(2025, 4, 10);

    let actor = employee(EMP_A);
    let (first, second) = tokio::join!(
        service.submit_entry(EMP_A, draft(day, "08:00", "16:00", HourCategory::Regular), &actor),
        service.submit_entry(EMP_A, draft(day, "15:00", "17:00", HourCategory::Regular), &actor),
    );
    assert_ne!(first.is_ok(), second.is_ok(), "check-then-insert must serialize");

    let entries = store
        .find_entries(EMP_A, day, day, Some(HourCategory::Regular))
        .await?;
    assert_eq!(entries.len(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_period_yields_all_zero_summary() -> anyhow::Result<()> {
    let (_store, service) = setup().await;
    let summary = service.period_summary(77, 1, 2025).await?;
    assert_eq!(summary.days_worked, 0);
    assert_eq!(summary.total_hours, 0.0);
    assert_eq!(summary.leave_days, 0);
    assert_eq!(summary.attendance_rate, 0.0);
    Ok(())
}

#[tokio::test]
async fn summary_buckets_and_attendance_rate() -> anyhow::Result<()> {
    let (_store, service) = setup().await;

    service
        .submit_entry(EMP_A, draft(date(2025, 7, 1), "08:00", "16:00", HourCategory::Regular), &admin())
        .await?;
    service
        .submit_entry(EMP_A, draft(date(2025, 7, 5), "10:00", "14:00", HourCategory::Weekend), &admin())
        .await?;
    service
        .submit_entry(EMP_A, draft(date(2025, 7, 10), "09:00", "12:00", HourCategory::Holiday), &admin())
        .await?;

    let summary = service.period_summary(EMP_A, 7, 2025).await?;
    assert_eq!(summary.days_worked, 3);
    assert_eq!(summary.regular_hours, 8.0);
    assert_eq!(summary.overtime_hours, 4.0);
    assert_eq!(summary.holiday_overtime_hours, 3.0);
    assert_eq!(summary.total_hours, 15.0);
    // 3 of 20 expected working days
    assert_eq!(summary.attendance_rate, 15.0);
    Ok(())
}

#[tokio::test]
async fn rejected_entries_free_the_slot_and_the_summary() -> anyhow::Result<()> {
    let (_store, service) = setup().await;
    let day = date(2025, 8, 4);

    let entry = service
        .submit_entry(EMP_A, draft(day, "08:00", "16:00", HourCategory::Regular), &employee(EMP_A))
        .await?;
    service.reject_entry(entry.id, &admin()).await?;

    // the rejected range no longer blocks a resubmission
    let resubmitted = service
        .submit_entry(EMP_A, draft(day, "08:00", "16:00", HourCategory::Regular), &employee(EMP_A))
        .await?;
    assert_eq!(resubmitted.status, ApprovalStatus::Pending);

    // and contributes nothing to the summary
    let summary = service.period_summary(EMP_A, 8, 2025).await?;
    assert_eq!(summary.days_worked, 1);
    assert_eq!(summary.regular_hours, 8.0);
    Ok(())
}

#[tokio::test]
async fn on_leave_markers_are_unique_per_day() -> anyhow::Result<()> {
    let (_store, service) = setup().await;
    let day = date(2025, 9, 1);
    let on_leave = |d| draft(d, "ignored", "ignored", HourCategory::OnLeave);

    let marker = service.submit_entry(EMP_A, on_leave(day), &admin()).await?;
    assert_eq!(marker.hours, 0.0);
    assert_eq!(marker.clock_in, "00:00:00");

    let err = service.submit_entry(EMP_A, on_leave(day), &admin()).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict { .. }));

    // a worked entry the same day is not blocked by the marker
    service
        .submit_entry(EMP_A, draft(day, "08:00", "12:00", HourCategory::Regular), &admin())
        .await?;
    Ok(())
}

#[tokio::test]
async fn attachment_lifecycle_is_role_gated() -> anyhow::Result<()> {
    let (store, service) = setup().await;
    let entry = service
        .submit_entry(
            EMP_A,
            draft(date(2025, 10, 1), "08:00", "16:00", HourCategory::Regular),
            &employee(EMP_A),
        )
        .await?;

    let proof = ProofRef {
        url: "blob://proofs/42".into(),
        display_name: "shift-report.pdf".into(),
        mime_type: "application/pdf".into(),
    };
    service.attach_proof(entry.id, proof.clone(), &employee(EMP_A)).await?;
    assert_eq!(store.entry(entry.id).await?.unwrap().proof, Some(proof));

    // another employee may not touch it
    let err = service
        .delete_attachment(entry.id, &employee(EMP_B))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    service.delete_attachment(entry.id, &employee(EMP_A)).await?;
    assert_eq!(store.entry(entry.id).await?.unwrap().proof, None);

    service.delete_entry(entry.id, &admin()).await?;
    assert!(store.entry(entry.id).await?.is_none());
    Ok(())
}
