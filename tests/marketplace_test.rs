mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use skillnet_backend::{
    dto::{application_dto::ApplyPayload, job_dto::UpdateJobPayload, pagination::PageQuery},
    error::{Error, ErrorKind},
    models::{
        application::ApplicationStatus,
        entity_ref::EntityRef,
        job::{JobStatus, PaymentStatus},
        notification::NotificationType,
        user::Role,
    },
    services::policy::Denial,
    store::Page,
};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use common::*;

fn apply_payload() -> ApplyPayload {
    ApplyPayload {
        resume: "https://cv.example.com/sam.pdf".to_string(),
        cover_letter: Some("I would love to help.".to_string()),
    }
}

#[tokio::test]
async fn publishing_requires_a_completed_payment() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;

    let job = state
        .job_service
        .create(&employer, job_payload("Ledger Engineer"))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Draft);
    assert_eq!(job.payment_status, PaymentStatus::Unpaid);
    assert_eq!(job.applicants_count, 0);

    let err = state.job_service.publish(&employer, job.id).await.unwrap_err();
    assert!(matches!(err, Error::Denied(Denial::PaymentRequired)));

    let paid = state
        .payment_service
        .pay_for_job(&employer, job.id, payment(Decimal::new(5, 1), "tx1"))
        .await
        .unwrap();
    assert_eq!(paid.amount, Decimal::new(5, 1));
    assert_eq!(paid.currency, "ETH");
    assert_eq!(paid.target, EntityRef::Job(job.id));

    let job_after = state.job_service.get(job.id).await.unwrap();
    assert_eq!(job_after.payment_status, PaymentStatus::Paid);
    assert_eq!(job_after.payment_id, Some(paid.id));

    let wallet = state.wallet_service.get(&employer).await.unwrap();
    assert_eq!(wallet.balance, Decimal::new(-5, 1));

    let published = state.job_service.publish(&employer, job.id).await.unwrap();
    assert_eq!(published.status, JobStatus::Published);
}

#[tokio::test]
async fn paying_twice_conflicts_and_debits_once() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let job = state
        .job_service
        .create(&employer, job_payload("Ledger Engineer"))
        .await
        .unwrap();

    assert_ok!(
        state
            .payment_service
            .pay_for_job(&employer, job.id, payment(Decimal::new(5, 1), "tx1"))
            .await
    );
    let err = state
        .payment_service
        .pay_for_job(&employer, job.id, payment(Decimal::new(5, 1), "tx2"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let wallet = state.wallet_service.get(&employer).await.unwrap();
    assert_eq!(wallet.transactions.len(), 1);
    assert_eq!(wallet.balance, Decimal::new(-5, 1));
}

#[tokio::test]
async fn payment_input_is_validated_before_anything_is_written() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let job = state
        .job_service
        .create(&employer, job_payload("Ledger Engineer"))
        .await
        .unwrap();

    for bad in [
        payment(Decimal::ZERO, "tx1"),
        payment(Decimal::new(-1, 0), "tx1"),
        payment(Decimal::ONE, "   "),
    ] {
        let err = state
            .payment_service
            .pay_for_job(&employer, job.id, bad)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }
    let job = state.job_service.get(job.id).await.unwrap();
    assert_eq!(job.payment_status, PaymentStatus::Unpaid);
}

#[tokio::test]
async fn wallet_balance_matches_completed_history() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;

    let amounts = [Decimal::new(5, 1), Decimal::new(125, 2), Decimal::new(3, 0)];
    for (i, amount) in amounts.iter().enumerate() {
        let job = state
            .job_service
            .create(&employer, job_payload(&format!("Role {}", i)))
            .await
            .unwrap();
        state
            .payment_service
            .pay_for_job(&employer, job.id, payment(*amount, &format!("tx-{}", i)))
            .await
            .unwrap();
    }

    let wallet = state.wallet_service.get(&employer).await.unwrap();
    let spent: Decimal = amounts.iter().copied().sum();
    assert_eq!(wallet.balance, -spent);
    assert_eq!(wallet.balance, wallet.committed_balance());
    assert!(wallet.is_reconciled());

    let history = state
        .wallet_service
        .transactions(&employer, Page::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(history.total, 3);
    assert_eq!(history.items.len(), 2);
}

#[tokio::test]
async fn applying_creates_one_application_and_notifies_the_employer() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let seeker = register(&state, "sam", Role::JobSeeker).await;
    let job = published_job(&state, &employer, "Ledger Engineer").await;

    let application = state
        .application_service
        .apply(&seeker, job.id, apply_payload())
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.applicant_id, seeker.id);

    let job_after = state.job_service.get(job.id).await.unwrap();
    assert_eq!(job_after.applicants_count, 1);

    let inbox = state
        .notification_service
        .list(&employer, Page::default())
        .await
        .unwrap();
    let note = inbox
        .items
        .iter()
        .find(|n| n.notification_type == NotificationType::Application)
        .expect("application notification");
    assert_eq!(note.title, "New Job Application");
    assert_eq!(
        note.message,
        "sam has applied for your job \"Ledger Engineer\""
    );
    assert_eq!(note.related, EntityRef::Application(application.id));

    let err = state
        .application_service
        .apply(&seeker, job.id, apply_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Denied(Denial::DuplicateApplication)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let job_after = state.job_service.get(job.id).await.unwrap();
    assert_eq!(job_after.applicants_count, 1);
}

#[tokio::test]
async fn status_change_notifies_the_applicant() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let seeker = register(&state, "sam", Role::JobSeeker).await;
    let job = published_job(&state, &employer, "Ledger Engineer").await;
    let application = state
        .application_service
        .apply(&seeker, job.id, apply_payload())
        .await
        .unwrap();

    let updated = state
        .application_service
        .update_status(&employer, application.id, ApplicationStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(updated.status, ApplicationStatus::Accepted);

    let inbox = state
        .notification_service
        .list(&seeker, Page::default())
        .await
        .unwrap();
    assert_eq!(inbox.total, 1);
    assert_eq!(inbox.items[0].title, "Application Status Updated");
    assert_eq!(
        inbox.items[0].message,
        "Your application for \"Ledger Engineer\" has been updated to accepted"
    );

    // Any status can follow any other.
    let back = state
        .application_service
        .update_status(&employer, application.id, ApplicationStatus::Pending)
        .await
        .unwrap();
    assert_eq!(back.status, ApplicationStatus::Pending);
}

#[tokio::test]
async fn applying_after_the_deadline_is_expired_for_everyone() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let seeker = register(&state, "sam", Role::JobSeeker).await;
    let mut payload = job_payload("Closed Soon");
    payload.deadline = Utc::now() - Duration::hours(1);
    let job = published_job_from(&state, &employer, payload).await;

    for actor in [&seeker, &employer] {
        let err = state
            .application_service
            .apply(actor, job.id, apply_payload())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Denied(Denial::DeadlinePassed)));
        assert_eq!(err.kind(), ErrorKind::Expired);
    }
}

#[tokio::test]
async fn unpublished_jobs_and_employers_cannot_receive_applications() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let seeker = register(&state, "sam", Role::JobSeeker).await;
    let draft = state
        .job_service
        .create(&employer, job_payload("Draft"))
        .await
        .unwrap();

    let err = state
        .application_service
        .apply(&seeker, draft.id, apply_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Denied(Denial::JobNotPublished)));

    let job = published_job(&state, &employer, "Open").await;
    let err = state
        .application_service
        .apply(&employer, job.id, apply_payload())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Denied(Denial::RoleRequired(Role::JobSeeker))));

    let missing = state
        .application_service
        .apply(&seeker, Uuid::new_v4(), apply_payload())
        .await
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn non_owners_are_forbidden_even_for_missing_resources() {
    let state = test_state();
    let owner = register(&state, "owner", Role::Employer).await;
    let intruder = register(&state, "intruder", Role::Employer).await;
    let seeker = register(&state, "sam", Role::JobSeeker).await;
    let job = published_job(&state, &owner, "Owned").await;
    let application = state
        .application_service
        .apply(&seeker, job.id, apply_payload())
        .await
        .unwrap();

    for target in [job.id, Uuid::new_v4()] {
        let errors = [
            state.job_service.publish(&intruder, target).await.unwrap_err(),
            state
                .job_service
                .update(&intruder, target, UpdateJobPayload::default())
                .await
                .unwrap_err(),
            state.job_service.delete(&intruder, target).await.unwrap_err(),
            state
                .payment_service
                .pay_for_job(&intruder, target, payment(Decimal::ONE, "tx-x"))
                .await
                .unwrap_err(),
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::Forbidden, "{:?}", err);
        }
    }

    for target in [application.id, Uuid::new_v4()] {
        let err = state
            .application_service
            .update_status(&intruder, target, ApplicationStatus::Rejected)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Denied(Denial::NotOwner)));
    }

    let err = state
        .application_service
        .for_job(&intruder, job.id, Page::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // The applicant and the job's creator may both read the application.
    assert_ok!(state.application_service.get(&seeker, application.id).await);
    assert_ok!(state.application_service.get(&owner, application.id).await);
    assert_err!(state.application_service.get(&intruder, application.id).await);

    // Nothing the intruder tried changed the job.
    let job_after = state.job_service.get(job.id).await.unwrap();
    assert_eq!(job_after.status, JobStatus::Published);
}

#[tokio::test]
async fn only_drafts_can_be_edited() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let draft = state
        .job_service
        .create(&employer, job_payload("Draft"))
        .await
        .unwrap();

    let edited = state
        .job_service
        .update(
            &employer,
            draft.id,
            UpdateJobPayload {
                title: Some("Renamed Draft".to_string()),
                is_urgent: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.title, "Renamed Draft");
    assert!(edited.is_urgent);
    assert_eq!(edited.status, JobStatus::Draft);

    let published = published_job(&state, &employer, "Live").await;
    let err = state
        .job_service
        .update(&employer, published.id, UpdateJobPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[tokio::test]
async fn concurrent_payments_settle_exactly_once() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let job = state
        .job_service
        .create(&employer, job_payload("Race"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = state.payment_service.clone();
        let actor = employer.clone();
        handles.push(tokio::spawn(async move {
            service
                .pay_for_job(&actor, job.id, payment(Decimal::ONE, &format!("race-{}", i)))
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::Conflict),
        }
    }
    assert_eq!(successes, 1);

    let wallet = state.wallet_service.get(&employer).await.unwrap();
    assert_eq!(wallet.balance, Decimal::new(-1, 0));
    assert_eq!(wallet.transactions.len(), 1);
}

#[tokio::test]
async fn concurrent_applications_produce_one_record() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let seeker = register(&state, "sam", Role::JobSeeker).await;
    let job = published_job(&state, &employer, "Popular").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = state.application_service.clone();
        let actor = seeker.clone();
        handles.push(tokio::spawn(async move {
            service.apply(&actor, job.id, apply_payload()).await
        }));
    }
    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);

    let job_after = state.job_service.get(job.id).await.unwrap();
    assert_eq!(job_after.applicants_count, 1);
    let listed = state
        .application_service
        .for_job(&employer, job.id, Page::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
}

#[tokio::test]
async fn payment_history_resolves_job_titles() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let other = register(&state, "other", Role::Employer).await;
    published_job(&state, &employer, "First Role").await;
    published_job(&state, &employer, "Second Role").await;

    let history = state
        .payment_service
        .history(&employer, Page::default())
        .await
        .unwrap();
    assert_eq!(history.total, 2);
    let titles: Vec<_> = history
        .items
        .iter()
        .map(|p| p.target_title.clone().unwrap_or_default())
        .collect();
    assert_eq!(titles, vec!["Second Role", "First Role"]);

    let payment_id = history.items[0].id;
    assert_ok!(state.payment_service.get(&employer, payment_id).await);
    let err = state
        .payment_service
        .get(&other, payment_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn notifications_belong_to_their_recipient() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let stranger = register(&state, "stranger", Role::JobSeeker).await;
    published_job(&state, &employer, "Ledger Engineer").await;

    let inbox = state
        .notification_service
        .list(&employer, Page::default())
        .await
        .unwrap();
    let note = &inbox.items[0];
    assert_eq!(note.notification_type, NotificationType::Payment);
    assert!(note.message.starts_with("Your payment of 0.5 ETH"));
    assert!(!note.is_read);

    let err = state
        .notification_service
        .mark_read(&stranger, note.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Denied(Denial::NotOwner)));

    let read = state
        .notification_service
        .mark_read(&employer, note.id)
        .await
        .unwrap();
    assert!(read.is_read);
    assert_eq!(
        state
            .notification_service
            .mark_all_read(&employer)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn listing_shows_only_published_jobs_and_saved_jobs_are_tracked() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let seeker = register(&state, "sam", Role::JobSeeker).await;
    state
        .job_service
        .create(&employer, job_payload("Hidden Draft"))
        .await
        .unwrap();
    let live = published_job(&state, &employer, "Visible").await;

    let listed = state
        .job_service
        .list(&Default::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, live.id);

    let drafts = state
        .job_service
        .my_drafts(&employer, PageQuery::default().page())
        .await
        .unwrap();
    assert_eq!(drafts.items[0].title, "Hidden Draft");

    state.job_service.save(&seeker, live.id).await.unwrap();
    let again = state.job_service.save(&seeker, live.id).await.unwrap_err();
    assert_eq!(again.kind(), ErrorKind::Conflict);
    let saved = state
        .job_service
        .saved(&seeker, Page::default())
        .await
        .unwrap();
    assert_eq!(saved.total, 1);

    state.job_service.unsave(&seeker, live.id).await.unwrap();
    let saved = state
        .job_service
        .saved(&seeker, Page::default())
        .await
        .unwrap();
    assert_eq!(saved.total, 0);

    let err = state
        .job_service
        .search(Some("   "), Page::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
    let found = state
        .job_service
        .search(Some("rust"), Page::default())
        .await
        .unwrap();
    assert_eq!(found.total, 1);
}

#[tokio::test]
async fn registration_conflicts_and_wallet_reconnection() {
    let state = test_state();
    let alice = register(&state, "alice", Role::Employer).await;
    register(&state, "bob", Role::JobSeeker).await;

    let mut duplicate = register_payload("alice2", Role::JobSeeker);
    duplicate.email = "alice@example.com".to_string();
    let err = state.auth_service.register(duplicate).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = state
        .wallet_service
        .connect(&alice, "0xbob")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let wallet = state.wallet_service.connect(&alice, "0xfresh").await.unwrap();
    assert_eq!(wallet.address, "0xfresh");
    let profile = state.user_service.profile(&alice).await.unwrap();
    assert_eq!(profile.wallet_address, "0xfresh");
}

#[tokio::test]
async fn application_views_identify_the_other_party() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let seeker = register(&state, "sam", Role::JobSeeker).await;
    let job = published_job(&state, &employer, "Ledger Engineer").await;
    let application = state
        .application_service
        .apply(&seeker, job.id, apply_payload())
        .await
        .unwrap();

    let listed = state
        .application_service
        .for_job(&employer, job.id, Page::default())
        .await
        .unwrap();
    let applicant = listed.items[0].applicant.as_ref().expect("applicant summary");
    assert_eq!(applicant.id, seeker.id);
    assert_eq!(applicant.username, "sam");
    assert_eq!(applicant.email, "sam@example.com");
    assert!(listed.items[0].job.is_none());

    let mine = state
        .application_service
        .mine(&seeker, Page::default())
        .await
        .unwrap();
    let view = mine.items[0].job.as_ref().expect("job view");
    assert_eq!(view.job.title, "Ledger Engineer");
    assert_eq!(
        view.creator.as_ref().map(|c| c.username.as_str()),
        Some("employer")
    );
    assert!(mine.items[0].applicant.is_none());

    let single = state
        .application_service
        .get(&employer, application.id)
        .await
        .unwrap();
    assert_eq!(single.application.id, application.id);
    assert_eq!(single.applicant.map(|a| a.username), Some("sam".to_string()));
    assert_eq!(single.job.map(|j| j.job.id), Some(job.id));
}

#[tokio::test]
async fn job_views_carry_their_creator() {
    let state = test_state();
    let employer = register(&state, "employer", Role::Employer).await;
    let job = published_job(&state, &employer, "Ledger Engineer").await;

    let view = state.job_service.view(job.id).await.unwrap();
    assert_eq!(view.job.id, job.id);
    let creator = view.creator.expect("creator summary");
    assert_eq!(creator.id, employer.id);
    assert_eq!(creator.username, "employer");

    let listed = state
        .job_service
        .list(&Default::default())
        .await
        .unwrap();
    let listed = state.job_service.with_creators(listed).await.unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].creator.as_ref().map(|c| c.id), Some(employer.id));

    let missing = state.job_service.view(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}
