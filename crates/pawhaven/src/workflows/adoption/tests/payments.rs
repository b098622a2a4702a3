use super::common::*;
use crate::workflows::adoption::domain::{
    Actor, ApplicationId, ApplicationStatus, PaymentDecision, PaymentId, PaymentStatus, PetStatus,
};
use crate::workflows::adoption::store::AdoptionStore;
use crate::workflows::adoption::WorkflowError;

fn approved_application(harness: &TestHarness) -> (Actor, ApplicationId) {
    let adopter = seed_adopter(&harness.store, 1);
    let pet = seed_pet_for(&harness.store, 1, ORG, PetStatus::Available, 500);
    let application = harness
        .api
        .applications
        .submit(adopter, pet, form())
        .expect("submission succeeds");
    harness
        .api
        .applications
        .transition(
            application.application_id,
            ApplicationStatus::Approved,
            org_actor(),
            None,
        )
        .expect("approval succeeds");
    (adopter, application.application_id)
}

#[test]
fn setup_snapshots_the_adoption_fee() {
    let harness = build_harness();
    let (_, application_id) = approved_application(&harness);

    let payment = harness
        .api
        .payments
        .setup(
            org_actor(),
            application_id,
            b"qr bytes",
            Some("GCash transfer, reference your application id.".to_string()),
        )
        .expect("setup succeeds");

    assert_eq!(payment.payment_id, PaymentId(1));
    assert_eq!(payment.amount, 500);
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert!(payment.qr_image.starts_with("asset://"));
    assert!(payment.date_submitted.is_none());
    assert_eq!(harness.assets.uploaded(), 1);
}

#[test]
fn setup_requires_an_approved_application() {
    let harness = build_harness();
    let adopter = seed_adopter(&harness.store, 1);
    let pet = seed_pet(&harness.store, 1, PetStatus::Available);
    let application = harness
        .api
        .applications
        .submit(adopter, pet, form())
        .expect("submission succeeds");

    match harness
        .api
        .payments
        .setup(org_actor(), application.application_id, b"qr", None)
    {
        Err(WorkflowError::PreconditionFailed(message)) => {
            assert!(message.contains("approved application"));
        }
        other => panic!("expected precondition failure, got {other:?}"),
    }
}

#[test]
fn setup_authorizes_the_owning_organization() {
    let harness = build_harness();
    let (_, application_id) = approved_application(&harness);

    assert!(matches!(
        harness
            .api
            .payments
            .setup(other_org_actor(), application_id, b"qr", None),
        Err(WorkflowError::Authorization(_))
    ));
}

#[test]
fn setup_conflicts_while_a_payment_is_active() {
    let harness = build_harness();
    let (_, application_id) = approved_application(&harness);

    harness
        .api
        .payments
        .setup(org_actor(), application_id, b"qr", None)
        .expect("first setup succeeds");

    match harness
        .api
        .payments
        .setup(org_actor(), application_id, b"qr", None)
    {
        Err(WorkflowError::Conflict(message)) => {
            assert!(message.contains("already exists"));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn concurrent_setups_resolve_to_one_pending_payment() {
    let harness = build_harness();
    let (_, application_id) = approved_application(&harness);

    let api = harness.api.clone();
    let outcomes = std::thread::scope(|scope| {
        let handles = [(); 2].map(|_| {
            let api = api.clone();
            scope.spawn(move || api.payments.setup(org_actor(), application_id, b"qr", None))
        });
        handles.map(|handle| handle.join().expect("setup thread panicked"))
    });

    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1, "exactly one setup must win the race");
    match outcomes.iter().find(|outcome| outcome.is_err()) {
        Some(Err(WorkflowError::Conflict(message))) => {
            assert!(message.contains("already exists"));
        }
        other => panic!("expected the loser to observe a conflict, got {other:?}"),
    }

    let payments = harness
        .store
        .payments_for_application(application_id)
        .unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
}

#[test]
fn setup_may_supersede_a_rejected_payment() {
    let harness = build_harness();
    let (adopter, application_id) = approved_application(&harness);

    let first = harness
        .api
        .payments
        .setup(org_actor(), application_id, b"qr", None)
        .expect("first setup succeeds");
    harness
        .api
        .payments
        .submit_proof(adopter, first.payment_id, b"proof", None)
        .expect("proof submits");
    harness
        .api
        .payments
        .verify(
            org_actor(),
            first.payment_id,
            PaymentDecision::Rejected,
            Some("Amount mismatch.".to_string()),
        )
        .expect("rejection succeeds");

    let second = harness
        .api
        .payments
        .setup(org_actor(), application_id, b"qr", None)
        .expect("fresh setup after rejection");
    assert!(second.payment_id > first.payment_id);

    let latest = harness
        .api
        .payments
        .check(adopter, application_id)
        .expect("check succeeds")
        .expect("payment present");
    assert_eq!(latest.payment_id, second.payment_id);
}

#[test]
fn submit_proof_advances_pending_to_submitted() {
    let harness = build_harness();
    let (adopter, application_id) = approved_application(&harness);

    let payment = harness
        .api
        .payments
        .setup(org_actor(), application_id, b"qr", None)
        .expect("setup succeeds");

    let submitted = harness
        .api
        .payments
        .submit_proof(
            adopter,
            payment.payment_id,
            b"receipt image",
            Some("TXN-204".to_string()),
        )
        .expect("proof submits");

    assert_eq!(submitted.status, PaymentStatus::Submitted);
    assert!(!submitted.status.is_terminal());
    assert!(submitted.date_submitted.is_some());
    assert_eq!(submitted.transaction_id.as_deref(), Some("TXN-204"));
    assert!(submitted
        .proof_of_transaction
        .as_deref()
        .unwrap_or_default()
        .starts_with("asset://"));
}

#[test]
fn submit_proof_is_reserved_for_the_paying_adopter() {
    let harness = build_harness();
    let (_, application_id) = approved_application(&harness);
    let stranger = seed_adopter(&harness.store, 2);

    let payment = harness
        .api
        .payments
        .setup(org_actor(), application_id, b"qr", None)
        .expect("setup succeeds");

    assert!(matches!(
        harness
            .api
            .payments
            .submit_proof(stranger, payment.payment_id, b"proof", None),
        Err(WorkflowError::Authorization(_))
    ));
    assert!(matches!(
        harness
            .api
            .payments
            .submit_proof(org_actor(), payment.payment_id, b"proof", None),
        Err(WorkflowError::Authorization(_))
    ));
}

#[test]
fn repeated_proof_submission_conflicts() {
    let harness = build_harness();
    let (adopter, application_id) = approved_application(&harness);

    let payment = harness
        .api
        .payments
        .setup(org_actor(), application_id, b"qr", None)
        .expect("setup succeeds");
    harness
        .api
        .payments
        .submit_proof(adopter, payment.payment_id, b"proof", None)
        .expect("first proof submits");

    match harness
        .api
        .payments
        .submit_proof(adopter, payment.payment_id, b"proof", None)
    {
        Err(WorkflowError::Conflict(message)) => {
            assert!(message.contains("pending payments"));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn verify_is_terminal_and_idempotent_under_retry() {
    let harness = build_harness();
    let (adopter, application_id) = approved_application(&harness);

    let payment = harness
        .api
        .payments
        .setup(org_actor(), application_id, b"qr", None)
        .expect("setup succeeds");
    harness
        .api
        .payments
        .submit_proof(adopter, payment.payment_id, b"proof", None)
        .expect("proof submits");

    let verified = harness
        .api
        .payments
        .verify(org_actor(), payment.payment_id, PaymentDecision::Verified, None)
        .expect("verification succeeds");
    assert_eq!(verified.status, PaymentStatus::Verified);
    assert!(verified.status.is_terminal());
    let stamp = verified.date_verified.expect("verification stamped");

    match harness
        .api
        .payments
        .verify(org_actor(), payment.payment_id, PaymentDecision::Verified, None)
    {
        Err(WorkflowError::Conflict(message)) => {
            assert!(message.contains("only submitted payments can be verified"));
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let stored = harness
        .api
        .payments
        .check(adopter, application_id)
        .expect("check succeeds")
        .expect("payment present");
    assert_eq!(stored.status, PaymentStatus::Verified);
    assert_eq!(stored.date_verified, Some(stamp));
}

#[test]
fn verify_requires_a_submitted_payment() {
    let harness = build_harness();
    let (_, application_id) = approved_application(&harness);

    let payment = harness
        .api
        .payments
        .setup(org_actor(), application_id, b"qr", None)
        .expect("setup succeeds");

    assert!(matches!(
        harness.api.payments.verify(
            org_actor(),
            payment.payment_id,
            PaymentDecision::Verified,
            None
        ),
        Err(WorkflowError::Conflict(_))
    ));
}

#[test]
fn check_is_restricted_to_the_two_parties() {
    let harness = build_harness();
    let (adopter, application_id) = approved_application(&harness);
    let stranger = seed_adopter(&harness.store, 2);

    assert!(harness
        .api
        .payments
        .check(adopter, application_id)
        .expect("adopter may check")
        .is_none());
    assert!(harness
        .api
        .payments
        .check(org_actor(), application_id)
        .expect("organization may check")
        .is_none());
    assert!(matches!(
        harness.api.payments.check(stranger, application_id),
        Err(WorkflowError::Authorization(_))
    ));
}

#[test]
fn asset_failure_surfaces_as_internal_error() {
    let harness = build_harness();
    let (_, application_id) = approved_application(&harness);

    // The in-memory asset store refuses empty uploads.
    assert!(matches!(
        harness
            .api
            .payments
            .setup(org_actor(), application_id, b"", None),
        Err(WorkflowError::Internal(_))
    ));
}
