use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    AdoptionApplication, ApplicationStatus, OrganizationId, PetId, PetStatus, ADOPTED_BY_ANOTHER,
};
use super::errors::WorkflowError;
use super::store::{AdoptionStore, ApplicationChange, SiblingRejection, StoreError};

pub(crate) const OPEN_STATUSES: [ApplicationStatus; 2] =
    [ApplicationStatus::Pending, ApplicationStatus::Reviewing];

/// The dependent writes triggered by one approval, in race-safe order:
///
/// 1. conditional pet flip to `adopted` keyed on the observed prior status;
///    losing this race aborts the approval before anything is written;
/// 2. conditional application transition to `approved`: a miss here reverts
///    the pet flip, so the flip is never visible without its approval;
/// 3. idempotent bulk rejection of open sibling applications: a failure
///    here is logged and repaired by reconciliation, the approval stands.
pub(crate) fn approve<S: AdoptionStore>(
    store: &S,
    application: &AdoptionApplication,
    organization: OrganizationId,
    now: DateTime<Utc>,
) -> Result<AdoptionApplication, WorkflowError> {
    let pet = store
        .fetch_pet(application.pet_id)?
        .ok_or_else(|| WorkflowError::not_found("pet not found"))?;
    if pet.status == PetStatus::Adopted {
        return Err(WorkflowError::conflict("this pet has already been adopted"));
    }

    if !store.transition_pet(pet.pet_id, pet.status, PetStatus::Adopted)? {
        return Err(WorkflowError::conflict("this pet has already been adopted"));
    }

    let change = ApplicationChange {
        status: ApplicationStatus::Approved,
        rejection_reason: None,
        reviewed_by: Some(organization),
        at: now,
    };
    let approved = match store.transition_application(
        application.application_id,
        &OPEN_STATUSES,
        change,
    )? {
        Some(updated) => updated,
        None => {
            // The application moved under us; undo the flip so the pet does
            // not stay adopted without an approved application.
            if !store.transition_pet(pet.pet_id, PetStatus::Adopted, pet.status)? {
                warn!(
                    pet_id = pet.pet_id.0,
                    "pet flip revert missed; leaving repair to reconciliation"
                );
            }
            return Err(WorkflowError::conflict(
                "application state has changed, refresh and retry",
            ));
        }
    };

    let rejection = SiblingRejection {
        reason: ADOPTED_BY_ANOTHER.to_string(),
        reviewed_by: organization,
        at: now,
    };
    match store.reject_open_siblings(pet.pet_id, Some(application.application_id), rejection) {
        Ok(rejected) if rejected > 0 => {
            info!(
                pet_id = pet.pet_id.0,
                rejected, "rejected sibling applications after approval"
            );
        }
        Ok(_) => {}
        Err(err) => {
            warn!(
                pet_id = pet.pet_id.0,
                error = %err,
                "sibling rejection failed after approval; deferring to reconciliation"
            );
        }
    }

    Ok(approved)
}

/// Outcome of a reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub pets_repaired: usize,
    pub applications_rejected: usize,
}

/// Re-issue the cascade's bulk rejection for one pet if it is adopted while
/// sibling applications remain open. Safe to call at any time; the bulk
/// update is scoped by open status and therefore idempotent.
pub(crate) fn reconcile_pet<S: AdoptionStore>(
    store: &S,
    pet_id: PetId,
) -> Result<usize, StoreError> {
    let pet = match store.fetch_pet(pet_id)? {
        Some(pet) if pet.status == PetStatus::Adopted => pet,
        _ => return Ok(0),
    };

    let keep = store
        .applications_for_pet(pet_id)?
        .into_iter()
        .find(|application| application.status == ApplicationStatus::Approved)
        .map(|application| application.application_id);

    let rejection = SiblingRejection {
        reason: ADOPTED_BY_ANOTHER.to_string(),
        reviewed_by: pet.organization_id,
        at: Utc::now(),
    };
    let rejected = store.reject_open_siblings(pet_id, keep, rejection)?;
    if rejected > 0 {
        info!(pet_id = pet_id.0, rejected, "reconciled adopted pet with open applications");
    }
    Ok(rejected)
}

/// Sweep every pet left in the "adopted but siblings still open" state.
pub(crate) fn reconcile_all<S: AdoptionStore>(
    store: &S,
) -> Result<ReconciliationReport, StoreError> {
    let mut report = ReconciliationReport::default();
    for pet_id in store.adopted_pets_with_open_applications()? {
        let rejected = reconcile_pet(store, pet_id)?;
        if rejected > 0 {
            report.pets_repaired += 1;
            report.applications_rejected += rejected;
        }
    }
    Ok(report)
}
