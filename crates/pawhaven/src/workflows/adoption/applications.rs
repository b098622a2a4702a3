use std::sync::Arc;

use chrono::Utc;

use crate::config::WorkflowConfig;

use super::cascade::{self, ReconciliationReport, OPEN_STATUSES};
use super::domain::{
    Actor, ActorKind, AdopterId, AdoptionApplication, ApplicationForm, ApplicationId,
    ApplicationStatus, PetId, PetStatus,
};
use super::errors::WorkflowError;
use super::sequence::Sequence;
use super::store::{AdoptionStore, ApplicationChange, StoreError};

/// Service owning the adoption-application lifecycle: intake, review
/// transitions, the approval cascade, deletion, and reconciliation.
pub struct ApplicationWorkflow<S> {
    store: Arc<S>,
    config: WorkflowConfig,
}

impl<S> ApplicationWorkflow<S>
where
    S: AdoptionStore + 'static,
{
    pub fn new(store: Arc<S>, config: WorkflowConfig) -> Self {
        Self { store, config }
    }

    /// Submit a new application for an available pet.
    pub fn submit(
        &self,
        actor: Actor,
        pet_id: PetId,
        form: ApplicationForm,
    ) -> Result<AdoptionApplication, WorkflowError> {
        if actor.kind != ActorKind::Adopter {
            return Err(WorkflowError::authorization(
                "only adopters can submit adoption applications",
            ));
        }
        let adopter_id = AdopterId(actor.id);
        let adopter = self
            .store
            .fetch_adopter(adopter_id)?
            .ok_or_else(|| WorkflowError::not_found("adopter account not found"))?;
        if !adopter.active {
            return Err(WorkflowError::precondition(
                "adopter account is not active",
            ));
        }

        let pet = self
            .store
            .fetch_pet(pet_id)?
            .ok_or_else(|| WorkflowError::not_found("pet not found"))?;
        if pet.status != PetStatus::Available {
            return Err(WorkflowError::precondition(
                "pet is not available for adoption",
            ));
        }

        if self.store.active_application(adopter_id, pet_id)?.is_some() {
            return Err(WorkflowError::conflict(
                "you already have an active application for this pet",
            ));
        }

        let now = Utc::now();
        for _ in 0..self.config.sequence_retries {
            let application_id = ApplicationId(self.store.allocate(Sequence::Application)?);
            let application = AdoptionApplication {
                application_id,
                adopter_id,
                pet_id,
                organization_id: pet.organization_id,
                form: form.clone(),
                status: ApplicationStatus::Pending,
                rejection_reason: None,
                reviewed_by: None,
                submitted_at: now,
                updated_at: now,
            };
            match self.store.insert_application(application) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::Conflict) => {
                    // Either the allocated id collided or a concurrent
                    // submission won the pair-uniqueness guard; re-read to
                    // tell the two apart before retrying.
                    if self.store.active_application(adopter_id, pet_id)?.is_some() {
                        return Err(WorkflowError::conflict(
                            "you already have an active application for this pet",
                        ));
                    }
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(WorkflowError::conflict(
            "could not allocate a unique application id",
        ))
    }

    /// Fetch an application on behalf of its adopter or owning organization.
    ///
    /// Doubles as the reconciliation read path: an application found open
    /// under an already-adopted pet triggers the idempotent sibling
    /// rejection before the record is returned.
    pub fn get(
        &self,
        application_id: ApplicationId,
        actor: Actor,
    ) -> Result<AdoptionApplication, WorkflowError> {
        let application = self.fetch(application_id)?;
        if !actor.is_adopter(application.adopter_id)
            && !actor.is_organization(application.organization_id)
        {
            return Err(WorkflowError::authorization(
                "application is only visible to its adopter and organization",
            ));
        }

        if application.status.is_open() {
            if let Some(pet) = self.store.fetch_pet(application.pet_id)? {
                if pet.status == PetStatus::Adopted {
                    cascade::reconcile_pet(self.store.as_ref(), pet.pet_id)?;
                    return self.fetch(application_id);
                }
            }
        }
        Ok(application)
    }

    /// Move an application to `new_status`, enforcing who may do what and
    /// performing the write as a conditional update on the expected prior
    /// statuses. Approval additionally runs the adoption cascade.
    pub fn transition(
        &self,
        application_id: ApplicationId,
        new_status: ApplicationStatus,
        actor: Actor,
        notes: Option<String>,
    ) -> Result<AdoptionApplication, WorkflowError> {
        let application = self.fetch(application_id)?;
        let now = Utc::now();

        match new_status {
            ApplicationStatus::Pending => Err(WorkflowError::validation(
                "applications cannot be moved back to pending",
            )),
            ApplicationStatus::Withdrawn => {
                if !actor.is_adopter(application.adopter_id) {
                    return Err(WorkflowError::authorization(
                        "only the submitting adopter can withdraw an application",
                    ));
                }
                self.conditional(
                    application_id,
                    ApplicationChange {
                        status: ApplicationStatus::Withdrawn,
                        rejection_reason: None,
                        reviewed_by: None,
                        at: now,
                    },
                )
            }
            ApplicationStatus::Reviewing => {
                self.authorize_organization(&application, actor, "review")?;
                self.conditional(
                    application_id,
                    ApplicationChange {
                        status: ApplicationStatus::Reviewing,
                        rejection_reason: None,
                        reviewed_by: Some(application.organization_id),
                        at: now,
                    },
                )
            }
            ApplicationStatus::Rejected => {
                self.authorize_organization(&application, actor, "reject")?;
                self.conditional(
                    application_id,
                    ApplicationChange {
                        status: ApplicationStatus::Rejected,
                        rejection_reason: notes,
                        reviewed_by: Some(application.organization_id),
                        at: now,
                    },
                )
            }
            ApplicationStatus::Approved => {
                self.authorize_organization(&application, actor, "approve")?;
                cascade::approve(
                    self.store.as_ref(),
                    &application,
                    application.organization_id,
                    now,
                )
            }
        }
    }

    /// Remove a rejected application at the owning organization's request.
    pub fn delete(&self, application_id: ApplicationId, actor: Actor) -> Result<(), WorkflowError> {
        let application = self.fetch(application_id)?;
        self.authorize_organization(&application, actor, "delete")?;
        if application.status != ApplicationStatus::Rejected {
            return Err(WorkflowError::precondition(
                "only rejected applications can be deleted",
            ));
        }
        if !self.store.delete_rejected_application(application_id)? {
            return Err(WorkflowError::conflict(
                "application state has changed, refresh and retry",
            ));
        }
        Ok(())
    }

    /// Sweep repairing every pet adopted while sibling applications remained
    /// open (a crash between the cascade's pet flip and its bulk rejection).
    pub fn reconcile(&self) -> Result<ReconciliationReport, WorkflowError> {
        Ok(cascade::reconcile_all(self.store.as_ref())?)
    }

    fn fetch(&self, application_id: ApplicationId) -> Result<AdoptionApplication, WorkflowError> {
        self.store
            .fetch_application(application_id)?
            .ok_or_else(|| WorkflowError::not_found("application not found"))
    }

    fn conditional(
        &self,
        application_id: ApplicationId,
        change: ApplicationChange,
    ) -> Result<AdoptionApplication, WorkflowError> {
        self.store
            .transition_application(application_id, &OPEN_STATUSES, change)?
            .ok_or_else(|| {
                WorkflowError::conflict("application state has changed, refresh and retry")
            })
    }

    fn authorize_organization(
        &self,
        application: &AdoptionApplication,
        actor: Actor,
        action: &str,
    ) -> Result<(), WorkflowError> {
        if actor.is_organization(application.organization_id) {
            Ok(())
        } else {
            Err(WorkflowError::authorization(format!(
                "only the organization responsible for this pet can {action} the application"
            )))
        }
    }
}
