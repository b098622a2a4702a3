use std::sync::Arc;

use chrono::Utc;

use crate::config::WorkflowConfig;

use super::domain::{
    Actor, ActorKind, AdoptionApplication, ApplicationId, ApplicationStatus, Payment,
    PaymentDecision, PaymentId, PaymentStatus,
};
use super::errors::WorkflowError;
use super::sequence::Sequence;
use super::store::{AdoptionStore, AssetStore, PaymentChange, StoreError};

/// Service advancing the payment record for an approved application:
/// `pending -> submitted -> {verified, rejected}`.
pub struct PaymentWorkflow<S, A> {
    store: Arc<S>,
    assets: Arc<A>,
    config: WorkflowConfig,
}

impl<S, A> PaymentWorkflow<S, A>
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    pub fn new(store: Arc<S>, assets: Arc<A>, config: WorkflowConfig) -> Self {
        Self {
            store,
            assets,
            config,
        }
    }

    /// Create the payment record for an approved application.
    ///
    /// The amount snapshots the pet's fee at call time. A fresh setup is
    /// only permitted when every prior payment for the application was
    /// terminally rejected. The QR asset uploads before any write; a failed
    /// write after a successful upload leaves an orphaned, harmless asset.
    pub fn setup(
        &self,
        actor: Actor,
        application_id: ApplicationId,
        qr_image: &[u8],
        instructions: Option<String>,
    ) -> Result<Payment, WorkflowError> {
        let application = self.fetch_application(application_id)?;
        if !actor.is_organization(application.organization_id) {
            return Err(WorkflowError::authorization(
                "only the organization that owns this application can set up its payment",
            ));
        }
        if application.status != ApplicationStatus::Approved {
            return Err(WorkflowError::precondition(
                "payment setup requires an approved application",
            ));
        }
        self.ensure_no_active_payment(application_id)?;

        let pet = self
            .store
            .fetch_pet(application.pet_id)?
            .ok_or_else(|| WorkflowError::not_found("pet not found"))?;

        let qr_url = self
            .assets
            .put(&format!("qr-{}.png", application_id.0), qr_image)?;

        let now = Utc::now();
        for _ in 0..self.config.sequence_retries {
            let payment_id = PaymentId(self.store.allocate(Sequence::Payment)?);
            let payment = Payment {
                payment_id,
                application_id,
                pet_id: application.pet_id,
                adopter_id: application.adopter_id,
                organization_id: application.organization_id,
                amount: pet.adoption_fee,
                qr_image: qr_url.clone(),
                instructions: instructions.clone(),
                proof_of_transaction: None,
                transaction_id: None,
                organization_notes: None,
                status: PaymentStatus::Pending,
                date_created: now,
                date_submitted: None,
                date_verified: None,
            };
            match self.store.insert_payment(payment) {
                Ok(stored) => return Ok(stored),
                Err(StoreError::Conflict) => {
                    // Id collision or a concurrent setup; a fresh read tells
                    // the two apart before retrying allocation.
                    self.ensure_no_active_payment(application_id)?;
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(WorkflowError::conflict(
            "could not allocate a unique payment id",
        ))
    }

    /// Record the adopter's proof of transfer, advancing the payment from
    /// `pending` to `submitted`.
    pub fn submit_proof(
        &self,
        actor: Actor,
        payment_id: PaymentId,
        proof: &[u8],
        transaction_id: Option<String>,
    ) -> Result<Payment, WorkflowError> {
        let payment = self.fetch_payment(payment_id)?;
        if !actor.is_adopter(payment.adopter_id) {
            return Err(WorkflowError::authorization(
                "only the adopter responsible for this payment can submit proof",
            ));
        }

        let proof_url = self
            .assets
            .put(&format!("proof-{}.png", payment_id.0), proof)?;

        self.store
            .transition_payment(
                payment_id,
                PaymentStatus::Pending,
                PaymentChange {
                    status: PaymentStatus::Submitted,
                    proof_of_transaction: Some(proof_url),
                    transaction_id,
                    organization_notes: None,
                    at: Utc::now(),
                },
            )?
            .ok_or_else(|| {
                WorkflowError::conflict("proof can only be submitted for pending payments")
            })
    }

    /// Record the organization's decision for a submitted payment. Terminal;
    /// a repeated call observes no matching document and conflicts.
    pub fn verify(
        &self,
        actor: Actor,
        payment_id: PaymentId,
        decision: PaymentDecision,
        notes: Option<String>,
    ) -> Result<Payment, WorkflowError> {
        let payment = self.fetch_payment(payment_id)?;
        if !actor.is_organization(payment.organization_id) {
            return Err(WorkflowError::authorization(
                "only the organization that owns this payment can verify it",
            ));
        }

        self.store
            .transition_payment(
                payment_id,
                PaymentStatus::Submitted,
                PaymentChange {
                    status: decision.status(),
                    proof_of_transaction: None,
                    transaction_id: None,
                    organization_notes: notes,
                    at: Utc::now(),
                },
            )?
            .ok_or_else(|| WorkflowError::conflict("only submitted payments can be verified"))
    }

    /// Latest payment recorded for an application, visible to either party.
    pub fn check(
        &self,
        actor: Actor,
        application_id: ApplicationId,
    ) -> Result<Option<Payment>, WorkflowError> {
        let application = self.fetch_application(application_id)?;
        let authorized = match actor.kind {
            ActorKind::Adopter => actor.is_adopter(application.adopter_id),
            ActorKind::Organization => actor.is_organization(application.organization_id),
        };
        if !authorized {
            return Err(WorkflowError::authorization(
                "payment status is only visible to the application's adopter and organization",
            ));
        }

        let payments = self.store.payments_for_application(application_id)?;
        Ok(payments.into_iter().last())
    }

    fn ensure_no_active_payment(&self, application_id: ApplicationId) -> Result<(), WorkflowError> {
        let payments = self.store.payments_for_application(application_id)?;
        if payments
            .iter()
            .any(|payment| payment.status != PaymentStatus::Rejected)
        {
            return Err(WorkflowError::conflict(
                "a payment already exists for this application",
            ));
        }
        Ok(())
    }

    fn fetch_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<AdoptionApplication, WorkflowError> {
        self.store
            .fetch_application(application_id)?
            .ok_or_else(|| WorkflowError::not_found("application not found"))
    }

    fn fetch_payment(&self, payment_id: PaymentId) -> Result<Payment, WorkflowError> {
        self.store
            .fetch_payment(payment_id)?
            .ok_or_else(|| WorkflowError::not_found("payment not found"))
    }
}
