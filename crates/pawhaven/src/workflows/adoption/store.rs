use chrono::{DateTime, Utc};

use super::domain::{
    Adopter, AdopterId, AdoptionApplication, ApplicationId, ApplicationStatus, OrganizationId,
    Payment, PaymentId, PaymentStatus, Pet, PetId, PetStatus,
};
use super::sequence::SequenceAllocator;

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Fields written by a conditional application transition. Timestamps and
/// review metadata travel with the status so the write is a single document
/// update.
#[derive(Debug, Clone)]
pub struct ApplicationChange {
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_by: Option<OrganizationId>,
    pub at: DateTime<Utc>,
}

/// Fields written onto every open sibling application during the adoption
/// cascade's bulk rejection.
#[derive(Debug, Clone)]
pub struct SiblingRejection {
    pub reason: String,
    pub reviewed_by: OrganizationId,
    pub at: DateTime<Utc>,
}

/// Fields written by a conditional payment transition. The store sets
/// `date_submitted` / `date_verified` from `at` only when advancing into the
/// corresponding status and only if not already set.
#[derive(Debug, Clone)]
pub struct PaymentChange {
    pub status: PaymentStatus,
    pub proof_of_transaction: Option<String>,
    pub transaction_id: Option<String>,
    pub organization_notes: Option<String>,
    pub at: DateTime<Utc>,
}

/// Document persistence port for the adoption workflow.
///
/// Every status mutation is a conditional update filtered by the expected
/// prior state; callers inspect the returned document / matched count to
/// distinguish "I made the transition" from "someone already moved it".
/// No method reads, mutates in application code, and saves back.
pub trait AdoptionStore: SequenceAllocator {
    fn insert_adopter(&self, adopter: Adopter) -> Result<Adopter, StoreError>;
    fn fetch_adopter(&self, id: AdopterId) -> Result<Option<Adopter>, StoreError>;

    fn insert_pet(&self, pet: Pet) -> Result<Pet, StoreError>;
    fn fetch_pet(&self, id: PetId) -> Result<Option<Pet>, StoreError>;
    /// Flip a pet's status only if it currently matches `expected`. Returns
    /// whether a document matched.
    fn transition_pet(
        &self,
        id: PetId,
        expected: PetStatus,
        next: PetStatus,
    ) -> Result<bool, StoreError>;

    /// Fails with `Conflict` when the id is taken or when another active
    /// (neither rejected nor withdrawn) application already exists for the
    /// same `(adopter, pet)` pair; the storage-level guard closes the window
    /// left open by a separate existence check.
    fn insert_application(
        &self,
        application: AdoptionApplication,
    ) -> Result<AdoptionApplication, StoreError>;
    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<AdoptionApplication>, StoreError>;
    /// The at-most-one application for `(adopter, pet)` whose status is
    /// outside `{rejected, withdrawn}`.
    fn active_application(
        &self,
        adopter: AdopterId,
        pet: PetId,
    ) -> Result<Option<AdoptionApplication>, StoreError>;
    fn applications_for_pet(&self, pet: PetId) -> Result<Vec<AdoptionApplication>, StoreError>;
    /// Apply `change` only if the application's current status is one of
    /// `expected`. Returns the updated document, or `None` when nothing
    /// matched.
    fn transition_application(
        &self,
        id: ApplicationId,
        expected: &[ApplicationStatus],
        change: ApplicationChange,
    ) -> Result<Option<AdoptionApplication>, StoreError>;
    /// Bulk conditional update: every application for `pet` other than
    /// `keep` with an open status becomes `rejected`. Scoped by status so it
    /// is safe to re-issue. Returns the matched count.
    fn reject_open_siblings(
        &self,
        pet: PetId,
        keep: Option<ApplicationId>,
        rejection: SiblingRejection,
    ) -> Result<usize, StoreError>;
    /// Delete only if the application is currently `rejected`. Returns
    /// whether a document matched.
    fn delete_rejected_application(&self, id: ApplicationId) -> Result<bool, StoreError>;

    /// Fails with `Conflict` when the id is taken or when another
    /// non-`rejected` payment already exists for the same application; as
    /// with `insert_application`, the storage-level guard closes the window
    /// left open by a separate existence check.
    fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError>;
    fn fetch_payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError>;
    /// All payments recorded for an application, oldest first.
    fn payments_for_application(
        &self,
        application: ApplicationId,
    ) -> Result<Vec<Payment>, StoreError>;
    /// Apply `change` only if the payment's current status is `expected`.
    fn transition_payment(
        &self,
        id: PaymentId,
        expected: PaymentStatus,
        change: PaymentChange,
    ) -> Result<Option<Payment>, StoreError>;

    /// Pets in the "adopted but open applications remain" state, for the
    /// reconciliation sweep.
    fn adopted_pets_with_open_applications(&self) -> Result<Vec<PetId>, StoreError>;
}

/// Blob-storage boundary. Given raw bytes, returns a stable retrievable URL.
/// Uploads complete before any dependent write; an orphaned asset after a
/// failed write is accepted.
pub trait AssetStore: Send + Sync {
    fn put(&self, label: &str, bytes: &[u8]) -> Result<String, AssetError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset store unavailable: {0}")]
    Transport(String),
}
