use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::domain::{
    Adopter, AdopterId, AdoptionApplication, ApplicationId, ApplicationStatus, Payment, PaymentId,
    PaymentStatus, Pet, PetId, PetStatus,
};
use super::sequence::{Sequence, SequenceAllocator};
use super::store::{
    AdoptionStore, ApplicationChange, AssetError, AssetStore, PaymentChange, SiblingRejection,
    StoreError,
};

#[derive(Default)]
struct Tables {
    adopters: HashMap<AdopterId, Adopter>,
    pets: HashMap<PetId, Pet>,
    applications: HashMap<ApplicationId, AdoptionApplication>,
    payments: HashMap<PaymentId, Payment>,
    counters: HashMap<Sequence, u64>,
}

/// Thread-safe in-memory store implementing the conditional-update contract.
///
/// A single mutex guards all tables, so each trait method is one atomic
/// storage operation the way a document database's conditional update would
/// be. Suitable for tests and single-process deployments.
#[derive(Default, Clone)]
pub struct InMemoryAdoptionStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryAdoptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut guard = self.tables.lock().expect("store mutex poisoned");
        f(&mut guard)
    }
}

impl SequenceAllocator for InMemoryAdoptionStore {
    fn allocate(&self, sequence: Sequence) -> Result<u64, StoreError> {
        self.with_tables(|tables| {
            let counter = tables.counters.entry(sequence).or_insert(0);
            *counter += 1;
            Ok(*counter)
        })
    }
}

impl AdoptionStore for InMemoryAdoptionStore {
    fn insert_adopter(&self, adopter: Adopter) -> Result<Adopter, StoreError> {
        self.with_tables(|tables| {
            if tables.adopters.contains_key(&adopter.adopter_id) {
                return Err(StoreError::Conflict);
            }
            tables.adopters.insert(adopter.adopter_id, adopter.clone());
            Ok(adopter)
        })
    }

    fn fetch_adopter(&self, id: AdopterId) -> Result<Option<Adopter>, StoreError> {
        self.with_tables(|tables| Ok(tables.adopters.get(&id).cloned()))
    }

    fn insert_pet(&self, pet: Pet) -> Result<Pet, StoreError> {
        self.with_tables(|tables| {
            if tables.pets.contains_key(&pet.pet_id) {
                return Err(StoreError::Conflict);
            }
            tables.pets.insert(pet.pet_id, pet.clone());
            Ok(pet)
        })
    }

    fn fetch_pet(&self, id: PetId) -> Result<Option<Pet>, StoreError> {
        self.with_tables(|tables| Ok(tables.pets.get(&id).cloned()))
    }

    fn transition_pet(
        &self,
        id: PetId,
        expected: PetStatus,
        next: PetStatus,
    ) -> Result<bool, StoreError> {
        self.with_tables(|tables| match tables.pets.get_mut(&id) {
            Some(pet) if pet.status == expected => {
                pet.status = next;
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn insert_application(
        &self,
        application: AdoptionApplication,
    ) -> Result<AdoptionApplication, StoreError> {
        self.with_tables(|tables| {
            if tables.applications.contains_key(&application.application_id) {
                return Err(StoreError::Conflict);
            }
            let duplicate_pair = tables.applications.values().any(|existing| {
                existing.adopter_id == application.adopter_id
                    && existing.pet_id == application.pet_id
                    && existing.status.is_active()
            });
            if duplicate_pair {
                return Err(StoreError::Conflict);
            }
            tables
                .applications
                .insert(application.application_id, application.clone());
            Ok(application)
        })
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<AdoptionApplication>, StoreError> {
        self.with_tables(|tables| Ok(tables.applications.get(&id).cloned()))
    }

    fn active_application(
        &self,
        adopter: AdopterId,
        pet: PetId,
    ) -> Result<Option<AdoptionApplication>, StoreError> {
        self.with_tables(|tables| {
            Ok(tables
                .applications
                .values()
                .find(|application| {
                    application.adopter_id == adopter
                        && application.pet_id == pet
                        && application.status.is_active()
                })
                .cloned())
        })
    }

    fn applications_for_pet(&self, pet: PetId) -> Result<Vec<AdoptionApplication>, StoreError> {
        self.with_tables(|tables| {
            let mut matches: Vec<_> = tables
                .applications
                .values()
                .filter(|application| application.pet_id == pet)
                .cloned()
                .collect();
            matches.sort_by_key(|application| application.application_id);
            Ok(matches)
        })
    }

    fn transition_application(
        &self,
        id: ApplicationId,
        expected: &[ApplicationStatus],
        change: ApplicationChange,
    ) -> Result<Option<AdoptionApplication>, StoreError> {
        self.with_tables(|tables| match tables.applications.get_mut(&id) {
            Some(application) if expected.contains(&application.status) => {
                application.status = change.status;
                if change.rejection_reason.is_some() {
                    application.rejection_reason = change.rejection_reason;
                }
                if change.reviewed_by.is_some() {
                    application.reviewed_by = change.reviewed_by;
                }
                application.updated_at = change.at;
                Ok(Some(application.clone()))
            }
            _ => Ok(None),
        })
    }

    fn reject_open_siblings(
        &self,
        pet: PetId,
        keep: Option<ApplicationId>,
        rejection: SiblingRejection,
    ) -> Result<usize, StoreError> {
        self.with_tables(|tables| {
            let mut matched = 0;
            for application in tables.applications.values_mut() {
                if application.pet_id != pet
                    || Some(application.application_id) == keep
                    || !application.status.is_open()
                {
                    continue;
                }
                application.status = ApplicationStatus::Rejected;
                application.rejection_reason = Some(rejection.reason.clone());
                application.reviewed_by = Some(rejection.reviewed_by);
                application.updated_at = rejection.at;
                matched += 1;
            }
            Ok(matched)
        })
    }

    fn delete_rejected_application(&self, id: ApplicationId) -> Result<bool, StoreError> {
        self.with_tables(|tables| match tables.applications.get(&id) {
            Some(application) if application.status == ApplicationStatus::Rejected => {
                tables.applications.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        self.with_tables(|tables| {
            if tables.payments.contains_key(&payment.payment_id) {
                return Err(StoreError::Conflict);
            }
            let active_exists = tables.payments.values().any(|existing| {
                existing.application_id == payment.application_id
                    && existing.status != PaymentStatus::Rejected
            });
            if active_exists {
                return Err(StoreError::Conflict);
            }
            tables.payments.insert(payment.payment_id, payment.clone());
            Ok(payment)
        })
    }

    fn fetch_payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        self.with_tables(|tables| Ok(tables.payments.get(&id).cloned()))
    }

    fn payments_for_application(
        &self,
        application: ApplicationId,
    ) -> Result<Vec<Payment>, StoreError> {
        self.with_tables(|tables| {
            let mut matches: Vec<_> = tables
                .payments
                .values()
                .filter(|payment| payment.application_id == application)
                .cloned()
                .collect();
            matches.sort_by_key(|payment| payment.payment_id);
            Ok(matches)
        })
    }

    fn transition_payment(
        &self,
        id: PaymentId,
        expected: PaymentStatus,
        change: PaymentChange,
    ) -> Result<Option<Payment>, StoreError> {
        self.with_tables(|tables| match tables.payments.get_mut(&id) {
            Some(payment) if payment.status == expected => {
                payment.status = change.status;
                if change.proof_of_transaction.is_some() {
                    payment.proof_of_transaction = change.proof_of_transaction;
                }
                if change.transaction_id.is_some() {
                    payment.transaction_id = change.transaction_id;
                }
                if change.organization_notes.is_some() {
                    payment.organization_notes = change.organization_notes;
                }
                match change.status {
                    PaymentStatus::Submitted => {
                        payment.date_submitted.get_or_insert(change.at);
                    }
                    PaymentStatus::Verified | PaymentStatus::Rejected => {
                        payment.date_verified.get_or_insert(change.at);
                    }
                    PaymentStatus::Pending => {}
                }
                Ok(Some(payment.clone()))
            }
            _ => Ok(None),
        })
    }

    fn adopted_pets_with_open_applications(&self) -> Result<Vec<PetId>, StoreError> {
        self.with_tables(|tables| {
            let mut pets: Vec<_> = tables
                .pets
                .values()
                .filter(|pet| pet.status == PetStatus::Adopted)
                .filter(|pet| {
                    tables.applications.values().any(|application| {
                        application.pet_id == pet.pet_id && application.status.is_open()
                    })
                })
                .map(|pet| pet.pet_id)
                .collect();
            pets.sort();
            Ok(pets)
        })
    }
}

/// Asset store that fabricates stable URLs without real uploads.
#[derive(Default, Clone)]
pub struct InMemoryAssetStore {
    uploaded: Arc<AtomicU64>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assets stored so far.
    pub fn uploaded(&self) -> u64 {
        self.uploaded.load(Ordering::Relaxed)
    }
}

impl AssetStore for InMemoryAssetStore {
    fn put(&self, label: &str, bytes: &[u8]) -> Result<String, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::Transport("empty upload".to_string()));
        }
        let serial = self.uploaded.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("asset://pawhaven/{serial}/{label}"))
    }
}
