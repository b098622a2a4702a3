use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::config::WorkflowConfig;
use crate::workflows::adoption::domain::{
    Actor, Adopter, AdopterId, AdoptionApplication, ApplicationForm, ApplicationId,
    ApplicationStatus, OrganizationId, Payment, PaymentId, PaymentStatus, Pet, PetId, PetStatus,
};
use crate::workflows::adoption::memory::{InMemoryAdoptionStore, InMemoryAssetStore};
use crate::workflows::adoption::sequence::{Sequence, SequenceAllocator};
use crate::workflows::adoption::store::{
    AdoptionStore, ApplicationChange, PaymentChange, SiblingRejection, StoreError,
};
use crate::workflows::adoption::{
    adoption_router, AdoptionApi, ApplicationWorkflow, PaymentWorkflow,
};

pub(super) const ORG: OrganizationId = OrganizationId(10);
pub(super) const OTHER_ORG: OrganizationId = OrganizationId(11);

pub(super) fn org_actor() -> Actor {
    Actor::organization(ORG)
}

pub(super) fn other_org_actor() -> Actor {
    Actor::organization(OTHER_ORG)
}

pub(super) fn seed_adopter(store: &InMemoryAdoptionStore, id: u64) -> Actor {
    store
        .insert_adopter(Adopter {
            adopter_id: AdopterId(id),
            display_name: format!("adopter-{id}"),
            active: true,
        })
        .expect("adopter seeds");
    Actor::adopter(AdopterId(id))
}

pub(super) fn seed_inactive_adopter(store: &InMemoryAdoptionStore, id: u64) -> Actor {
    store
        .insert_adopter(Adopter {
            adopter_id: AdopterId(id),
            display_name: format!("adopter-{id}"),
            active: false,
        })
        .expect("adopter seeds");
    Actor::adopter(AdopterId(id))
}

pub(super) fn seed_pet(store: &InMemoryAdoptionStore, id: u64, status: PetStatus) -> PetId {
    seed_pet_for(store, id, ORG, status, 500)
}

pub(super) fn seed_pet_for(
    store: &InMemoryAdoptionStore,
    id: u64,
    organization: OrganizationId,
    status: PetStatus,
    fee: u32,
) -> PetId {
    store
        .insert_pet(Pet {
            record_id: format!("pet-{id:06}"),
            pet_id: PetId(id),
            name: "Biscuit".to_string(),
            species: "dog".to_string(),
            status,
            organization_id: organization,
            adoption_fee: fee,
        })
        .expect("pet seeds");
    PetId(id)
}

pub(super) fn form() -> ApplicationForm {
    ApplicationForm {
        residence_type: "house with yard".to_string(),
        has_other_pets: false,
        hours_alone_per_day: 4,
        motivation: "Looking for a companion for daily walks.".to_string(),
    }
}

pub(super) struct TestHarness {
    pub(super) store: Arc<InMemoryAdoptionStore>,
    pub(super) assets: Arc<InMemoryAssetStore>,
    pub(super) api: Arc<AdoptionApi<InMemoryAdoptionStore, InMemoryAssetStore>>,
}

pub(super) fn build_harness() -> TestHarness {
    let store = Arc::new(InMemoryAdoptionStore::new());
    let assets = Arc::new(InMemoryAssetStore::new());
    let api = Arc::new(AdoptionApi {
        applications: ApplicationWorkflow::new(store.clone(), WorkflowConfig::default()),
        payments: PaymentWorkflow::new(store.clone(), assets.clone(), WorkflowConfig::default()),
    });
    TestHarness { store, assets, api }
}

pub(super) fn build_router() -> (axum::Router, TestHarness) {
    let harness = build_harness();
    (adoption_router(harness.api.clone()), harness)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store wrapper whose bulk sibling rejection can be made to fail once,
/// simulating a crash between the cascade's pet flip and its cleanup.
pub(super) struct FailingSiblingStore {
    inner: InMemoryAdoptionStore,
    fail_next: AtomicBool,
}

impl FailingSiblingStore {
    pub(super) fn new(inner: InMemoryAdoptionStore) -> Self {
        Self {
            inner,
            fail_next: AtomicBool::new(false),
        }
    }

    pub(super) fn arm(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub(super) fn inner(&self) -> &InMemoryAdoptionStore {
        &self.inner
    }
}

impl SequenceAllocator for FailingSiblingStore {
    fn allocate(&self, sequence: Sequence) -> Result<u64, StoreError> {
        self.inner.allocate(sequence)
    }
}

impl AdoptionStore for FailingSiblingStore {
    fn insert_adopter(&self, adopter: Adopter) -> Result<Adopter, StoreError> {
        self.inner.insert_adopter(adopter)
    }

    fn fetch_adopter(&self, id: AdopterId) -> Result<Option<Adopter>, StoreError> {
        self.inner.fetch_adopter(id)
    }

    fn insert_pet(&self, pet: Pet) -> Result<Pet, StoreError> {
        self.inner.insert_pet(pet)
    }

    fn fetch_pet(&self, id: PetId) -> Result<Option<Pet>, StoreError> {
        self.inner.fetch_pet(id)
    }

    fn transition_pet(
        &self,
        id: PetId,
        expected: PetStatus,
        next: PetStatus,
    ) -> Result<bool, StoreError> {
        self.inner.transition_pet(id, expected, next)
    }

    fn insert_application(
        &self,
        application: AdoptionApplication,
    ) -> Result<AdoptionApplication, StoreError> {
        self.inner.insert_application(application)
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<AdoptionApplication>, StoreError> {
        self.inner.fetch_application(id)
    }

    fn active_application(
        &self,
        adopter: AdopterId,
        pet: PetId,
    ) -> Result<Option<AdoptionApplication>, StoreError> {
        self.inner.active_application(adopter, pet)
    }

    fn applications_for_pet(&self, pet: PetId) -> Result<Vec<AdoptionApplication>, StoreError> {
        self.inner.applications_for_pet(pet)
    }

    fn transition_application(
        &self,
        id: ApplicationId,
        expected: &[ApplicationStatus],
        change: ApplicationChange,
    ) -> Result<Option<AdoptionApplication>, StoreError> {
        self.inner.transition_application(id, expected, change)
    }

    fn reject_open_siblings(
        &self,
        pet: PetId,
        keep: Option<ApplicationId>,
        rejection: SiblingRejection,
    ) -> Result<usize, StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected fault".to_string()));
        }
        self.inner.reject_open_siblings(pet, keep, rejection)
    }

    fn delete_rejected_application(&self, id: ApplicationId) -> Result<bool, StoreError> {
        self.inner.delete_rejected_application(id)
    }

    fn insert_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        self.inner.insert_payment(payment)
    }

    fn fetch_payment(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        self.inner.fetch_payment(id)
    }

    fn payments_for_application(
        &self,
        application: ApplicationId,
    ) -> Result<Vec<Payment>, StoreError> {
        self.inner.payments_for_application(application)
    }

    fn transition_payment(
        &self,
        id: PaymentId,
        expected: PaymentStatus,
        change: PaymentChange,
    ) -> Result<Option<Payment>, StoreError> {
        self.inner.transition_payment(id, expected, change)
    }

    fn adopted_pets_with_open_applications(&self) -> Result<Vec<PetId>, StoreError> {
        self.inner.adopted_pets_with_open_applications()
    }
}
