use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use pawhaven::workflows::adoption::{
    Adopter, AdopterId, AdoptionStore, InMemoryAdoptionStore, OrganizationId, Pet, PetId,
    PetStatus, StoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) const DEMO_ORG: OrganizationId = OrganizationId(1);

/// Adopters and pets normally arrive through the partner intake pipeline; the
/// demo and development deployments start from this small fixed catalog.
pub(crate) fn seed_demo_catalog(store: &InMemoryAdoptionStore) -> Result<(), StoreError> {
    for (id, name) in [(1, "Ana Reyes"), (2, "Ben Ocampo"), (3, "Carla Lim")] {
        store.insert_adopter(Adopter {
            adopter_id: AdopterId(id),
            display_name: name.to_string(),
            active: true,
        })?;
    }

    let pets = [
        (1, "Biscuit", "dog", PetStatus::Available, 500),
        (2, "Mochi", "cat", PetStatus::Available, 350),
        (3, "Pepper", "dog", PetStatus::Rehabilitating, 450),
    ];
    for (id, name, species, status, fee) in pets {
        store.insert_pet(Pet {
            record_id: format!("pet-{id:06}"),
            pet_id: PetId(id),
            name: name.to_string(),
            species: species.to_string(),
            status,
            organization_id: DEMO_ORG,
            adoption_fee: fee,
        })?;
    }

    Ok(())
}
