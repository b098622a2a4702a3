//! Adoption-application and payment-verification workflows.
//!
//! Pet availability, application approval state, and payment verification
//! state stay mutually consistent under concurrent callers because every
//! status transition is a conditional update keyed on the expected prior
//! state; the matched result, not a prior read, decides whether the caller
//! won the transition.

pub(crate) mod cascade;
pub mod domain;
pub mod errors;
pub mod memory;
pub mod sequence;
pub mod store;

pub mod applications;
pub mod payments;
pub mod router;

#[cfg(test)]
mod tests;

pub use applications::ApplicationWorkflow;
pub use cascade::ReconciliationReport;
pub use domain::{
    Actor, ActorKind, Adopter, AdopterId, AdoptionApplication, ApplicationForm, ApplicationId,
    ApplicationStatus, OrganizationId, Payment, PaymentDecision, PaymentId, PaymentStatus, Pet,
    PetId, PetStatus, ADOPTED_BY_ANOTHER,
};
pub use errors::WorkflowError;
pub use memory::{InMemoryAdoptionStore, InMemoryAssetStore};
pub use payments::PaymentWorkflow;
pub use router::{adoption_router, AdoptionApi};
pub use sequence::{Sequence, SequenceAllocator};
pub use store::{
    AdoptionStore, ApplicationChange, AssetError, AssetStore, PaymentChange, SiblingRejection,
    StoreError,
};
