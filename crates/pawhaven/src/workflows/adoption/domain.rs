use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sequential display identifier for a pet listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PetId(pub u64);

/// Identifier for an adopter account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdopterId(pub u64);

/// Identifier for a rescue organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub u64);

/// Sequential identifier for an adoption application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

/// Sequential identifier for a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaymentId(pub u64);

/// Rejection reason written onto sibling applications when a pet is adopted.
pub const ADOPTED_BY_ANOTHER: &str = "This pet has been adopted by another applicant.";

/// Availability of a pet listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetStatus {
    Rehabilitating,
    Available,
    Adopted,
}

impl PetStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PetStatus::Rehabilitating => "rehabilitating",
            PetStatus::Available => "available",
            PetStatus::Adopted => "adopted",
        }
    }
}

/// A pet listed for adoption. `record_id` is the stable storage identity;
/// `pet_id` is the sequential display id used across the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub record_id: String,
    pub pet_id: PetId,
    pub name: String,
    pub species: String,
    pub status: PetStatus,
    pub organization_id: OrganizationId,
    /// Fee in whole currency units; snapshotted onto payments at setup time.
    pub adoption_fee: u32,
}

/// An adopter account as seen by this workflow. Account lifecycle is owned
/// by the external identity layer; only the active flag matters here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adopter {
    pub adopter_id: AdopterId,
    pub display_name: String,
    pub active: bool,
}

/// Status of an adoption application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Approved,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "reviewing" => Some(Self::Reviewing),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "withdrawn" => Some(Self::Withdrawn),
            _ => None,
        }
    }

    /// An application still counts against the one-active-application rule
    /// unless it reached `rejected` or `withdrawn`.
    pub const fn is_active(self) -> bool {
        !matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Withdrawn)
    }

    /// Open applications are the ones an organization can still act on.
    pub const fn is_open(self) -> bool {
        matches!(self, ApplicationStatus::Pending | ApplicationStatus::Reviewing)
    }
}

/// Questionnaire captured at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    pub residence_type: String,
    pub has_other_pets: bool,
    pub hours_alone_per_day: u8,
    pub motivation: String,
}

/// An adopter's request to adopt a specific pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdoptionApplication {
    pub application_id: ApplicationId,
    pub adopter_id: AdopterId,
    pub pet_id: PetId,
    /// Denormalized from the pet at submission time.
    pub organization_id: OrganizationId,
    pub form: ApplicationForm,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<OrganizationId>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Submitted,
    Verified,
    Rejected,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Submitted => "submitted",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Verified | PaymentStatus::Rejected)
    }
}

/// Terminal outcome an organization can record for a submitted payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDecision {
    Verified,
    Rejected,
}

impl PaymentDecision {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "verified" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub const fn status(self) -> PaymentStatus {
        match self {
            PaymentDecision::Verified => PaymentStatus::Verified,
            PaymentDecision::Rejected => PaymentStatus::Rejected,
        }
    }
}

/// Manually verified proof-of-transfer record tied to an approved application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: PaymentId,
    pub application_id: ApplicationId,
    pub pet_id: PetId,
    pub adopter_id: AdopterId,
    pub organization_id: OrganizationId,
    /// Snapshot of `Pet.adoption_fee` at setup time; later fee edits do not
    /// change an in-flight payment.
    pub amount: u32,
    pub qr_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_of_transaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_notes: Option<String>,
    pub status: PaymentStatus,
    pub date_created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_submitted: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_verified: Option<DateTime<Utc>>,
}

/// Caller identity resolved by the external auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: u64,
    pub kind: ActorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Adopter,
    Organization,
}

impl Actor {
    pub const fn adopter(id: AdopterId) -> Self {
        Self {
            id: id.0,
            kind: ActorKind::Adopter,
        }
    }

    pub const fn organization(id: OrganizationId) -> Self {
        Self {
            id: id.0,
            kind: ActorKind::Organization,
        }
    }

    pub fn is_adopter(&self, id: AdopterId) -> bool {
        self.kind == ActorKind::Adopter && self.id == id.0
    }

    pub fn is_organization(&self, id: OrganizationId) -> bool {
        self.kind == ActorKind::Organization && self.id == id.0
    }
}
