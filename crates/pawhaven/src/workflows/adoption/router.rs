use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::applications::ApplicationWorkflow;
use super::domain::{
    Actor, ActorKind, ApplicationForm, ApplicationId, ApplicationStatus, PaymentDecision,
    PaymentId, PetId,
};
use super::errors::WorkflowError;
use super::payments::PaymentWorkflow;
use super::store::{AdoptionStore, AssetStore};

/// The two workflow services behind the HTTP surface, sharing one store.
pub struct AdoptionApi<S, A> {
    pub applications: ApplicationWorkflow<S>,
    pub payments: PaymentWorkflow<S, A>,
}

/// Router builder exposing the adoption and payment endpoints.
pub fn adoption_router<S, A>(api: Arc<AdoptionApi<S, A>>) -> Router
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    Router::new()
        .route("/adoptions", post(submit_handler::<S, A>))
        .route("/adoptions/:application_id", get(get_handler::<S, A>))
        .route("/adoptions/:application_id", put(transition_handler::<S, A>))
        .route(
            "/adoptions/:application_id/delete",
            delete(delete_handler::<S, A>),
        )
        .route("/payments/setup", post(payment_setup_handler::<S, A>))
        .route("/payments/submit", post(payment_submit_handler::<S, A>))
        .route("/payments/verify", put(payment_verify_handler::<S, A>))
        .route("/payments/check", get(payment_check_handler::<S, A>))
        .with_state(api)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    pub pet_id: u64,
    pub form: ApplicationForm,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSetupRequest {
    pub application_id: u64,
    pub qr_image: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSubmitRequest {
    pub payment_id: u64,
    pub proof_of_transaction: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerifyRequest {
    pub payment_id: u64,
    pub decision: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCheckQuery {
    pub application_id: u64,
}

pub(crate) async fn submit_handler<S, A>(
    State(api): State<Arc<AdoptionApi<S, A>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<SubmitApplicationRequest>,
) -> Response
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return failure(err),
    };
    match api
        .applications
        .submit(actor, PetId(request.pet_id), request.form)
    {
        Ok(application) => success("application submitted", &application),
        Err(err) => failure(err),
    }
}

pub(crate) async fn get_handler<S, A>(
    State(api): State<Arc<AdoptionApi<S, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Response
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return failure(err),
    };
    match api
        .applications
        .get(ApplicationId(application_id), actor)
    {
        Ok(application) => success("application found", &application),
        Err(err) => failure(err),
    }
}

pub(crate) async fn transition_handler<S, A>(
    State(api): State<Arc<AdoptionApi<S, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return failure(err),
    };
    let Some(status) = ApplicationStatus::parse(&request.status) else {
        return failure(WorkflowError::validation(format!(
            "unknown application status '{}'",
            request.status
        )));
    };
    match api
        .applications
        .transition(ApplicationId(application_id), status, actor, request.notes)
    {
        Ok(application) => success("application updated", &application),
        Err(err) => failure(err),
    }
}

pub(crate) async fn delete_handler<S, A>(
    State(api): State<Arc<AdoptionApi<S, A>>>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Response
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return failure(err),
    };
    match api.applications.delete(ApplicationId(application_id), actor) {
        Ok(()) => success("application deleted", &json!(null)),
        Err(err) => failure(err),
    }
}

pub(crate) async fn payment_setup_handler<S, A>(
    State(api): State<Arc<AdoptionApi<S, A>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<PaymentSetupRequest>,
) -> Response
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return failure(err),
    };
    match api.payments.setup(
        actor,
        ApplicationId(request.application_id),
        request.qr_image.as_bytes(),
        request.instructions,
    ) {
        Ok(payment) => success("payment setup complete", &payment),
        Err(err) => failure(err),
    }
}

pub(crate) async fn payment_submit_handler<S, A>(
    State(api): State<Arc<AdoptionApi<S, A>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<PaymentSubmitRequest>,
) -> Response
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return failure(err),
    };
    match api.payments.submit_proof(
        actor,
        PaymentId(request.payment_id),
        request.proof_of_transaction.as_bytes(),
        request.transaction_id,
    ) {
        Ok(payment) => success("proof of transaction submitted", &payment),
        Err(err) => failure(err),
    }
}

pub(crate) async fn payment_verify_handler<S, A>(
    State(api): State<Arc<AdoptionApi<S, A>>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<PaymentVerifyRequest>,
) -> Response
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return failure(err),
    };
    let Some(decision) = PaymentDecision::parse(&request.decision) else {
        return failure(WorkflowError::validation(format!(
            "decision must be 'verified' or 'rejected', got '{}'",
            request.decision
        )));
    };
    match api
        .payments
        .verify(actor, PaymentId(request.payment_id), decision, request.notes)
    {
        Ok(payment) => success("payment decision recorded", &payment),
        Err(err) => failure(err),
    }
}

pub(crate) async fn payment_check_handler<S, A>(
    State(api): State<Arc<AdoptionApi<S, A>>>,
    headers: HeaderMap,
    Query(query): Query<PaymentCheckQuery>,
) -> Response
where
    S: AdoptionStore + 'static,
    A: AssetStore + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return failure(err),
    };
    match api
        .payments
        .check(actor, ApplicationId(query.application_id))
    {
        Ok(Some(payment)) => success("payment found", &payment),
        Ok(None) => success("no payment recorded for this application", &json!(null)),
        Err(err) => failure(err),
    }
}

/// Parse the identity headers resolved by the external auth layer.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, WorkflowError> {
    let id = headers
        .get("x-actor-id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| WorkflowError::validation("missing x-actor-id header"))?
        .parse::<u64>()
        .map_err(|_| WorkflowError::validation("x-actor-id must be an integer"))?;

    let kind = headers
        .get("x-actor-type")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| WorkflowError::validation("missing x-actor-type header"))?;
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "adopter" => ActorKind::Adopter,
        "organization" => ActorKind::Organization,
        other => {
            return Err(WorkflowError::validation(format!(
                "unknown actor type '{other}'"
            )))
        }
    };

    Ok(Actor { id, kind })
}

fn success(message: &str, data: &impl Serialize) -> Response {
    (
        StatusCode::OK,
        axum::Json(json!({
            "success": true,
            "message": message,
            "data": data,
        })),
    )
        .into_response()
}

fn failure(err: WorkflowError) -> Response {
    let status = match &err {
        WorkflowError::Validation(_) | WorkflowError::PreconditionFailed(_) => {
            StatusCode::BAD_REQUEST
        }
        WorkflowError::Authorization(_) => StatusCode::FORBIDDEN,
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::Conflict(_) => StatusCode::CONFLICT,
        WorkflowError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "adoption workflow internal error");
        "internal error".to_string()
    } else {
        err.to_string()
    };

    (
        status,
        axum::Json(json!({
            "success": false,
            "error": message,
        })),
    )
        .into_response()
}
