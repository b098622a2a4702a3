use crate::infra::{seed_demo_catalog, DEMO_ORG};
use clap::Args;
use std::sync::Arc;

use pawhaven::config::WorkflowConfig;
use pawhaven::error::AppError;
use pawhaven::workflows::adoption::{
    Actor, AdopterId, AdoptionStore, ApplicationForm, ApplicationStatus, ApplicationWorkflow,
    InMemoryAdoptionStore, InMemoryAssetStore, PaymentDecision, PaymentWorkflow, PetId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the payment verification portion of the demo.
    #[arg(long)]
    pub(crate) skip_payment: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryAdoptionStore::new());
    let assets = Arc::new(InMemoryAssetStore::new());
    seed_demo_catalog(&store).map_err(|err| {
        AppError::Workflow(pawhaven::workflows::adoption::WorkflowError::from(err))
    })?;

    let applications = ApplicationWorkflow::new(store.clone(), WorkflowConfig::default());
    let payments = PaymentWorkflow::new(store.clone(), assets, WorkflowConfig::default());

    let organization = Actor::organization(DEMO_ORG);
    let ana = Actor::adopter(AdopterId(1));
    let ben = Actor::adopter(AdopterId(2));
    let biscuit = PetId(1);

    println!("PawHaven adoption workflow demo");
    println!("\nApplication intake");

    let winning = applications.submit(ana, biscuit, demo_form("We walk 5km every morning."))?;
    println!(
        "- Ana applied for Biscuit -> application {} ({})",
        winning.application_id.0,
        winning.status.label()
    );

    let losing = applications.submit(ben, biscuit, demo_form("Our family wants a second dog."))?;
    println!(
        "- Ben applied for Biscuit -> application {} ({})",
        losing.application_id.0,
        losing.status.label()
    );

    match applications.submit(ana, biscuit, demo_form("Trying again.")) {
        Err(err) => println!("- Ana's duplicate application refused: {err}"),
        Ok(_) => println!("- Unexpected: duplicate application accepted"),
    }

    println!("\nApproval cascade");
    let approved = applications.transition(
        winning.application_id,
        ApplicationStatus::Approved,
        organization,
        None,
    )?;
    println!(
        "- Application {} approved by organization {}",
        approved.application_id.0, DEMO_ORG.0
    );

    let adopted = store
        .fetch_pet(biscuit)
        .map_err(|err| {
            AppError::Workflow(pawhaven::workflows::adoption::WorkflowError::from(err))
        })?
        .map(|pet| pet.status.label().to_string())
        .unwrap_or_else(|| "missing".to_string());
    println!("- Biscuit is now {adopted}");

    let sibling = applications.get(losing.application_id, ben)?;
    println!(
        "- Ben's application {} auto-settled: {} ({})",
        sibling.application_id.0,
        sibling.status.label(),
        sibling.rejection_reason.as_deref().unwrap_or("no reason"),
    );

    let report = applications.reconcile()?;
    println!(
        "- Reconciliation sweep: {} pets repaired, {} applications rejected",
        report.pets_repaired, report.applications_rejected
    );

    if args.skip_payment {
        return Ok(());
    }

    println!("\nPayment verification");
    let payment = payments.setup(
        organization,
        approved.application_id,
        b"demo-qr-image",
        Some("GCash transfer within 5 days, reference the application id.".to_string()),
    )?;
    println!(
        "- Payment {} created for {} pesos ({})",
        payment.payment_id.0,
        payment.amount,
        payment.status.label()
    );

    let submitted = payments.submit_proof(
        ana,
        payment.payment_id,
        b"demo-receipt",
        Some("TXN-2026-001".to_string()),
    )?;
    println!(
        "- Ana submitted proof {} -> {}",
        submitted.transaction_id.as_deref().unwrap_or("n/a"),
        submitted.status.label()
    );

    let verified = payments.verify(
        organization,
        payment.payment_id,
        PaymentDecision::Verified,
        Some("Amount matched the adoption fee.".to_string()),
    )?;
    println!(
        "- Organization verified payment {} at {}",
        verified.payment_id.0,
        verified
            .date_verified
            .map(|stamp| stamp.to_rfc3339())
            .unwrap_or_else(|| "n/a".to_string())
    );

    match serde_json::to_string_pretty(&verified) {
        Ok(json) => println!("  Final payment record:\n{json}"),
        Err(err) => println!("  Final payment record unavailable: {err}"),
    }

    Ok(())
}

fn demo_form(motivation: &str) -> ApplicationForm {
    ApplicationForm {
        residence_type: "house with yard".to_string(),
        has_other_pets: false,
        hours_alone_per_day: 4,
        motivation: motivation.to_string(),
    }
}
