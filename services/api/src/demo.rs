use std::sync::Arc;

use chrono::{Datelike, Local};
use clap::Args;
use rust_decimal::Decimal;
use school_ledger::error::AppError;
use school_ledger::workflows::admit::{
    AdmitCardService, EligibilityView, ExamDraft, PaymentSubmission, ReviewDecision, UnlockPath,
};
use school_ledger::workflows::fees::{FeeLedgerService, MonthlyFeeInput, NumericInput};
use school_ledger::workflows::roster::{RosterService, StudentDraft, TransportMode};
use school_ledger::workflows::store::InMemoryLedgerStore;
use school_ledger::workflows::LedgerServiceError;

use crate::infra::InMemoryAdminNotifier;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Amount left unpaid in the second ledger month
    #[arg(long, default_value_t = 800)]
    pub(crate) owed: u32,
    /// UTR quoted by the guardian for the UPI transfer
    #[arg(long, default_value = "TXN12345678")]
    pub(crate) utr: String,
    /// Print the final guardian dashboard as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { owed, utr, json } = args;

    let store = Arc::new(InMemoryLedgerStore::default());
    let notifier = Arc::new(InMemoryAdminNotifier::default());
    let roster = RosterService::new(store.clone());
    let fees = FeeLedgerService::new(store.clone());
    let admit = AdmitCardService::new(store, notifier.clone());

    println!("School ledger demo");

    let student = roster
        .register_student(StudentDraft {
            name: Some("Asha Roy".to_string()),
            class_name: Some("Class 5".to_string()),
            section: Some("A".to_string()),
            roll_no: Some("12".to_string()),
            father_name: Some("Bimal Roy".to_string()),
            transport_mode: TransportMode::OnFoot,
            guardian_uid: Some("demo-guardian".to_string()),
            ..StudentDraft::default()
        })
        .await?;
    println!(
        "\nRegistered {} ({}), travels {}",
        student.name,
        student.class_label(),
        student.transport_mode.label()
    );

    let year = Local::now().date_naive().year();
    let owed = Decimal::from(owed);
    let paid_in_full = fees
        .save_monthly_fee(
            &student.student_id,
            fee_input(year, 3, Decimal::from(3000), Decimal::from(300), Decimal::from(3000)),
        )
        .await?;
    let part_paid = fees
        .save_monthly_fee(
            &student.student_id,
            fee_input(year, 4, Decimal::from(2000) + owed, Decimal::ZERO, Decimal::from(2000)),
        )
        .await?;
    println!("\nFee ledger");
    for record in [&paid_in_full, &part_paid] {
        let net = record.net().map_err(LedgerServiceError::from)?;
        let due = record.due().map_err(LedgerServiceError::from)?;
        println!(
            "  {}: net {} paid {} due {}{}",
            record.month_key,
            net,
            record.paid_amount,
            due,
            if record.is_paid() { " (paid)" } else { "" }
        );
    }
    let statement = fees.statement(&student.student_id).await?;
    println!("  total due: {}", statement.total_due);

    let exam = admit
        .create_exam(ExamDraft {
            name: Some("Half Yearly".to_string()),
            session: Some(format!("{}-{:02}", year, (year + 1) % 100)),
            date: Some(format!("{year}-09-15")),
            time: Some("10:00 AM".to_string()),
            reporting_time: Some("9:30 AM".to_string()),
            venue: Some("Main Hall".to_string()),
        })
        .await?;
    println!("\nAdmit card for {} ({})", exam.name, exam.session);

    let view = admit.eligibility(&student.student_id, &exam.exam_id).await?;
    println!("  before issue: {}", describe(&view));

    admit
        .issue_admit_card(&student.student_id, &exam.exam_id)
        .await?;
    let view = admit.eligibility(&student.student_id, &exam.exam_id).await?;
    println!("  after issue: {}", describe(&view));

    match admit
        .submit_payment(&student.student_id, &exam.exam_id, upi("AB12"))
        .await
    {
        Err(LedgerServiceError::Validation(err)) => println!("  UTR 'AB12' refused: {err}"),
        Err(other) => return Err(other.into()),
        Ok(_) => println!("  UTR 'AB12' was unexpectedly accepted"),
    }

    let request = admit
        .submit_payment(&student.student_id, &exam.exam_id, upi(&utr))
        .await?;
    println!(
        "  claim {} for {} submitted ({})",
        request.reference_id, request.amount, request.status
    );
    let view = admit.eligibility(&student.student_id, &exam.exam_id).await?;
    println!("  while pending: {}", describe(&view));

    admit
        .review_payment(&student.student_id, &exam.exam_id, ReviewDecision::Verified)
        .await?;
    let view = admit.eligibility(&student.student_id, &exam.exam_id).await?;
    println!("  after verification: {}", describe(&view));

    println!("\nAdmin alerts");
    for alert in notifier.events() {
        println!("  - {} for {}", alert.template, alert.student_id);
    }

    if json {
        let dashboard = roster.guardian_dashboard(&student.guardian_uid).await?;
        let rendered = serde_json::to_string_pretty(&dashboard)
            .map_err(|err| AppError::Io(err.into()))?;
        println!("\nGuardian dashboard\n{rendered}");
    }

    Ok(())
}

fn fee_input(
    year: i32,
    month: u32,
    tuition: Decimal,
    transport: Decimal,
    paid: Decimal,
) -> MonthlyFeeInput {
    MonthlyFeeInput {
        month: Some(NumericInput::Text(month.to_string())),
        year: Some(NumericInput::Text(year.to_string())),
        tuition_charge: Some(NumericInput::Text(tuition.to_string())),
        transport_charge: Some(NumericInput::Text(transport.to_string())),
        paid_amount: Some(NumericInput::Text(paid.to_string())),
    }
}

fn upi(utr: &str) -> PaymentSubmission {
    PaymentSubmission {
        utr: Some(utr.to_string()),
        note: None,
    }
}

fn describe(view: &EligibilityView) -> String {
    match view.unlocked_by {
        Some(UnlockPath::DueCleared) => "download allowed, nothing due".to_string(),
        Some(UnlockPath::AdminOverride) => "download allowed by the school".to_string(),
        Some(UnlockPath::PaymentVerified) => "download allowed, payment verified".to_string(),
        None => format!("blocked: {}", view.reason),
    }
}
