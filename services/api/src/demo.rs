use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use clap::Args;
use serde_json::Value;

use crate::infra::{
    default_notification_rules, InMemorySheetStore, InMemorySmsGateway,
};
use taxprep::error::AppError;
use taxprep::workflows::intake::{IntakeService, SmsOutbox};
use taxprep::workflows::interview::domain::{
    Dependent, FilingStatus, InterviewRecord, RecordPatch,
};
use taxprep::workflows::interview::render::{csv_string, flat_rows, render_summary};
use taxprep::workflows::interview::submission::{
    SubmissionCategory, SubmissionClient, SubmissionConfig, SubmissionTransport, TransportError,
    TransportReply,
};
use taxprep::workflows::interview::{AdvanceOutcome, FinalizeError, InterviewWizard};

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Path to a JSON interview record; a built-in sample is used when omitted
    #[arg(long)]
    pub(crate) record: Option<PathBuf>,
    /// Directory where the PDF and CSV files land
    #[arg(long, default_value = ".")]
    pub(crate) out_dir: PathBuf,
    /// Reporting date for the rendered documents (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date for the rendered documents (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Leave queued notifications in the outbox instead of dispatching them
    #[arg(long)]
    pub(crate) skip_dispatch: bool,
}

pub(crate) fn run_interview_export(args: ExportArgs) -> Result<(), AppError> {
    let ExportArgs {
        record,
        out_dir,
        today,
    } = args;

    let record = match record {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str::<InterviewRecord>(&raw).map_err(|err| {
                AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
            })?
        }
        None => sample_record(),
    };
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let summary = render_summary(&record, today).map_err(FinalizeError::from)?;
    let flat_export = csv_string(&record).map_err(FinalizeError::from)?;

    fs::create_dir_all(&out_dir)?;
    let pdf_path = out_dir.join(format!(
        "Tax_Interview_{}_{}.pdf",
        record.first_name, record.last_name
    ));
    let csv_path = out_dir.join(format!(
        "Tax_Data_{}_{}.csv",
        record.first_name, record.last_name
    ));
    summary.save_to(&pdf_path)?;
    fs::write(&csv_path, flat_export.as_bytes())?;

    println!("Interview export for {}", record.full_name());
    println!("- Summary PDF: {}", pdf_path.display());
    println!("- Flat export: {}", csv_path.display());

    println!("\nExport rows");
    for row in flat_rows(&record) {
        println!("- {} | {} | {}", row.category, row.field, row.value);
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        skip_dispatch,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    println!("Tax prep pipeline demo");
    println!("The wizard feeds the same collection service the webhook exposes.");

    let store = Arc::new(InMemorySheetStore::with_standard_worksheets());
    let outbox = Arc::new(SmsOutbox::default());
    let gateway = InMemorySmsGateway::default();
    let intake = Arc::new(IntakeService::new(
        store.clone(),
        outbox.clone(),
        default_notification_rules(),
    ));

    let mut wizard = InterviewWizard::new();
    for patch in sample_patches() {
        wizard.set_field(patch).map_err(FinalizeError::from)?;
    }

    println!("\nWizard walk");
    println!(
        "- Step {} of 4: {}",
        wizard.step().number(),
        wizard.step().label()
    );
    loop {
        match wizard.advance().map_err(FinalizeError::from)? {
            AdvanceOutcome::Moved(step) => {
                println!("- Step {} of 4: {}", step.number(), step.label());
            }
            AdvanceOutcome::ReadyToFinalize => break,
        }
    }

    let transport = InProcessTransport {
        service: intake.clone(),
    };
    let client = SubmissionClient::with_transport(
        SubmissionConfig::new("in-process://collection"),
        transport,
    );
    let report = wizard.finalize(&client, today).await?;

    println!("\nFinalize complete (status {})", report.receipt.status);
    if let Some(body) = &report.receipt.body {
        println!("Collection receipt: {body}");
    }
    println!("Summary PDF bytes: {}", report.summary.bytes().len());
    println!("Flat export lines: {}", report.flat_export.lines().count());

    let worksheet = SubmissionCategory::SelfInterview.worksheet();
    let rows = store.rows(worksheet);
    println!("\nWorksheet '{}' now holds {} row(s)", worksheet, rows.len());

    println!("Queued notifications: {}", outbox.queued_count());
    if skip_dispatch {
        return Ok(());
    }

    let summary = outbox.dispatch(&gateway, Local::now());
    println!(
        "Outbox dispatch: {} sent, {} failed",
        summary.sent, summary.failed
    );
    for (to, body) in gateway.deliveries() {
        println!("- {to}: {body}");
    }
    for message in outbox.snapshot() {
        println!(
            "- [{}] {} (form {})",
            message.status.label(),
            message.to,
            message.related_form
        );
    }

    Ok(())
}

/// Transport that short-circuits the wire and hands payloads straight to
/// the intake service, so the demo exercises the full pipeline in-process.
struct InProcessTransport {
    service: Arc<IntakeService<InMemorySheetStore>>,
}

#[async_trait]
impl SubmissionTransport for InProcessTransport {
    async fn post(
        &self,
        _endpoint: &str,
        payload: &Value,
        _timeout: Duration,
    ) -> Result<TransportReply, TransportError> {
        match self.service.handle(payload, Local::now()) {
            Ok(receipt) => Ok(TransportReply {
                status: 200,
                body: serde_json::to_string(&receipt).unwrap_or_default(),
            }),
            Err(err) => Ok(TransportReply {
                status: 400,
                body: format!("{{\"error\":\"{err}\"}}"),
            }),
        }
    }
}

fn sample_record() -> InterviewRecord {
    InterviewRecord {
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: "jane.doe@example.com".to_string(),
        phone: "813-555-0142".to_string(),
        ssn: "123-45-6789".to_string(),
        address: "412 Bayshore Blvd".to_string(),
        city: "Tampa".to_string(),
        state: "FL".to_string(),
        zip: "33606".to_string(),
        filing_status: FilingStatus::MarriedJoint,
        dependents: vec![Dependent {
            name: "Sam Doe".to_string(),
            ssn: "987-65-4321".to_string(),
            relationship: "Son".to_string(),
        }],
        wages: "50000".to_string(),
        interest: "1200".to_string(),
        dividends: String::new(),
        ira_distributions: String::new(),
        unemployment: String::new(),
    }
}

fn sample_patches() -> Vec<RecordPatch> {
    let sample = sample_record();
    vec![
        RecordPatch::FirstName(sample.first_name.clone()),
        RecordPatch::LastName(sample.last_name.clone()),
        RecordPatch::Email(sample.email.clone()),
        RecordPatch::Phone(sample.phone.clone()),
        RecordPatch::Ssn(sample.ssn.clone()),
        RecordPatch::Address(sample.address.clone()),
        RecordPatch::City(sample.city.clone()),
        RecordPatch::State(sample.state.clone()),
        RecordPatch::Zip(sample.zip.clone()),
        RecordPatch::FilingStatus(sample.filing_status),
        RecordPatch::Dependents(sample.dependents.clone()),
        RecordPatch::Wages(sample.wages.clone()),
        RecordPatch::Interest(sample.interest.clone()),
    ]
}
