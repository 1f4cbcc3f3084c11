//! End-to-end interview scenarios: the wizard drives a record through the
//! ordered steps, finalize renders both documents from one snapshot, and
//! the submission client delivers the packaged payload.

mod common {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::Value;

    use taxprep::workflows::interview::domain::{Dependent, RecordPatch};
    use taxprep::workflows::interview::submission::{
        SubmissionClient, SubmissionConfig, SubmissionTransport, TransportError, TransportReply,
    };
    use taxprep::workflows::interview::{AdvanceOutcome, InterviewWizard};

    /// Transport that fails a scripted number of times and records every
    /// payload it was asked to deliver.
    pub(super) struct MockTransport {
        failures_before_success: u32,
        calls: AtomicU32,
        payloads: Mutex<Vec<Value>>,
    }

    impl MockTransport {
        pub(super) fn new(failures_before_success: u32) -> Self {
            Self {
                failures_before_success,
                calls: AtomicU32::new(0),
                payloads: Mutex::new(Vec::new()),
            }
        }

        pub(super) fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        pub(super) fn payloads(&self) -> Vec<Value> {
            self.payloads.lock().expect("payload mutex").clone()
        }
    }

    #[async_trait]
    impl SubmissionTransport for &MockTransport {
        async fn post(
            &self,
            _endpoint: &str,
            payload: &Value,
            _timeout: Duration,
        ) -> Result<TransportReply, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads
                .lock()
                .expect("payload mutex")
                .push(payload.clone());
            if call < self.failures_before_success {
                Err(TransportError::Network("connection reset".to_string()))
            } else {
                Ok(TransportReply {
                    status: 200,
                    body: "{\"result\":\"success\"}".to_string(),
                })
            }
        }
    }

    pub(super) fn client(transport: &MockTransport) -> SubmissionClient<&MockTransport> {
        let mut config = SubmissionConfig::new("https://collect.example.com/exec");
        config.retry_delay = Duration::ZERO;
        SubmissionClient::with_transport(config, transport)
    }

    pub(super) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 3).expect("valid date")
    }

    /// Walk a wizard through the steps the way the form drives it,
    /// entering Jane Doe's answers along the way.
    pub(super) fn wizard_at_review() -> InterviewWizard {
        let mut wizard = InterviewWizard::new();
        wizard
            .set_field(RecordPatch::FirstName("Jane".to_string()))
            .expect("edit");
        wizard
            .set_field(RecordPatch::LastName("Doe".to_string()))
            .expect("edit");
        wizard
            .set_field(RecordPatch::Email("jane@example.com".to_string()))
            .expect("edit");
        assert!(matches!(
            wizard.advance().expect("to filing"),
            AdvanceOutcome::Moved(_)
        ));
        wizard
            .set_field(RecordPatch::Dependents(vec![Dependent {
                name: "Sam Doe".to_string(),
                ssn: "000-00-0001".to_string(),
                relationship: "Son".to_string(),
            }]))
            .expect("edit");
        assert!(matches!(
            wizard.advance().expect("to income"),
            AdvanceOutcome::Moved(_)
        ));
        wizard
            .set_field(RecordPatch::Wages("50000".to_string()))
            .expect("edit");
        assert!(matches!(
            wizard.advance().expect("to review"),
            AdvanceOutcome::Moved(_)
        ));
        wizard
    }
}

mod finalize {
    use super::common::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use taxprep::workflows::interview::submission::SubmissionError;
    use taxprep::workflows::interview::{
        AdvanceOutcome, FinalizeError, InterviewStep, WizardPhase,
    };

    #[tokio::test]
    async fn finalize_packages_both_documents_from_one_snapshot() {
        let transport = MockTransport::new(0);
        let client = client(&transport);
        let mut wizard = wizard_at_review();
        assert_eq!(
            wizard.advance().expect("advance on review"),
            AdvanceOutcome::ReadyToFinalize
        );

        let report = wizard
            .finalize(&client, today())
            .await
            .expect("finalize succeeds");

        assert_eq!(wizard.phase(), WizardPhase::Done);
        assert_eq!(report.receipt.status, 200);
        assert!(report.summary.bytes().starts_with(b"%PDF"));
        assert!(report.flat_export.contains("\"Income\",\"Wages\",\"50000\""));

        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 1);
        let payload = payloads[0].as_object().expect("json object");
        assert_eq!(payload["formType"], "selfInterview");
        assert_eq!(payload["name"], "Jane Doe");

        let files = payload["files"].as_array().expect("files array");
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["name"], "Tax_Interview_Jane_Doe.pdf");
        assert_eq!(files[0]["type"], "application/pdf");
        assert_eq!(files[1]["name"], "Tax_Data_Jane_Doe.csv");
        assert_eq!(files[1]["type"], "text/csv");

        let pdf_bytes = STANDARD
            .decode(files[0]["content"].as_str().expect("base64 text"))
            .expect("valid base64");
        assert!(pdf_bytes.starts_with(b"%PDF"));

        let csv_bytes = STANDARD
            .decode(files[1]["content"].as_str().expect("base64 text"))
            .expect("valid base64");
        let csv_text = String::from_utf8(csv_bytes).expect("utf8 csv");
        assert_eq!(csv_text, report.flat_export);
        assert!(csv_text.contains("\"Dependent 1 Name\",\"Sam Doe\""));
    }

    #[tokio::test]
    async fn exhausted_delivery_returns_the_wizard_to_review_for_retry() {
        let failing = MockTransport::new(u32::MAX);
        let failing_client = client(&failing);
        let mut wizard = wizard_at_review();

        let err = wizard
            .finalize(&failing_client, today())
            .await
            .expect_err("delivery exhausted");

        match err {
            FinalizeError::Submission(SubmissionError::Exhausted { attempts, .. }) => {
                assert_eq!(attempts, 3);
            }
            other => panic!("expected exhausted delivery error, got {other:?}"),
        }
        assert_eq!(failing.calls(), 3);
        assert_eq!(wizard.phase(), WizardPhase::Failed);
        assert_eq!(wizard.step(), InterviewStep::Review);
        assert_eq!(wizard.record().first_name, "Jane");

        // The entered data is intact, so a retry goes straight through.
        let recovering = MockTransport::new(0);
        let recovering_client = client(&recovering);
        wizard
            .finalize(&recovering_client, today())
            .await
            .expect("retry succeeds");
        assert_eq!(wizard.phase(), WizardPhase::Done);
    }

    #[tokio::test]
    async fn completed_interviews_reject_further_finalize_attempts() {
        let transport = MockTransport::new(0);
        let submit_client = client(&transport);
        let mut wizard = wizard_at_review();
        wizard
            .finalize(&submit_client, today())
            .await
            .expect("finalize succeeds");

        let err = wizard
            .finalize(&submit_client, today())
            .await
            .expect_err("second submission rejected");
        assert!(matches!(err, FinalizeError::Wizard(_)));
        assert_eq!(transport.calls(), 1);
    }
}
