use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::workflows::interview::domain::{FilingStatus, InterviewRecord};
use crate::workflows::interview::render::SummaryDocument;

/// Discriminator selecting which field subset applies to a submission.
/// Always carried explicitly on the wire as `formType`; the collection
/// side never re-derives the category from which fields happen to be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionCategory {
    General,
    SavingsCalculator,
    FreeReview,
    BookSession,
    PdfGuide,
    SelfInterview,
}

impl SubmissionCategory {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::General,
            Self::SavingsCalculator,
            Self::FreeReview,
            Self::BookSession,
            Self::PdfGuide,
            Self::SelfInterview,
        ]
    }

    /// Wire tag carried in the `formType` field.
    pub const fn form_type(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::SavingsCalculator => "savingsCalculator",
            Self::FreeReview => "freeReview",
            Self::BookSession => "bookSession",
            Self::PdfGuide => "pdfGuide",
            Self::SelfInterview => "selfInterview",
        }
    }

    pub fn from_form_type(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|category| category.form_type() == value)
    }

    /// Worksheet the collection backend appends this category's rows to.
    pub const fn worksheet(self) -> &'static str {
        match self {
            Self::General => "Form",
            Self::SavingsCalculator => "Savings Calculator Form",
            Self::FreeReview => "Free Review Form",
            Self::BookSession => "Book Session Form",
            Self::PdfGuide => "PDF Guide Form",
            Self::SelfInterview => "Tax Interview Form",
        }
    }

    /// Exact field set the remote endpoint expects for this category.
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::General => &["name", "email", "phone", "message"],
            Self::SavingsCalculator => &[
                "name",
                "email",
                "phone",
                "income",
                "filingStatus",
                "dependents",
                "homeOwner",
            ],
            Self::FreeReview => &["name", "email", "phone", "taxYear", "message"],
            Self::BookSession => &[
                "name",
                "email",
                "phone",
                "preferredDate",
                "preferredTime",
                "message",
            ],
            Self::PdfGuide => &["name", "email"],
            Self::SelfInterview => &[
                "name",
                "email",
                "phone",
                "ssn",
                "address",
                "city",
                "state",
                "zip",
                "filingStatus",
                "wages",
                "interest",
                "dividends",
                "iraDistributions",
                "unemployment",
                "dependents",
            ],
        }
    }

    /// Worksheet header row: a leading datestamp column then the payload
    /// fields in order.
    pub fn worksheet_headers(self) -> Vec<&'static str> {
        std::iter::once("datestamp")
            .chain(self.fields().iter().copied())
            .collect()
    }
}

/// Inline list of human-readable validation messages. A submission that
/// fails validation never reaches the network layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<String>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn field_value<'a>(fields: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn is_valid_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !local.contains(char::is_whitespace)
                && !domain.is_empty()
                && !domain.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// Validate a raw form against the category's requirements, collecting
/// every failure rather than stopping at the first.
pub fn validate_fields(
    category: SubmissionCategory,
    fields: &BTreeMap<String, String>,
) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if field_value(fields, "name").is_none() {
        errors.push("Name is required".to_string());
    }

    match field_value(fields, "email") {
        None => errors.push("Email is required".to_string()),
        Some(email) if !is_valid_email(email) => {
            errors.push("Please enter a valid email address".to_string());
        }
        Some(_) => {}
    }

    match category {
        SubmissionCategory::SavingsCalculator => {
            if field_value(fields, "income").is_none() {
                errors.push("Income is required".to_string());
            }
            if field_value(fields, "filingStatus").is_none() {
                errors.push("Filing status is required".to_string());
            }
        }
        SubmissionCategory::FreeReview => {
            if field_value(fields, "taxYear").is_none() {
                errors.push("Tax year is required".to_string());
            }
        }
        SubmissionCategory::BookSession => {
            if field_value(fields, "preferredDate").is_none() {
                errors.push("Preferred date is required".to_string());
            }
            if field_value(fields, "preferredTime").is_none() {
                errors.push("Preferred time is required".to_string());
            }
        }
        SubmissionCategory::General
        | SubmissionCategory::PdfGuide
        | SubmissionCategory::SelfInterview => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Map a raw form onto the category's exact field set. Values are trimmed
/// and unset/empty optional fields are omitted entirely so the collection
/// side can distinguish "not provided" from "explicitly empty". The
/// explicit category tag always rides along as `formType`.
pub fn submission_body(category: SubmissionCategory, fields: &BTreeMap<String, String>) -> Value {
    let mut body = Map::new();
    body.insert(
        "formType".to_string(),
        Value::String(category.form_type().to_string()),
    );

    for key in category.fields() {
        if let Some(value) = field_value(fields, key) {
            body.insert((*key).to_string(), Value::String(value.to_string()));
        }
    }

    Value::Object(body)
}

/// Named file attachment embedded in the interview export payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub content: String,
}

/// Package both rendered documents as base64 attachments named after the
/// interview subject.
pub fn interview_attachments(
    record: &InterviewRecord,
    summary: &SummaryDocument,
    flat_export: &str,
) -> Vec<FileAttachment> {
    vec![
        FileAttachment {
            name: format!(
                "Tax_Interview_{}_{}.pdf",
                record.first_name, record.last_name
            ),
            content_type: mime::APPLICATION_PDF.to_string(),
            content: summary.to_base64(),
        },
        FileAttachment {
            name: format!("Tax_Data_{}_{}.csv", record.first_name, record.last_name),
            content_type: mime::TEXT_CSV.to_string(),
            content: STANDARD.encode(flat_export.as_bytes()),
        },
    ]
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InterviewExportPayload<'a> {
    form_type: &'static str,
    name: String,
    email: &'a str,
    phone: &'a str,
    ssn: &'a str,
    address: &'a str,
    city: &'a str,
    state: &'a str,
    zip: &'a str,
    filing_status: FilingStatus,
    wages: &'a str,
    interest: &'a str,
    dividends: &'a str,
    ira_distributions: &'a str,
    unemployment: &'a str,
    dependents: String,
    files: &'a [FileAttachment],
}

/// Build the interview export payload: the flattened record fields plus
/// the file attachments, with dependents serialized as a JSON string the
/// way the worksheet column stores them.
pub fn interview_export_body(
    record: &InterviewRecord,
    files: &[FileAttachment],
) -> Result<Value, serde_json::Error> {
    let payload = InterviewExportPayload {
        form_type: SubmissionCategory::SelfInterview.form_type(),
        name: record.full_name(),
        email: &record.email,
        phone: &record.phone,
        ssn: &record.ssn,
        address: &record.address,
        city: &record.city,
        state: &record.state,
        zip: &record.zip,
        filing_status: record.filing_status,
        wages: &record.wages,
        interest: &record.interest,
        dividends: &record.dividends,
        ira_distributions: &record.ira_distributions,
        unemployment: &record.unemployment,
        dependents: serde_json::to_string(&record.dependents)?,
        files,
    };

    serde_json::to_value(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn categories_round_trip_their_wire_tags() {
        for category in SubmissionCategory::ordered() {
            assert_eq!(
                SubmissionCategory::from_form_type(category.form_type()),
                Some(category)
            );
        }
        assert_eq!(SubmissionCategory::from_form_type("mystery"), None);
    }

    #[test]
    fn validation_collects_every_failure() {
        let err = validate_fields(SubmissionCategory::BookSession, &fields(&[]))
            .expect_err("empty form rejected");
        assert_eq!(
            err.0,
            vec![
                "Name is required",
                "Email is required",
                "Preferred date is required",
                "Preferred time is required",
            ]
        );
    }

    #[test]
    fn malformed_email_is_reported() {
        let err = validate_fields(
            SubmissionCategory::General,
            &fields(&[("name", "Jane Doe"), ("email", "jane@nowhere")]),
        )
        .expect_err("bad email rejected");
        assert_eq!(err.0, vec!["Please enter a valid email address"]);

        validate_fields(
            SubmissionCategory::General,
            &fields(&[("name", "Jane Doe"), ("email", "jane@example.com")]),
        )
        .expect("well-formed email accepted");
    }

    #[test]
    fn body_carries_the_tag_and_omits_unset_fields() {
        let body = submission_body(
            SubmissionCategory::FreeReview,
            &fields(&[
                ("name", " Jane Doe "),
                ("email", "jane@example.com"),
                ("taxYear", "2024"),
                ("message", "   "),
                ("unrelated", "dropped"),
            ]),
        );

        let object = body.as_object().expect("json object");
        assert_eq!(object["formType"], "freeReview");
        assert_eq!(object["name"], "Jane Doe");
        assert_eq!(object["taxYear"], "2024");
        assert!(!object.contains_key("message"));
        assert!(!object.contains_key("phone"));
        assert!(!object.contains_key("unrelated"));
    }

    #[test]
    fn worksheet_headers_lead_with_datestamp() {
        assert_eq!(
            SubmissionCategory::PdfGuide.worksheet_headers(),
            vec!["datestamp", "name", "email"]
        );
        assert_eq!(SubmissionCategory::General.worksheet(), "Form");
    }

    #[test]
    fn interview_body_flattens_the_record_with_files() {
        let mut record = InterviewRecord::default();
        record.first_name = "Jane".to_string();
        record.last_name = "Doe".to_string();
        record.email = "jane@example.com".to_string();
        record.wages = "50000".to_string();

        let files = vec![FileAttachment {
            name: "Tax_Interview_Jane_Doe.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content: "AAAA".to_string(),
        }];

        let body = interview_export_body(&record, &files).expect("payload builds");
        let object = body.as_object().expect("json object");
        assert_eq!(object["formType"], "selfInterview");
        assert_eq!(object["name"], "Jane Doe");
        assert_eq!(object["filingStatus"], "single");
        assert_eq!(object["iraDistributions"], "");
        assert_eq!(object["dependents"], "[]");

        let files = object["files"].as_array().expect("files array");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["type"], "application/pdf");
    }
}
