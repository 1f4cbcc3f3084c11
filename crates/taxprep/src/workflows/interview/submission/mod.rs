mod client;
mod mapping;

pub use client::{
    AttemptFailure, HttpTransport, SubmissionClient, SubmissionConfig, SubmissionError,
    SubmissionReceipt, SubmissionTransport, TransportError, TransportReply,
};
pub use mapping::{
    interview_attachments, interview_export_body, submission_body, validate_fields,
    FileAttachment, SubmissionCategory, ValidationErrors,
};
