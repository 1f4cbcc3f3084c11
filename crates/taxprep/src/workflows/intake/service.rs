use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use super::notify::{render_template, NotificationRule, OutboxMessage, SmsOutbox};
use super::store::{SheetStore, StoreError};
use crate::workflows::interview::submission::{
    validate_fields, SubmissionCategory, ValidationErrors,
};

/// Error raised while processing an intake request.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("request body must be a JSON object")]
    MalformedBody,
    #[error("missing formType tag")]
    MissingCategory,
    #[error("unknown formType: {0}")]
    UnknownCategory(String),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the webhook reports back after a stored submission.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeReceipt {
    pub form_type: &'static str,
    pub worksheet: &'static str,
    pub row_id: u64,
    pub datestamp: String,
    pub notifications_queued: usize,
}

/// Service composing validation, the worksheet store, and the
/// notification outbox.
pub struct IntakeService<S> {
    store: Arc<S>,
    outbox: Arc<SmsOutbox>,
    rules: Vec<NotificationRule>,
}

impl<S> IntakeService<S>
where
    S: SheetStore + 'static,
{
    pub fn new(store: Arc<S>, outbox: Arc<SmsOutbox>, rules: Vec<NotificationRule>) -> Self {
        Self {
            store,
            outbox,
            rules,
        }
    }

    pub fn outbox(&self) -> Arc<SmsOutbox> {
        self.outbox.clone()
    }

    /// Store one submission: resolve the explicit category tag, validate,
    /// stamp, append the worksheet row, and queue notifications. The
    /// category is never inferred from which fields happen to be present.
    pub fn handle(&self, body: &Value, now: DateTime<Local>) -> Result<IntakeReceipt, IntakeError> {
        let object = body.as_object().ok_or(IntakeError::MalformedBody)?;
        let tag = object
            .get("formType")
            .and_then(Value::as_str)
            .ok_or(IntakeError::MissingCategory)?;
        let category = SubmissionCategory::from_form_type(tag)
            .ok_or_else(|| IntakeError::UnknownCategory(tag.to_string()))?;

        let fields = scalar_fields(object);
        validate_fields(category, &fields)?;

        let datestamp = now.format("%m/%d/%Y %I:%M:%S %p").to_string();
        let row = worksheet_row(category, &datestamp, &fields);
        let row_id = self.store.append(category.worksheet(), row)?;
        info!(
            worksheet = category.worksheet(),
            row_id, "form submission stored"
        );

        // A notification problem must never fail the stored submission.
        let notifications_queued = self.queue_notifications(category, &fields, now, row_id);

        Ok(IntakeReceipt {
            form_type: category.form_type(),
            worksheet: category.worksheet(),
            row_id,
            datestamp,
            notifications_queued,
        })
    }

    fn queue_notifications(
        &self,
        category: SubmissionCategory,
        fields: &BTreeMap<String, String>,
        now: DateTime<Local>,
        row_id: u64,
    ) -> usize {
        let mut queued = 0;
        for rule in &self.rules {
            if !rule.applies_to(category) {
                continue;
            }

            let body = render_template(&rule.template, category, fields);
            self.outbox.queue(OutboxMessage::queued(
                now,
                rule.recipient.clone(),
                body,
                category.form_type().to_string(),
                Some(row_id),
            ));
            queued += 1;
        }
        queued
    }
}

/// Scalar projection of the JSON body; nested values such as the interview
/// `files` array are not worksheet columns and are dropped here.
fn scalar_fields(object: &Map<String, Value>) -> BTreeMap<String, String> {
    object
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key.clone(), text.clone())),
            Value::Number(number) => Some((key.clone(), number.to_string())),
            Value::Bool(flag) => Some((key.clone(), flag.to_string())),
            _ => None,
        })
        .collect()
}

fn worksheet_row(
    category: SubmissionCategory,
    datestamp: &str,
    fields: &BTreeMap<String, String>,
) -> Vec<String> {
    category
        .worksheet_headers()
        .into_iter()
        .map(|header| match header {
            "datestamp" => datestamp.to_string(),
            key => fields.get(key).cloned().unwrap_or_default(),
        })
        .collect()
}
