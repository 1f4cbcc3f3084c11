use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::workflows::interview::submission::SubmissionCategory;

/// Which submission categories a notification rule listens to.
#[derive(Debug, Clone)]
pub enum FormFilter {
    All,
    Only(Vec<SubmissionCategory>),
}

impl FormFilter {
    pub fn matches(&self, category: SubmissionCategory) -> bool {
        match self {
            FormFilter::All => true,
            FormFilter::Only(categories) => categories.contains(&category),
        }
    }
}

/// One configured notification recipient with its message template.
#[derive(Debug, Clone)]
pub struct NotificationRule {
    pub recipient: String,
    pub active: bool,
    pub forms: FormFilter,
    pub template: String,
}

impl NotificationRule {
    pub fn applies_to(&self, category: SubmissionCategory) -> bool {
        self.active && self.forms.matches(category)
    }
}

/// Fill a notification template from the submitted fields. The common
/// placeholders fall back to "N/A"; form-specific ones are substituted
/// only when the submission carried them.
pub fn render_template(
    template: &str,
    category: SubmissionCategory,
    fields: &BTreeMap<String, String>,
) -> String {
    let mut message = template.replace("{formType}", category.form_type());

    for key in ["name", "email", "phone", "message"] {
        let placeholder = format!("{{{key}}}");
        let value = fields
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or("N/A");
        message = message.replace(&placeholder, value);
    }

    for key in ["income", "taxYear", "preferredDate", "preferredTime"] {
        if let Some(value) = fields.get(key) {
            message = message.replace(&format!("{{{key}}}"), value);
        }
    }

    message
}

/// Lifecycle of an outbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    Queued,
    Sending,
    Sent,
    Failed,
}

impl OutboxStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OutboxStatus::Queued => "QUEUED",
            OutboxStatus::Sending => "SENDING",
            OutboxStatus::Sent => "SENT",
            OutboxStatus::Failed => "FAILED",
        }
    }
}

/// One queued SMS notification.
#[derive(Debug, Clone, Serialize)]
pub struct OutboxMessage {
    pub queued_at: DateTime<Local>,
    pub to: String,
    pub body: String,
    pub status: OutboxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Local>>,
    pub related_form: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_row: Option<u64>,
}

impl OutboxMessage {
    pub fn queued(
        queued_at: DateTime<Local>,
        to: String,
        body: String,
        related_form: String,
        related_row: Option<u64>,
    ) -> Self {
        Self {
            queued_at,
            to,
            body,
            status: OutboxStatus::Queued,
            error: None,
            message_sid: None,
            sent_at: None,
            related_form,
            related_row,
        }
    }
}

/// Outcome of one dispatch pass over the outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
}

/// Outbound SMS hook. Vendor adapters live outside this crate; tests and
/// the bundled service use in-memory implementations.
pub trait SmsGateway: Send + Sync {
    fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsReceipt {
    pub message_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("sms transport unavailable: {0}")]
    Transport(String),
    #[error("sms provider rejected message: {0}")]
    Rejected(String),
}

/// In-process notification queue. Messages are appended at intake time and
/// drained by an explicit dispatch pass; a failed send marks only that
/// message failed and never aborts the pass.
#[derive(Debug, Default)]
pub struct SmsOutbox {
    messages: Mutex<Vec<OutboxMessage>>,
}

impl SmsOutbox {
    pub fn queue(&self, message: OutboxMessage) {
        let mut guard = self.messages.lock().expect("outbox mutex poisoned");
        guard.push(message);
    }

    pub fn snapshot(&self) -> Vec<OutboxMessage> {
        self.messages.lock().expect("outbox mutex poisoned").clone()
    }

    pub fn queued_count(&self) -> usize {
        self.messages
            .lock()
            .expect("outbox mutex poisoned")
            .iter()
            .filter(|message| message.status == OutboxStatus::Queued)
            .count()
    }

    /// Send every queued message through the gateway. Entries with a blank
    /// recipient or body are skipped rather than failed.
    pub fn dispatch(&self, gateway: &dyn SmsGateway, now: DateTime<Local>) -> DispatchSummary {
        let mut guard = self.messages.lock().expect("outbox mutex poisoned");
        let mut sent = 0;
        let mut failed = 0;

        for message in guard.iter_mut() {
            if message.status != OutboxStatus::Queued {
                continue;
            }
            if message.to.trim().is_empty() || message.body.trim().is_empty() {
                continue;
            }

            message.status = OutboxStatus::Sending;
            match gateway.send(&message.to, &message.body) {
                Ok(receipt) => {
                    message.status = OutboxStatus::Sent;
                    message.message_sid = Some(receipt.message_id);
                    message.sent_at = Some(now);
                    message.error = None;
                    sent += 1;
                }
                Err(err) => {
                    message.status = OutboxStatus::Failed;
                    message.error = Some(err.to_string());
                    failed += 1;
                }
            }
        }

        DispatchSummary { sent, failed }
    }
}

/// Keyword-triggered reply for inbound SMS.
#[derive(Debug, Clone)]
pub struct AutoReplyRule {
    pub keyword: String,
    pub reply: String,
    pub active: bool,
}

pub fn default_auto_replies() -> Vec<AutoReplyRule> {
    vec![
        AutoReplyRule {
            keyword: "HOURS".to_string(),
            reply: "We are open Mon-Fri 9AM-6PM EST. Visit our website for more info.".to_string(),
            active: true,
        },
        AutoReplyRule {
            keyword: "HELP".to_string(),
            reply:
                "Reply with: HOURS for business hours, SERVICES for our offerings, CONTACT for our info."
                    .to_string(),
            active: true,
        },
        AutoReplyRule {
            keyword: "SERVICES".to_string(),
            reply: "We offer: Tax Preparation, Tax Planning, IRS Representation, and more!"
                .to_string(),
            active: true,
        },
    ]
}

/// Case-insensitive keyword lookup over the active rules, first match wins.
pub fn match_auto_reply<'a>(rules: &'a [AutoReplyRule], body: &str) -> Option<&'a str> {
    if body.trim().is_empty() {
        return None;
    }

    let haystack = body.to_lowercase();
    rules
        .iter()
        .filter(|rule| rule.active && !rule.keyword.trim().is_empty())
        .find(|rule| haystack.contains(&rule.keyword.to_lowercase()))
        .map(|rule| rule.reply.as_str())
}

/// One inbound SMS as posted by the webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundSms {
    pub from: String,
    pub to: String,
    pub body: String,
    #[serde(default)]
    pub message_sid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InboundEntry {
    pub received_at: DateTime<Local>,
    pub message: InboundSms,
    pub auto_replied: bool,
}

/// Log of inbound messages, kept so operators can audit auto-replies.
#[derive(Debug, Default)]
pub struct InboundLog {
    entries: Mutex<Vec<InboundEntry>>,
}

impl InboundLog {
    pub fn record(&self, message: InboundSms, auto_replied: bool, received_at: DateTime<Local>) {
        let mut guard = self.entries.lock().expect("inbox mutex poisoned");
        guard.push(InboundEntry {
            received_at,
            message,
            auto_replied,
        });
    }

    pub fn snapshot(&self) -> Vec<InboundEntry> {
        self.entries.lock().expect("inbox mutex poisoned").clone()
    }
}
