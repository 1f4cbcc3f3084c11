use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use taxprep::workflows::intake::{
    FormFilter, NotificationRule, SheetStore, SmsError, SmsGateway, SmsReceipt, StoreError,
};
use taxprep::workflows::interview::submission::SubmissionCategory;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Append-only worksheet store backing the intake webhook. Rows land in a
/// pre-seeded set of worksheets the way the spreadsheet backend keeps one
/// tab per form.
#[derive(Default, Clone)]
pub(crate) struct InMemorySheetStore {
    sheets: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
}

impl InMemorySheetStore {
    pub(crate) fn with_standard_worksheets() -> Self {
        let store = Self::default();
        {
            let mut guard = store.sheets.lock().expect("sheet mutex poisoned");
            for category in SubmissionCategory::ordered() {
                guard.entry(category.worksheet().to_string()).or_default();
            }
        }
        store
    }

    pub(crate) fn rows(&self, worksheet: &str) -> Vec<Vec<String>> {
        self.sheets
            .lock()
            .expect("sheet mutex poisoned")
            .get(worksheet)
            .cloned()
            .unwrap_or_default()
    }
}

impl SheetStore for InMemorySheetStore {
    fn append(&self, worksheet: &str, row: Vec<String>) -> Result<u64, StoreError> {
        let mut guard = self.sheets.lock().expect("sheet mutex poisoned");
        match guard.get_mut(worksheet) {
            Some(rows) => {
                rows.push(row);
                // Row ids count from 1 with the header row occupying row 1.
                Ok(rows.len() as u64 + 1)
            }
            None => Err(StoreError::UnknownWorksheet(worksheet.to_string())),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySmsGateway {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl InMemorySmsGateway {
    pub(crate) fn deliveries(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("gateway mutex poisoned").clone()
    }
}

impl SmsGateway for InMemorySmsGateway {
    fn send(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        let mut guard = self.sent.lock().expect("gateway mutex poisoned");
        guard.push((to.to_string(), body.to_string()));
        Ok(SmsReceipt {
            message_id: format!("mem-{:06}", guard.len()),
        })
    }
}

pub(crate) fn default_notification_rules() -> Vec<NotificationRule> {
    vec![NotificationRule {
        recipient: "+15555551234".to_string(),
        active: true,
        forms: FormFilter::All,
        template: "New form submission: {formType} from {name} ({email}). Phone: {phone}"
            .to_string(),
    }]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
