use serde::{Deserialize, Serialize};

/// Filing statuses offered by the interview, matching the radio choices
/// presented on the filing step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedJoint,
    MarriedSeparate,
    HeadHousehold,
    Widower,
}

impl FilingStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Single,
            Self::MarriedJoint,
            Self::MarriedSeparate,
            Self::HeadHousehold,
            Self::Widower,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::MarriedJoint => "Married Filing Jointly",
            Self::MarriedSeparate => "Married Filing Separately",
            Self::HeadHousehold => "Head of Household",
            Self::Widower => "Qualifying Surviving Spouse",
        }
    }
}

/// Income lines collected on the income step. Amounts are stored as raw
/// text on the record and only defaulted/labeled at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeField {
    Wages,
    Interest,
    Dividends,
    IraDistributions,
    Unemployment,
}

impl IncomeField {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Wages,
            Self::Interest,
            Self::Dividends,
            Self::IraDistributions,
            Self::Unemployment,
        ]
    }

    /// Long label used in the printable summary.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wages => "Wages, Salaries, Tips",
            Self::Interest => "Taxable Interest",
            Self::Dividends => "Ordinary Dividends",
            Self::IraDistributions => "IRA Distributions",
            Self::Unemployment => "Unemployment Comp.",
        }
    }

    /// Short label used in the flat row export.
    pub const fn export_label(self) -> &'static str {
        match self {
            Self::Wages => "Wages",
            Self::Interest => "Interest",
            Self::Dividends => "Dividends",
            Self::IraDistributions => "IRA Distributions",
            Self::Unemployment => "Unemployment",
        }
    }
}

/// A dependent claimed by the interview subject. Owned exclusively by the
/// record's dependents sequence; insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    pub name: String,
    pub ssn: String,
    pub relationship: String,
}

/// The accumulated interview answers for one subject. Created empty when
/// the wizard starts, mutated field-by-field, consumed once at finalize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub ssn: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub filing_status: FilingStatus,
    pub dependents: Vec<Dependent>,
    pub wages: String,
    pub interest: String,
    pub dividends: String,
    pub ira_distributions: String,
    pub unemployment: String,
}

impl InterviewRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn income_value(&self, field: IncomeField) -> &str {
        match field {
            IncomeField::Wages => &self.wages,
            IncomeField::Interest => &self.interest,
            IncomeField::Dividends => &self.dividends,
            IncomeField::IraDistributions => &self.ira_distributions,
            IncomeField::Unemployment => &self.unemployment,
        }
    }

    /// Income text for display, falling back to "0" when the subject left
    /// the line blank. The raw text is never assumed to parse as a number.
    pub fn income_display(&self, field: IncomeField) -> String {
        let raw = self.income_value(field).trim();
        if raw.is_empty() {
            "0".to_string()
        } else {
            raw.to_string()
        }
    }

    /// Merge a single field update, leaving every other field untouched.
    /// The dependents variant replaces the whole sequence atomically since
    /// dependents are edited by whole-list reconstruction.
    pub fn apply(&mut self, patch: RecordPatch) {
        match patch {
            RecordPatch::FirstName(value) => self.first_name = value,
            RecordPatch::LastName(value) => self.last_name = value,
            RecordPatch::Email(value) => self.email = value,
            RecordPatch::Phone(value) => self.phone = value,
            RecordPatch::Ssn(value) => self.ssn = value,
            RecordPatch::Address(value) => self.address = value,
            RecordPatch::City(value) => self.city = value,
            RecordPatch::State(value) => self.state = value,
            RecordPatch::Zip(value) => self.zip = value,
            RecordPatch::FilingStatus(value) => self.filing_status = value,
            RecordPatch::Dependents(value) => self.dependents = value,
            RecordPatch::Wages(value) => self.wages = value,
            RecordPatch::Interest(value) => self.interest = value,
            RecordPatch::Dividends(value) => self.dividends = value,
            RecordPatch::IraDistributions(value) => self.ira_distributions = value,
            RecordPatch::Unemployment(value) => self.unemployment = value,
        }
    }
}

/// Closed set of single-field updates the wizard accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPatch {
    FirstName(String),
    LastName(String),
    Email(String),
    Phone(String),
    Ssn(String),
    Address(String),
    City(String),
    State(String),
    Zip(String),
    FilingStatus(FilingStatus),
    Dependents(Vec<Dependent>),
    Wages(String),
    Interest(String),
    Dividends(String),
    IraDistributions(String),
    Unemployment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_defaults_are_empty_and_single() {
        let record = InterviewRecord::default();
        assert!(record.first_name.is_empty());
        assert_eq!(record.filing_status, FilingStatus::Single);
        assert!(record.dependents.is_empty());
        assert_eq!(record.income_display(IncomeField::Wages), "0");
    }

    #[test]
    fn apply_preserves_unrelated_fields() {
        let mut record = InterviewRecord::default();
        record.apply(RecordPatch::FirstName("Jane".to_string()));
        record.apply(RecordPatch::Wages("50000".to_string()));
        record.apply(RecordPatch::FilingStatus(FilingStatus::HeadHousehold));

        assert_eq!(record.first_name, "Jane");
        assert_eq!(record.wages, "50000");
        assert_eq!(record.filing_status, FilingStatus::HeadHousehold);
        assert!(record.last_name.is_empty());
    }

    #[test]
    fn dependents_replace_as_a_whole() {
        let mut record = InterviewRecord::default();
        record.apply(RecordPatch::Dependents(vec![Dependent {
            name: "Sam Doe".to_string(),
            ssn: "000-00-0001".to_string(),
            relationship: "Son".to_string(),
        }]));
        assert_eq!(record.dependents.len(), 1);

        record.apply(RecordPatch::Dependents(Vec::new()));
        assert!(record.dependents.is_empty());
    }

    #[test]
    fn filing_status_wire_names_match_form_ids() {
        let encoded = serde_json::to_string(&FilingStatus::HeadHousehold).expect("serialize");
        assert_eq!(encoded, "\"head_household\"");
        let decoded: FilingStatus = serde_json::from_str("\"widower\"").expect("deserialize");
        assert_eq!(decoded, FilingStatus::Widower);
    }

    #[test]
    fn income_display_keeps_raw_text() {
        let mut record = InterviewRecord::default();
        record.apply(RecordPatch::Interest(" 12.50 ".to_string()));
        assert_eq!(record.income_display(IncomeField::Interest), "12.50");
    }
}
