use super::RenderError;
use crate::workflows::interview::domain::{IncomeField, InterviewRecord};

/// One `(Category, Field, Value)` triple of the machine-readable export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub category: &'static str,
    pub field: String,
    pub value: String,
}

impl ExportRow {
    fn new(category: &'static str, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category,
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Flatten a record into its ordered export rows: the fixed personal,
/// filing, and income rows followed by three rows per dependent labeled
/// with the dependent's 1-based index. Missing values become empty
/// strings, never a literal "undefined" or "null".
pub fn flat_rows(record: &InterviewRecord) -> Vec<ExportRow> {
    let mut rows = vec![
        ExportRow::new("Personal", "First Name", record.first_name.clone()),
        ExportRow::new("Personal", "Last Name", record.last_name.clone()),
        ExportRow::new("Personal", "SSN", record.ssn.clone()),
        ExportRow::new("Personal", "Address", record.address.clone()),
        ExportRow::new("Personal", "City", record.city.clone()),
        ExportRow::new("Personal", "State", record.state.clone()),
        ExportRow::new("Personal", "Zip", record.zip.clone()),
        ExportRow::new("Personal", "Phone", record.phone.clone()),
        ExportRow::new("Filing", "Status", record.filing_status.label()),
    ];

    for field in IncomeField::ordered() {
        rows.push(ExportRow::new(
            "Income",
            field.export_label(),
            record.income_value(field),
        ));
    }

    for (index, dependent) in record.dependents.iter().enumerate() {
        let ordinal = index + 1;
        rows.push(ExportRow::new(
            "Dependent",
            format!("Dependent {ordinal} Name"),
            dependent.name.clone(),
        ));
        rows.push(ExportRow::new(
            "Dependent",
            format!("Dependent {ordinal} SSN"),
            dependent.ssn.clone(),
        ));
        rows.push(ExportRow::new(
            "Dependent",
            format!("Dependent {ordinal} Rel"),
            dependent.relationship.clone(),
        ));
    }

    rows
}

/// Render the flat export as CSV text: a `Category,Field,Value` header,
/// every cell quoted (internal quotes doubled), rows terminated with CRLF.
pub fn csv_string(record: &InterviewRecord) -> Result<String, RenderError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(["Category", "Field", "Value"])?;
    for row in flat_rows(record) {
        writer.write_record([row.category, row.field.as_str(), row.value.as_str()])?;
    }

    let buffer = writer
        .into_inner()
        .map_err(|err| RenderError::Io(err.into_error()))?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
