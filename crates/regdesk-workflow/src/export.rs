//! Single-record spreadsheet export for control framework entries.

use regdesk_core::ControlFramework;
use rust_xlsxwriter::{Format, Workbook};

use crate::error::WorkflowError;

const SHEET_NAME: &str = "Control Framework";

const HEADERS: [&str; 15] = [
    "ID",
    "Context",
    "Description",
    "Risk Management",
    "Country Applied",
    "Referral Source",
    "Domain",
    "Activity",
    "Market",
    "Law / Regulation",
    "Law Description",
    "Law Source",
    "Verified",
    "Created At",
    "Updated At",
];

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Suggested file name.
    pub file_name: String,
    /// xlsx bytes.
    pub bytes: Vec<u8>,
}

impl Export {
    /// MIME type of the payload.
    pub const CONTENT_TYPE: &'static str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
}

fn row(record: &ControlFramework) -> [String; 15] {
    let law = record.laws_and_regulations.as_ref();
    [
        record.id.to_string(),
        record.context.clone(),
        record.description.clone(),
        record.risk_management.clone(),
        record.country_applied.clone(),
        record.referral_source.clone(),
        record.domain_name().unwrap_or_default().to_string(),
        record.activity_name().unwrap_or_default().to_string(),
        record.market_name().unwrap_or_default().to_string(),
        record.law_name().unwrap_or_default().to_string(),
        law.map(|l| l.description.clone()).unwrap_or_default(),
        law.map(|l| l.source.clone()).unwrap_or_default(),
        (if record.verified { "Yes" } else { "No" }).to_string(),
        record.created_at.to_rfc3339(),
        record
            .updated_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_default(),
    ]
}

/// Render one entry as a workbook with a header row and one data row,
/// named `{id}.xlsx`.
pub fn export_control_framework(record: &ControlFramework) -> Result<Export, WorkflowError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, title) in (0u16..).zip(HEADERS) {
        worksheet.write_string_with_format(0, col, title, &header)?;
    }
    for (col, value) in (0u16..).zip(row(record)) {
        worksheet.write_string(1, col, value)?;
        worksheet.set_column_width(col, 20.0)?;
    }

    let bytes = workbook.save_to_buffer()?;
    tracing::debug!(control_framework = %record.id, bytes = bytes.len(), "control framework exported");
    Ok(Export {
        file_name: format!("{}.xlsx", record.id),
        bytes,
    })
}
