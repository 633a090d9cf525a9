//! Column mapping from a [`CleanTable`] onto project records.
//!
//! An operator picks which spreadsheet column feeds each record field.
//! Funding keeps only digits and `.`, dates go through
//! [`parse_date`](crate::dates::parse_date). A row whose funding cannot be
//! parsed is skipped and reported; the rest still map.

use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};

use rust_decimal::Decimal;
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::Serialize;

use crate::clean::CleanTable;
use crate::dates::{DateOrder, parse_date};
use crate::error::{IngestError, Result};

/// Record fields a column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectField {
    ProjectTh,
    ProjectEn,
    ResearcherName,
    ResearcherEmail,
    Affiliation,
    Funding,
    Deadline,
    StartDate,
    EndDate,
}

impl ProjectField {
    pub const ALL: [ProjectField; 9] = [
        ProjectField::ProjectTh,
        ProjectField::ProjectEn,
        ProjectField::ResearcherName,
        ProjectField::ResearcherEmail,
        ProjectField::Affiliation,
        ProjectField::Funding,
        ProjectField::Deadline,
        ProjectField::StartDate,
        ProjectField::EndDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectField::ProjectTh => "project_th",
            ProjectField::ProjectEn => "project_en",
            ProjectField::ResearcherName => "researcher_name",
            ProjectField::ResearcherEmail => "researcher_email",
            ProjectField::Affiliation => "affiliation",
            ProjectField::Funding => "funding",
            ProjectField::Deadline => "deadline",
            ProjectField::StartDate => "start_date",
            ProjectField::EndDate => "end_date",
        }
    }

    /// Column header used for this field in the import template.
    pub fn template_header(self) -> &'static str {
        match self {
            ProjectField::ProjectTh => "ชื่อโครงการ (TH)",
            ProjectField::ProjectEn => "ชื่อโครงการ (EN)",
            ProjectField::ResearcherName => "ผู้รับผิดชอบ",
            ProjectField::ResearcherEmail => "อีเมล",
            ProjectField::Affiliation => "สังกัด",
            ProjectField::Funding => "งบประมาณ",
            ProjectField::Deadline => "Deadline",
            ProjectField::StartDate => "วันเริ่มโครงการ",
            ProjectField::EndDate => "วันสิ้นสุดโครงการ",
        }
    }

    fn template_example(self) -> &'static str {
        match self {
            ProjectField::ProjectTh => "ตัวอย่าง: โครงการวิจัย ABC",
            ProjectField::ProjectEn => "Example: Research Project ABC",
            ProjectField::ResearcherName => "ชื่อ นามสกุล",
            ProjectField::ResearcherEmail => "email@example.com",
            ProjectField::Affiliation => "หน่วยงาน/คณะ",
            ProjectField::Funding => "100000",
            ProjectField::Deadline => "2024-12-31",
            ProjectField::StartDate => "2024-01-01",
            ProjectField::EndDate => "2024-12-31",
        }
    }
}

impl fmt::Display for ProjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectField {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = value.trim();
        ProjectField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known = ProjectField::ALL.map(ProjectField::as_str).join(", ");
                format!("unknown field '{wanted}' (expected one of {known})")
            })
    }
}

/// Field -> source column assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: BTreeMap<ProjectField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, field: ProjectField, column: impl Into<String>) -> &mut Self {
        let column = column.into();
        if column.trim().is_empty() {
            self.columns.remove(&field);
        } else {
            self.columns.insert(field, column);
        }
        self
    }

    pub fn column(&self, field: ProjectField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Maps every template header present in `columns`.
    pub fn from_template(columns: &[String]) -> Self {
        let mut mapping = ColumnMapping::new();
        for field in ProjectField::ALL {
            if let Some(column) = columns
                .iter()
                .find(|c| c.as_str() == field.template_header() || c.eq_ignore_ascii_case(field.as_str()))
            {
                mapping.assign(field, column.clone());
            }
        }
        mapping
    }

    /// Parses `field=column` pairs as given on the command line.
    pub fn parse_assignments<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapping = ColumnMapping::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (field, column) = pair.split_once('=').ok_or_else(|| IngestError::InvalidMapping {
                reason: format!("expected field=column, got '{pair}'"),
            })?;
            let field = field
                .parse::<ProjectField>()
                .map_err(|reason| IngestError::InvalidMapping { reason })?;
            mapping.assign(field, column.trim());
        }
        Ok(mapping)
    }
}

/// One mapped row. Missing text fields are empty, missing funding is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectRecord {
    pub project_th: String,
    pub project_en: String,
    pub researcher_name: String,
    pub researcher_email: String,
    pub affiliation: String,
    pub funding: Decimal,
    pub deadline: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based data row number.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappedRows {
    pub records: Vec<ProjectRecord>,
    pub skipped: Vec<SkippedRow>,
}

/// Strips everything except digits and `.`; empty means zero.
pub fn parse_funding(value: &str) -> std::result::Result<Decimal, String> {
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&digits).map_err(|e| format!("invalid funding '{value}': {e}"))
}

pub fn map_rows(table: &CleanTable, mapping: &ColumnMapping, order: DateOrder) -> Result<MappedRows> {
    if mapping.is_empty() {
        return Err(IngestError::InvalidMapping {
            reason: "map at least one field".into(),
        });
    }
    let mut indices = BTreeMap::new();
    for (field, column) in &mapping.columns {
        let idx = table
            .column_index(column)
            .ok_or_else(|| IngestError::InvalidMapping {
                reason: format!("column '{column}' for {field} is not in the table"),
            })?;
        indices.insert(*field, idx);
    }

    let mut mapped = MappedRows::default();
    for (row_idx, row) in table.rows().iter().enumerate() {
        let get = |field: ProjectField| {
            indices
                .get(&field)
                .map(|idx| row[*idx].as_str())
                .unwrap_or("")
        };
        let funding = match parse_funding(get(ProjectField::Funding)) {
            Ok(amount) => amount,
            Err(reason) => {
                mapped.skipped.push(SkippedRow {
                    row: row_idx + 1,
                    reason,
                });
                continue;
            }
        };
        mapped.records.push(ProjectRecord {
            project_th: get(ProjectField::ProjectTh).to_string(),
            project_en: get(ProjectField::ProjectEn).to_string(),
            researcher_name: get(ProjectField::ResearcherName).to_string(),
            researcher_email: get(ProjectField::ResearcherEmail).trim().to_string(),
            affiliation: get(ProjectField::Affiliation).to_string(),
            funding,
            deadline: parse_date(get(ProjectField::Deadline), order),
            start_date: parse_date(get(ProjectField::StartDate), order),
            end_date: parse_date(get(ProjectField::EndDate), order),
        });
    }
    Ok(mapped)
}

/// Writes the quick-import template: one `Projects` sheet with the template
/// headers and an example row.
pub fn write_template(path: &Path) -> std::result::Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Projects")?;
    for (col, field) in ProjectField::ALL.into_iter().enumerate() {
        let col = col as u16;
        worksheet.write_string(0, col, field.template_header())?;
        match field {
            ProjectField::Funding => {
                worksheet.write_number(1, col, 100_000.0)?;
            }
            _ => {
                worksheet.write_string(1, col, field.template_example())?;
            }
        }
    }
    workbook.save(path)
}
