//! CSV import of lookup batches.
//!
//! Each table declares its header names in the column registry. Headers are
//! matched exactly (case-sensitive); extra columns are ignored.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::dropdowns::errors::DropdownError;
use crate::dropdowns::records::{LookupRecord, QualificationRecord, ReplaceBatch};
use crate::dropdowns::tables::{Column, ColumnMapping};
use crate::dropdowns::tenant::TenantScope;

fn header_index(headers: &StringRecord, column: Column) -> Result<usize, DropdownError> {
    headers
        .iter()
        .position(|h| h == column.header)
        .ok_or_else(|| DropdownError::Import(format!("missing column '{}'", column.header)))
}

fn field(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().to_string()
}

/// Parses CSV into a replace batch owned by `tenant`. Rows with a blank
/// code are skipped.
pub fn parse_csv<R: Read>(
    mapping: &ColumnMapping,
    tenant: &TenantScope,
    input: R,
) -> Result<ReplaceBatch, DropdownError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);
    let headers = reader.headers()?.clone();

    let code_idx = header_index(&headers, mapping.code)?;
    let name_idx = header_index(&headers, mapping.name)?;

    match mapping.sub {
        None => {
            let mut rows = Vec::new();
            for record in reader.records() {
                let record = record?;
                let code = field(&record, code_idx);
                if code.is_empty() {
                    continue;
                }
                rows.push(LookupRecord::new(code, tenant.clone(), field(&record, name_idx)));
            }
            Ok(ReplaceBatch::Flat(rows))
        }
        Some((sub_code_col, sub_name_col)) => {
            let sub_code_idx = header_index(&headers, sub_code_col)?;
            let sub_name_idx = header_index(&headers, sub_name_col)?;

            let mut rows = Vec::new();
            for record in reader.records() {
                let record = record?;
                let code = field(&record, code_idx);
                if code.is_empty() {
                    continue;
                }
                rows.push(QualificationRecord::new(
                    code,
                    field(&record, sub_code_idx),
                    tenant.clone(),
                    field(&record, name_idx),
                    field(&record, sub_name_idx),
                ));
            }
            Ok(ReplaceBatch::Qualification(rows))
        }
    }
}
