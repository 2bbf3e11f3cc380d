//! Lookup table identity: public dropdown names mapped to storage tables,
//! plus the static column/header registry shared by reader and importer.
//!
//! Both maps are immutable `static` data; there is no API to mutate them.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::dropdowns::errors::DropdownError;

/// Every lookup table a form can draw options from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupTable {
    Race,
    Nationality,
    Qualification,
    Salutation,
    MaritalStatus,
    Religion,
    CountryOrigin,
    QualificationGrade,
    Industry,
    Job,
    Position,
    CessationReason,
    Hobby,
    Language,
    FieldArea,
}

impl LookupTable {
    pub const ALL: [LookupTable; 15] = [
        LookupTable::Race,
        LookupTable::Nationality,
        LookupTable::Qualification,
        LookupTable::Salutation,
        LookupTable::MaritalStatus,
        LookupTable::Religion,
        LookupTable::CountryOrigin,
        LookupTable::QualificationGrade,
        LookupTable::Industry,
        LookupTable::Job,
        LookupTable::Position,
        LookupTable::CessationReason,
        LookupTable::Hobby,
        LookupTable::Language,
        LookupTable::FieldArea,
    ];

    /// Resolves a public dropdown identifier, ignoring ASCII case.
    /// Never falls back to a default table.
    pub fn resolve(dropdown_name: &str) -> Result<Self, DropdownError> {
        let wanted = dropdown_name.trim();
        Self::ALL
            .into_iter()
            .find(|table| table.public_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DropdownError::UnknownTable(dropdown_name.to_string()))
    }

    /// The snake_case identifier clients use.
    pub fn public_name(self) -> &'static str {
        match self {
            LookupTable::Race => "race_codes",
            LookupTable::Nationality => "nationality_codes",
            LookupTable::Qualification => "qualification_codes",
            LookupTable::Salutation => "salutation",
            LookupTable::MaritalStatus => "marital_status_codes",
            LookupTable::Religion => "religion_codes",
            LookupTable::CountryOrigin => "country_origin_codes",
            LookupTable::QualificationGrade => "qualification_grades",
            LookupTable::Industry => "industry_codes",
            LookupTable::Job => "job_codes",
            LookupTable::Position => "position_code",
            LookupTable::CessationReason => "cessation_reasons",
            LookupTable::Hobby => "hobby_codes",
            LookupTable::Language => "language_codes",
            LookupTable::FieldArea => "field_area_codes",
        }
    }

    /// The Postgres table backing this lookup.
    pub fn storage_table(self) -> &'static str {
        match self {
            LookupTable::Salutation => "salutation_codes",
            LookupTable::Position => "position_codes",
            other => other.public_name(),
        }
    }

    /// Two-level (category / sub-category) tables.
    pub fn is_two_level(self) -> bool {
        matches!(self, LookupTable::Qualification)
    }
}

impl fmt::Display for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.public_name())
    }
}

impl Serialize for LookupTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.public_name())
    }
}

/// A storage column paired with the CSV header that feeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub column: &'static str,
    pub header: &'static str,
}

/// Column and header names for one lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub table: LookupTable,
    pub code: Column,
    pub name: Column,
    /// Present only for two-level tables: (sub code, sub name).
    pub sub: Option<(Column, Column)>,
}

impl ColumnMapping {
    const fn flat(table: LookupTable, code: Column, name: Column) -> Self {
        Self {
            table,
            code,
            name,
            sub: None,
        }
    }
}

const fn col(column: &'static str, header: &'static str) -> Column {
    Column { column, header }
}

/// Fixed set of column mappings, looked up per table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRegistry {
    entries: &'static [ColumnMapping],
}

impl ColumnRegistry {
    pub const fn new(entries: &'static [ColumnMapping]) -> Self {
        Self { entries }
    }

    pub fn mapping(&self, table: LookupTable) -> Result<&'static ColumnMapping, DropdownError> {
        self.entries
            .iter()
            .find(|m| m.table == table)
            .ok_or(DropdownError::MissingColumnMapping(table.public_name()))
    }
}

static MAPPINGS: [ColumnMapping; 15] = [
    ColumnMapping::flat(
        LookupTable::Race,
        col("race_code", "racecode"),
        col("race_name", "racename"),
    ),
    ColumnMapping::flat(
        LookupTable::Nationality,
        col("nationality_code", "nationalitycode"),
        col("nationality_name", "nationalityname"),
    ),
    ColumnMapping {
        table: LookupTable::Qualification,
        code: col("qualification_code", "qualificationcode"),
        name: col("qualification_name", "qualificationname"),
        sub: Some((
            col("qualification_sub_code", "qualificationsubcode"),
            col("qualification_sub_name", "qualificationsubname"),
        )),
    },
    ColumnMapping::flat(
        LookupTable::Salutation,
        col("salutation_code", "salutationcode"),
        col("salutation_name", "salutationname"),
    ),
    ColumnMapping::flat(
        LookupTable::MaritalStatus,
        col("marital_status_code", "maritalstatuscode"),
        col("marital_status_name", "maritalstatusname"),
    ),
    ColumnMapping::flat(
        LookupTable::Religion,
        col("religion_code", "religioncode"),
        col("religion_name", "religionname"),
    ),
    ColumnMapping::flat(
        LookupTable::CountryOrigin,
        col("country_origin_code", "countryorigincode"),
        col("country_origin_name", "countryoriginname"),
    ),
    ColumnMapping::flat(
        LookupTable::QualificationGrade,
        col("qualification_grade_code", "qualificationgradecode"),
        col("qualification_grade_name", "qualificationgradename"),
    ),
    ColumnMapping::flat(
        LookupTable::Industry,
        col("industry_code", "industrycode"),
        col("industry_name", "industryname"),
    ),
    ColumnMapping::flat(
        LookupTable::Job,
        col("job_code", "jobcode"),
        col("job_name", "jobname"),
    ),
    ColumnMapping::flat(
        LookupTable::Position,
        col("position_code", "positioncode"),
        col("position_name", "positionname"),
    ),
    ColumnMapping::flat(
        LookupTable::CessationReason,
        col("cessation_reason_code", "cessationreasoncode"),
        col("cessation_reason_name", "cessationreasonname"),
    ),
    ColumnMapping::flat(
        LookupTable::Hobby,
        col("hobby_code", "hobbycode"),
        col("hobby_name", "hobbyname"),
    ),
    ColumnMapping::flat(
        LookupTable::Language,
        col("language_code", "languagecode"),
        col("language_name", "languagename"),
    ),
    ColumnMapping::flat(
        LookupTable::FieldArea,
        col("field_area_code", "fieldareacode"),
        col("field_area_name", "fieldareaname"),
    ),
];

pub static COLUMN_MAPPINGS: ColumnRegistry = ColumnRegistry::new(&MAPPINGS);
