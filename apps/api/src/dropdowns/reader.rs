//! Shaping visible rows into form options.
//!
//! Ordering is byte-wise ordinal on the name (Rust `str` ordering, the
//! same as Postgres `COLLATE "C"`), with code as a tie-breaker so the output
//! is fully deterministic.

use std::collections::BTreeSet;

use crate::dropdowns::records::{
    DropdownOption, LookupRecord, QualificationRecord, QualificationSubOption,
};

/// De-duplicates by (code, name) and orders by name.
pub fn collect_options<I>(pairs: I) -> Vec<DropdownOption>
where
    I: IntoIterator<Item = (String, String)>,
{
    let unique: BTreeSet<(String, String)> = pairs
        .into_iter()
        .map(|(code, name)| (name, code))
        .collect();

    unique
        .into_iter()
        .map(|(name, code)| DropdownOption { code, name })
        .collect()
}

pub fn lookup_options(rows: Vec<LookupRecord>) -> Vec<DropdownOption> {
    collect_options(rows.into_iter().map(|r| (r.code, r.name)))
}

/// Category-level options of the qualification table.
pub fn qualification_categories(rows: Vec<QualificationRecord>) -> Vec<DropdownOption> {
    collect_options(rows.into_iter().map(|r| (r.code, r.name)))
}

/// Sub-category options under `main_code`, ordered by sub name.
pub fn qualification_sub_options(
    rows: Vec<QualificationRecord>,
    main_code: &str,
) -> Vec<QualificationSubOption> {
    let unique: BTreeSet<(String, String)> = rows
        .into_iter()
        .filter(|r| r.code == main_code)
        .map(|r| (r.sub_name, r.sub_code))
        .collect();

    unique
        .into_iter()
        .map(|(sub_name, sub_code)| QualificationSubOption { sub_code, sub_name })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dropdowns::tenant::TenantScope;

    fn pair(code: &str, name: &str) -> (String, String) {
        (code.to_string(), name.to_string())
    }

    #[test]
    fn test_options_sorted_by_name() {
        let options = collect_options(vec![pair("Z", "Alpha"), pair("A", "Zulu"), pair("M", "Mike")]);
        let names: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Mike", "Zulu"]);
    }

    #[test]
    fn test_duplicate_code_and_name_collapse() {
        let options = collect_options(vec![pair("MR", "Mister"), pair("MR", "Mister")]);
        assert_eq!(options.len(), 1);
    }

    #[test]
    fn test_same_code_different_name_stays_distinct() {
        let options = collect_options(vec![pair("MR", "Mister"), pair("MR", "Mr.")]);
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_ordering_is_case_sensitive_ordinal() {
        let options = collect_options(vec![pair("b", "banana"), pair("A", "Apple"), pair("c", "Cherry")]);
        let names: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Cherry", "banana"]);
    }

    #[test]
    fn test_sub_options_filtered_and_sorted() {
        let global = TenantScope::global();
        let rows = vec![
            QualificationRecord::new("DEG", "MSC", global.clone(), "Degree", "Master of Science"),
            QualificationRecord::new("DEG", "BSC", global.clone(), "Degree", "Bachelor of Science"),
            QualificationRecord::new("DIP", "ENG", global, "Diploma", "Engineering"),
        ];
        let subs = qualification_sub_options(rows, "DEG");
        let codes: Vec<_> = subs.iter().map(|s| s.sub_code.as_str()).collect();
        assert_eq!(codes, vec!["BSC", "MSC"]);
    }

    #[test]
    fn test_categories_collapse_sub_rows() {
        let global = TenantScope::global();
        let rows = vec![
            QualificationRecord::new("DEG", "MSC", global.clone(), "Degree", "MSc"),
            QualificationRecord::new("DEG", "BSC", global, "Degree", "BSc"),
        ];
        assert_eq!(
            qualification_categories(rows),
            vec![DropdownOption {
                code: "DEG".to_string(),
                name: "Degree".to_string()
            }]
        );
    }
}
