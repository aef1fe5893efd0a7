use serde::{Deserialize, Serialize};

/// Position of the name field in a record.
pub const NAME_FIELD: usize = 0;
/// Position of the number field in a record.
pub const NUMBER_FIELD: usize = 1;

/// One row of tabular data, fields addressed by position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: Vec<String>,
}

impl Record {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Record {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Field at `index`, or the empty string when the row is too short.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.field(NAME_FIELD)
    }

    pub fn number(&self) -> &str {
        self.field(NUMBER_FIELD)
    }
}

/// The two search boxes above a records table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
}

impl FilterQuery {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        FilterQuery {
            name: name.into(),
            number: number.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.number.is_empty()
    }

    pub fn apply(&self, records: &[Record]) -> Vec<bool> {
        filter_records(records, &self.name, &self.number)
    }
}

/// Computes row visibility for a records table.
///
/// A record is visible when its name field contains `name_filter` and its
/// number field contains `number_filter`, both compared case-insensitively.
/// The result is index-aligned with `records`; nothing is cached between
/// calls.
pub fn filter_records(records: &[Record], name_filter: &str, number_filter: &str) -> Vec<bool> {
    let name_filter = name_filter.to_lowercase();
    let number_filter = number_filter.to_lowercase();

    records
        .iter()
        .map(|record| {
            record.name().to_lowercase().contains(&name_filter)
                && record.number().to_lowercase().contains(&number_filter)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new(["John Doe", "0712345678"]),
            Record::new(["Jane Smith", "0798765432"]),
            Record::new(["JOHNNY Cash", "0700000001"]),
            Record::new(["Nameless"]),
        ]
    }

    #[test]
    fn empty_filters_show_everything() {
        let records = sample();
        assert_eq!(filter_records(&records, "", ""), vec![true; records.len()]);
    }

    #[test]
    fn name_filter_ignores_case() {
        let records = sample();
        let upper = filter_records(&records, "JOHN", "");
        let lower = filter_records(&records, "john", "");
        assert_eq!(upper, lower);
        assert_eq!(upper, vec![true, false, true, false]);
    }

    #[test]
    fn both_filters_must_match() {
        let records = sample();
        assert_eq!(
            filter_records(&records, "john", "0001"),
            vec![false, false, true, false]
        );
    }

    #[test]
    fn missing_field_only_matches_empty_filter() {
        let records = sample();
        assert_eq!(filter_records(&records, "nameless", ""), vec![false, false, false, true]);
        assert_eq!(filter_records(&records, "nameless", "0"), vec![false; 4]);
        assert_eq!(Record::default().name(), "");
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = sample();
        let first = filter_records(&records, "an", "07");
        let second = filter_records(&records, "an", "07");
        assert_eq!(first, second);
    }

    #[test]
    fn query_applies_both_boxes() {
        let records = sample();
        let query = FilterQuery::new("j", "07");
        assert!(!query.is_empty());
        assert_eq!(query.apply(&records), vec![true, true, true, false]);
    }
}
