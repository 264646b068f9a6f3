use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RegScopeError;

/// A named agency. The display name is the identity key; no numeric ID exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agency {
    pub name: String,
}

impl Agency {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A numbered regulatory volume, referenced by one or more agencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub number: u32,
    #[serde(default)]
    pub sections: Option<u64>,
    #[serde(default)]
    pub agencies: Vec<Agency>,
}

impl Title {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            sections: None,
            agencies: Vec::new(),
        }
    }

    pub fn with_sections(mut self, sections: u64) -> Self {
        self.sections = Some(sections);
        self
    }

    pub fn with_agency(mut self, name: impl Into<String>) -> Self {
        self.agencies.push(Agency::new(name));
        self
    }

    /// Whether `agency` is listed among the title's agencies.
    pub fn references(&self, agency: &str) -> bool {
        self.agencies.iter().any(|a| a.name == agency)
    }
}

/// Recursive unit of document structure as delivered by the structure endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    pub fn branch(text: Option<String>, children: Vec<DocumentNode>) -> Self {
        Self { text, children }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencyWordCount {
    pub name: String,
    pub word_count: u64,
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityScore {
    pub name: String,
    pub complexity_score: f64,
    pub reading_level: f64,
    pub technical_terms: u64,
    pub cross_references: u64,
}

/// Calendar month key, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month of the year, 1-based.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Whole months from `self` to `later`; negative when `later` precedes `self`.
    pub fn months_until(&self, later: &YearMonth) -> i64 {
        (later.year as i64 - self.year as i64) * 12 + (later.month as i64 - self.month as i64)
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = RegScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegScopeError::MalformedResponse(format!("invalid year-month: {}", s));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = RegScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Inclusive date range; only the months of the endpoints matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window of `years` ending at `end`.
    pub fn trailing_years(end: NaiveDate, years: u32) -> Self {
        let start = end
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// Number of months between the endpoint months; zero or negative for a one-month or reversed range.
    pub fn months_between(&self) -> i64 {
        YearMonth::from(self.start).months_until(&YearMonth::from(self.end))
    }

    /// Every calendar month from start to end, both inclusive. Empty when reversed.
    pub fn months(&self) -> impl Iterator<Item = YearMonth> {
        let count = (self.months_between() + 1).max(0) as usize;
        std::iter::successors(Some(YearMonth::from(self.start)), |ym| Some(ym.succ())).take(count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDataPoint {
    pub date: YearMonth,
    pub regulation_count: u64,
    pub word_count: u64,
    #[serde(default)]
    pub events: Vec<String>,
}

/// The single artifact handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total_agencies: usize,
    pub total_words: u64,
    pub total_regulations: u64,
    pub agency_word_counts: Vec<AgencyWordCount>,
    pub historical_changes: Vec<HistoricalDataPoint>,
    pub complexity_scores: Vec<ComplexityScore>,
    /// Set when any section or agency was filled with synthetic values.
    #[serde(default)]
    pub degraded: bool,
}

impl AggregateSummary {
    /// Derive the totals from the merged collections.
    pub fn assemble(
        agency_word_counts: Vec<AgencyWordCount>,
        historical_changes: Vec<HistoricalDataPoint>,
        complexity_scores: Vec<ComplexityScore>,
        degraded: bool,
    ) -> Self {
        let total_agencies = agency_word_counts.len();
        let total_words = agency_word_counts.iter().map(|a| a.word_count).sum();
        let total_regulations = historical_changes
            .last()
            .map(|point| point.regulation_count)
            .unwrap_or(0);

        Self {
            total_agencies,
            total_words,
            total_regulations,
            agency_word_counts,
            historical_changes,
            complexity_scores,
            degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn year_month_formats_and_parses() {
        let ym = YearMonth::new(2020, 3).unwrap();
        assert_eq!(ym.to_string(), "2020-03");
        assert_eq!("2020-03".parse::<YearMonth>().unwrap(), ym);
        assert!("2020-13".parse::<YearMonth>().is_err());
        assert!("march".parse::<YearMonth>().is_err());
    }

    #[test]
    fn year_month_rolls_over_december() {
        let dec = YearMonth::new(2019, 12).unwrap();
        assert_eq!(dec.succ(), YearMonth::new(2020, 1).unwrap());
        assert_eq!(dec.months_until(&YearMonth::new(2021, 2).unwrap()), 14);
    }

    #[test]
    fn range_months_ignore_day_of_month() {
        let range = DateRange::new(date(2020, 1, 31), date(2020, 3, 1));
        let months: Vec<String> = range.months().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2020-01", "2020-02", "2020-03"]);
    }

    #[test]
    fn reversed_range_is_empty() {
        let range = DateRange::new(date(2021, 5, 1), date(2020, 5, 1));
        assert_eq!(range.months().count(), 0);
    }

    #[test]
    fn trailing_window_spans_ten_years() {
        let range = DateRange::trailing_years(date(2026, 10, 19), 10);
        assert_eq!(range.start, date(2016, 10, 19));
        assert_eq!(range.months().count(), 121);
    }

    #[test]
    fn title_deserializes_without_optional_fields() {
        let title: Title = serde_json::from_str(r#"{"number": 7, "name": "Agriculture"}"#).unwrap();
        assert_eq!(title.number, 7);
        assert_eq!(title.sections, None);
        assert!(title.agencies.is_empty());
    }

    #[test]
    fn summary_totals_come_from_collections() {
        let counts = vec![
            AgencyWordCount {
                name: "A".into(),
                word_count: 10,
                checksum: "00000000".into(),
            },
            AgencyWordCount {
                name: "B".into(),
                word_count: 5,
                checksum: "11111111".into(),
            },
        ];
        let history = vec![
            HistoricalDataPoint {
                date: YearMonth::new(2020, 1).unwrap(),
                regulation_count: 3,
                word_count: 1500,
                events: vec![],
            },
            HistoricalDataPoint {
                date: YearMonth::new(2020, 2).unwrap(),
                regulation_count: 4,
                word_count: 2000,
                events: vec![],
            },
        ];
        let summary = AggregateSummary::assemble(counts, history, vec![], false);
        assert_eq!(summary.total_agencies, 2);
        assert_eq!(summary.total_words, 15);
        assert_eq!(summary.total_regulations, 4);
    }

    #[test]
    fn summary_serializes_with_camel_case_keys() {
        let summary = AggregateSummary::assemble(vec![], vec![], vec![], true);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("totalAgencies").is_some());
        assert!(json.get("agencyWordCounts").is_some());
        assert_eq!(json["totalRegulations"], 0);
    }
}
