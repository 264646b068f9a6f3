use crate::complexity::ComplexityAnalyzer;
use crate::history::events_for;
use parking_lot::Mutex;
use regscope_core::{
    content_checksum, AgencyWordCount, AggregateSummary, ComplexityScore, DateRange,
    HistoricalDataPoint, HistoryConfig, YearMonth,
};
use std::ops::Range;

/// Agencies used when no live agency list is available
pub const SYNTHETIC_ROSTER: [&str; 27] = [
    "Department of Agriculture",
    "Department of Commerce",
    "Department of Defense",
    "Department of Education",
    "Department of Energy",
    "Department of Health and Human Services",
    "Department of Homeland Security",
    "Department of Housing and Urban Development",
    "Department of the Interior",
    "Department of Justice",
    "Department of Labor",
    "Department of State",
    "Department of Transportation",
    "Department of the Treasury",
    "Department of Veterans Affairs",
    "Environmental Protection Agency",
    "Equal Employment Opportunity Commission",
    "Federal Communications Commission",
    "Federal Reserve System",
    "Federal Trade Commission",
    "Food and Drug Administration",
    "Internal Revenue Service",
    "National Aeronautics and Space Administration",
    "Nuclear Regulatory Commission",
    "Securities and Exchange Commission",
    "Small Business Administration",
    "Social Security Administration",
];

const HIGH_VOLUME: [&str; 3] = ["Health", "Treasury", "Transportation"];
const MID_VOLUME: [&str; 2] = ["Environmental", "Securities"];

const HIGH_WORDS: Range<u64> = 3_000_000..8_000_000;
const MID_WORDS: Range<u64> = 2_000_000..5_000_000;
const BASE_WORDS: Range<u64> = 500_000..2_500_000;

const READING_LEVEL_FLOOR: f64 = 12.0;
const READING_LEVEL_SPAN: f64 = 6.0;
const TECHNICAL_TERMS: Range<u64> = 1_000..6_000;
const CROSS_REFERENCES: Range<u64> = 500..3_500;

const START_REGULATIONS: f64 = 180_000.0;
const START_WORDS: f64 = 80_000_000.0;
/// Monthly change is drawn from [-0.2%, +0.8%)
const DRIFT_SPAN: f64 = 0.01;
const DRIFT_FLOOR: f64 = 0.002;
/// Regulation counts move at this fraction of the word-count change
const REGULATION_DAMPING: f64 = 0.8;

/// Stand-in data with the live schema. Has no I/O and cannot fail.
pub struct SyntheticGenerator {
    rng: Mutex<fastrand::Rng>,
    history: HistoryConfig,
}

impl SyntheticGenerator {
    pub fn new(history: HistoryConfig) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
            history,
        }
    }

    /// Reproducible values for tests and offline runs.
    pub fn with_seed(history: HistoryConfig, seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
            history,
        }
    }

    /// Word count drawn from the band matching the agency name.
    pub fn word_count_for(&self, agency: &str) -> u64 {
        let band = if HIGH_VOLUME.iter().any(|k| agency.contains(k)) {
            HIGH_WORDS
        } else if MID_VOLUME.iter().any(|k| agency.contains(k)) {
            MID_WORDS
        } else {
            BASE_WORDS
        };
        self.rng.lock().u64(band)
    }

    pub fn agency_word_count(&self, agency: &str) -> AgencyWordCount {
        let word_count = self.word_count_for(agency);
        AgencyWordCount {
            name: agency.to_string(),
            word_count,
            checksum: content_checksum(&format!("{}{}", agency, word_count)),
        }
    }

    /// Random components scored with the same composite formula as live samples.
    pub fn complexity_for(&self, agency: &str) -> ComplexityScore {
        let (reading_level, technical_terms, cross_references) = {
            let mut rng = self.rng.lock();
            (
                READING_LEVEL_FLOOR + rng.f64() * READING_LEVEL_SPAN,
                rng.u64(TECHNICAL_TERMS),
                rng.u64(CROSS_REFERENCES),
            )
        };
        ComplexityAnalyzer::score(
            agency,
            reading_level,
            technical_terms as f64,
            cross_references as f64,
        )
    }

    /// Random walk with a small positive drift, one point per month of `range`.
    ///
    /// A reversed range yields a single point for its end month.
    pub fn history(&self, range: &DateRange) -> Vec<HistoricalDataPoint> {
        let mut months: Vec<YearMonth> = range.months().collect();
        if months.is_empty() {
            months.push(YearMonth::from(range.end));
        }

        let mut rng = self.rng.lock();
        let mut words = START_WORDS;
        let mut regulations = START_REGULATIONS;

        months
            .into_iter()
            .map(|month| {
                let change = rng.f64() * DRIFT_SPAN - DRIFT_FLOOR;
                words = (words * (1.0 + change)).floor();
                regulations = (regulations * (1.0 + change * REGULATION_DAMPING)).floor();

                HistoricalDataPoint {
                    date: month,
                    regulation_count: regulations as u64,
                    word_count: words as u64,
                    events: events_for(&self.history.events, month),
                }
            })
            .collect()
    }

    /// Fully synthetic summary over the fixed roster; always marked degraded.
    pub fn summary(&self, range: &DateRange) -> AggregateSummary {
        let word_counts = SYNTHETIC_ROSTER
            .iter()
            .map(|name| self.agency_word_count(name))
            .collect();
        let complexity = SYNTHETIC_ROSTER
            .iter()
            .map(|name| self.complexity_for(name))
            .collect();

        AggregateSummary::assemble(word_counts, self.history(range), complexity, true)
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn decade() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
        )
    }

    #[test]
    fn summary_covers_the_whole_roster() {
        let generator = SyntheticGenerator::with_seed(HistoryConfig::default(), 11);
        let summary = generator.summary(&decade());

        assert_eq!(summary.total_agencies, SYNTHETIC_ROSTER.len());
        assert_eq!(summary.complexity_scores.len(), SYNTHETIC_ROSTER.len());
        assert_eq!(summary.historical_changes.len(), 120);
        assert!(summary.degraded);
        assert_eq!(
            summary.total_words,
            summary.agency_word_counts.iter().map(|a| a.word_count).sum::<u64>()
        );
        assert_eq!(
            summary.total_regulations,
            summary.historical_changes.last().unwrap().regulation_count
        );
    }

    #[test]
    fn word_counts_follow_name_bands() {
        let generator = SyntheticGenerator::with_seed(HistoryConfig::default(), 5);
        for _ in 0..200 {
            assert!(HIGH_WORDS.contains(&generator.word_count_for("Department of the Treasury")));
            assert!(MID_WORDS.contains(&generator.word_count_for("Securities and Exchange Commission")));
            assert!(BASE_WORDS.contains(&generator.word_count_for("Department of Labor")));
        }
    }

    #[test]
    fn complexity_components_stay_in_range() {
        let generator = SyntheticGenerator::with_seed(HistoryConfig::default(), 9);
        for _ in 0..200 {
            let score = generator.complexity_for("Federal Trade Commission");
            assert!((12.0..18.0).contains(&score.reading_level));
            assert!(TECHNICAL_TERMS.contains(&score.technical_terms));
            assert!(CROSS_REFERENCES.contains(&score.cross_references));

            let expected = ComplexityAnalyzer::composite_score(
                score.reading_level,
                score.technical_terms as f64,
                score.cross_references as f64,
            );
            assert!((score.complexity_score - expected).abs() <= 0.05 + 1e-9);
        }
    }

    #[test]
    fn history_walk_drifts_within_bounds() {
        let generator = SyntheticGenerator::with_seed(HistoryConfig::default(), 1);
        let series = generator.history(&decade());

        let mut previous = START_WORDS;
        for point in &series {
            let words = point.word_count as f64;
            assert!(words >= (previous * (1.0 - DRIFT_FLOOR)).floor() - 1.0);
            assert!(words <= previous * (1.0 + DRIFT_SPAN - DRIFT_FLOOR));
            previous = words;
        }

        let covid = series.iter().find(|p| p.date.to_string() == "2020-03").unwrap();
        assert_eq!(covid.events, vec!["COVID-19 emergency regulations"]);
    }

    #[test]
    fn history_is_never_empty() {
        let generator = SyntheticGenerator::default();
        let reversed = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
        );
        let series = generator.history(&reversed);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date.to_string(), "2023-06");
    }

    #[test]
    fn seeded_generators_agree() {
        let a = SyntheticGenerator::with_seed(HistoryConfig::default(), 77).summary(&decade());
        let b = SyntheticGenerator::with_seed(HistoryConfig::default(), 77).summary(&decade());
        assert_eq!(a, b);
    }

    #[test]
    fn checksum_fingerprints_name_and_count() {
        let generator = SyntheticGenerator::with_seed(HistoryConfig::default(), 3);
        let record = generator.agency_word_count("Department of Energy");
        assert_eq!(
            record.checksum,
            content_checksum(&format!("Department of Energy{}", record.word_count))
        );
        assert_eq!(record.checksum.len(), 8);
    }
}
