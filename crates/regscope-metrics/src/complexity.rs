use crate::sampling::{select_titles, Measured, SampleContext};
use crate::synthetic::SyntheticGenerator;
use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use regscope_core::{ComplexityScore, RegScopeError, Result, Title};
use tracing::{debug, warn};

const READING_LEVEL_MIN: f64 = 10.0;
const READING_LEVEL_MAX: f64 = 20.0;
/// Words longer than this many characters count as technical terms
const TECHNICAL_TERM_LEN: usize = 8;

lazy_static! {
    static ref MARKUP: Regex = Regex::new(r"<[^>]*>").expect("valid markup pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace pattern");
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+").expect("valid sentence pattern");
    static ref CROSS_REFERENCE: Regex =
        Regex::new(r"(?i)section [0-9]+|part [0-9]+|title [0-9]+").expect("valid reference pattern");
}

/// Readability heuristics for one text sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Grade-level estimate clamped to [10, 20]
    pub reading_level: f64,
    pub technical_terms: u64,
    pub cross_references: u64,
}

/// Fixed, reproducible approximation of document complexity.
pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    /// Replace tags with spaces, collapse whitespace runs, trim.
    pub fn strip_markup(raw: &str) -> String {
        let untagged = MARKUP.replace_all(raw, " ");
        WHITESPACE.replace_all(&untagged, " ").trim().to_string()
    }

    /// Vowel-group count of a single word, at least 1.
    pub fn count_syllables(word: &str) -> usize {
        word.to_lowercase()
            .split(|c: char| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y'))
            .filter(|group| !group.is_empty())
            .count()
            .max(1)
    }

    pub fn analyze(raw: &str) -> TextMetrics {
        let plain = Self::strip_markup(raw);

        let sentences = SENTENCE_END
            .split(&plain)
            .filter(|s| !s.is_empty())
            .count();
        let words: Vec<&str> = plain.split_whitespace().collect();
        let syllables: usize = words.iter().map(|w| Self::count_syllables(w)).sum();

        let words_per_sentence = words.len() as f64 / sentences.max(1) as f64;
        let syllables_per_word = syllables as f64 / words.len().max(1) as f64;
        let grade = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;

        TextMetrics {
            reading_level: grade.clamp(READING_LEVEL_MIN, READING_LEVEL_MAX),
            technical_terms: words
                .iter()
                .filter(|w| w.chars().count() > TECHNICAL_TERM_LEN)
                .count() as u64,
            cross_references: CROSS_REFERENCE.find_iter(&plain).count() as u64,
        }
    }

    /// Unrounded composite score.
    pub fn composite_score(reading_level: f64, technical_terms: f64, cross_references: f64) -> f64 {
        (reading_level - READING_LEVEL_MIN) * 5.0
            + technical_terms / 1000.0
            + cross_references / 500.0
    }

    /// Score record with the composite rounded to one decimal place.
    pub fn score(
        name: &str,
        reading_level: f64,
        technical_terms: f64,
        cross_references: f64,
    ) -> ComplexityScore {
        let composite = Self::composite_score(reading_level, technical_terms, cross_references);
        ComplexityScore {
            name: name.to_string(),
            complexity_score: (composite * 10.0).round() / 10.0,
            reading_level,
            technical_terms: technical_terms.round() as u64,
            cross_references: cross_references.round() as u64,
        }
    }
}

/// Per-agency complexity over a capped sample of titles, averaged across samples
pub struct ComplexityAggregator {
    title_cap: usize,
}

impl ComplexityAggregator {
    pub fn new(title_cap: usize) -> Self {
        Self { title_cap }
    }

    pub async fn sample(
        &self,
        ctx: &SampleContext<'_>,
        agency: &str,
        titles: &[Title],
    ) -> Result<ComplexityScore> {
        let selected = select_titles(titles, agency, self.title_cap);
        let fetched = join_all(selected.iter().map(|t| ctx.fetch_raw_text(t.number))).await;

        let mut reading_level = 0.0;
        let mut technical_terms = 0.0;
        let mut cross_references = 0.0;
        let mut samples = 0usize;

        for (title, result) in selected.iter().zip(fetched) {
            match result {
                Ok(text) => {
                    let metrics = ComplexityAnalyzer::analyze(&text);
                    reading_level += metrics.reading_level;
                    technical_terms += metrics.technical_terms as f64;
                    cross_references += metrics.cross_references as f64;
                    samples += 1;
                }
                Err(e) => warn!(agency, title = title.number, "Content fetch failed: {}", e),
            }
        }

        if samples == 0 {
            return Err(RegScopeError::SampleExhausted(agency.to_string()));
        }

        let n = samples as f64;
        Ok(ComplexityAnalyzer::score(
            agency,
            reading_level / n,
            technical_terms / n,
            cross_references / n,
        ))
    }

    pub async fn measure(
        &self,
        ctx: &SampleContext<'_>,
        agency: &str,
        titles: &[Title],
        synthetic: &SyntheticGenerator,
    ) -> Measured<ComplexityScore> {
        match self.sample(ctx, agency, titles).await {
            Ok(score) => Measured::live(score),
            Err(e) => {
                debug!(agency, "Using synthetic complexity: {}", e);
                Measured::synthetic(synthetic.complexity_for(agency))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn markup_is_stripped_and_whitespace_collapsed() {
        let plain = ComplexityAnalyzer::strip_markup("<p>Section  5</p>\n<b>requires</b>   compliance.");
        assert_eq!(plain, "Section 5 requires compliance.");
    }

    #[test]
    fn syllables_follow_vowel_groups() {
        assert_eq!(ComplexityAnalyzer::count_syllables("compliance."), 3);
        assert_eq!(ComplexityAnalyzer::count_syllables("the"), 1);
        assert_eq!(ComplexityAnalyzer::count_syllables("rhythm"), 1);
        assert_eq!(ComplexityAnalyzer::count_syllables("5"), 1);
        assert_eq!(ComplexityAnalyzer::count_syllables("Regulation"), 4);
        // Adjacent vowels form one group
        assert_eq!(ComplexityAnalyzer::count_syllables("queueing"), 1);
    }

    #[test]
    fn section_reference_sample() {
        let metrics = ComplexityAnalyzer::analyze("<p>Section 5 requires compliance.</p>");
        assert_eq!(metrics.cross_references, 1);
        // "compliance." is the only word longer than eight characters
        assert_eq!(metrics.technical_terms, 1);
        // 4 words, 1 sentence, 9 syllables: 0.39*4 + 11.8*2.25 - 15.59
        assert_relative_eq!(metrics.reading_level, 12.52, epsilon = 1e-9);
    }

    #[test]
    fn dense_text_clamps_to_upper_bound() {
        let sentence = "institutionalization ".repeat(60);
        let metrics = ComplexityAnalyzer::analyze(&sentence);
        assert_relative_eq!(metrics.reading_level, 20.0);
        assert_eq!(metrics.technical_terms, 60);
    }

    #[test]
    fn empty_text_is_bounded() {
        let metrics = ComplexityAnalyzer::analyze("");
        assert_relative_eq!(metrics.reading_level, 10.0);
        assert_eq!(metrics.technical_terms, 0);
        assert_eq!(metrics.cross_references, 0);
    }

    #[test]
    fn cross_references_are_case_insensitive() {
        let metrics =
            ComplexityAnalyzer::analyze("See PART 12 and title 40, not section five. Section 3.");
        assert_eq!(metrics.cross_references, 3);
    }

    #[test]
    fn composite_score_rounds_to_one_decimal() {
        let score = ComplexityAnalyzer::score("Department of Energy", 14.0, 2345.0, 1000.0);
        // (14 - 10) * 5 + 2.345 + 2 = 24.345
        assert_relative_eq!(score.complexity_score, 24.3);
        assert_eq!(score.technical_terms, 2345);
        assert_eq!(score.cross_references, 1000);
    }

    #[test]
    fn composite_score_grows_with_technical_terms() {
        let mut previous = ComplexityAnalyzer::composite_score(12.0, 0.0, 100.0);
        for terms in 1..500 {
            let next = ComplexityAnalyzer::composite_score(12.0, terms as f64, 100.0);
            assert!(next > previous);
            previous = next;
        }

        let low = ComplexityAnalyzer::score("A", 12.0, 1000.0, 100.0);
        let high = ComplexityAnalyzer::score("A", 12.0, 2000.0, 100.0);
        assert!(high.complexity_score > low.complexity_score);
    }
}
