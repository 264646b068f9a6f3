use serde::{Deserialize, Serialize};

use crate::types::{AgencyWordCount, AggregateSummary, ComplexityScore, HistoricalDataPoint};

/// Ordering for complexity rankings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexitySort {
    /// Highest composite score first
    Score,
    /// Alphabetical by agency name
    Name,
}

/// Trailing window over the monthly series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1year")]
    OneYear,
    #[serde(rename = "5years")]
    FiveYears,
    #[serde(rename = "10years")]
    TenYears,
    #[serde(rename = "all")]
    All,
}

impl Timeframe {
    pub fn months(&self) -> Option<usize> {
        match self {
            Timeframe::OneYear => Some(12),
            Timeframe::FiveYears => Some(60),
            Timeframe::TenYears => Some(120),
            Timeframe::All => None,
        }
    }
}

impl AggregateSummary {
    /// Agencies whose name contains `search` (case-insensitive), largest word count first.
    pub fn top_word_counts(&self, search: &str, limit: usize) -> Vec<&AgencyWordCount> {
        let needle = search.to_lowercase();
        let mut matches: Vec<&AgencyWordCount> = self
            .agency_word_counts
            .iter()
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .collect();
        matches.sort_by(|a, b| b.word_count.cmp(&a.word_count));
        matches.truncate(limit);
        matches
    }

    pub fn ranked_complexity(&self, sort: ComplexitySort, limit: usize) -> Vec<&ComplexityScore> {
        let mut ranked: Vec<&ComplexityScore> = self.complexity_scores.iter().collect();
        match sort {
            ComplexitySort::Score => {
                ranked.sort_by(|a, b| b.complexity_score.total_cmp(&a.complexity_score))
            }
            ComplexitySort::Name => ranked.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        ranked.truncate(limit);
        ranked
    }

    /// The most recent points covered by `timeframe`, oldest first.
    pub fn history_window(&self, timeframe: Timeframe) -> &[HistoricalDataPoint] {
        let len = self.historical_changes.len();
        let take = timeframe.months().map_or(len, |m| m.min(len));
        &self.historical_changes[len - take..]
    }
}
