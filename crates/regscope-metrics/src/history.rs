use regscope_core::{CalendarEvent, DateRange, HistoricalDataPoint, HistoryConfig, Title, YearMonth};

/// Labels of every calendar event falling in `month`, in calendar order.
pub fn events_for(calendar: &[CalendarEvent], month: YearMonth) -> Vec<String> {
    calendar
        .iter()
        .filter(|event| event.year == month.year() && event.month == month.month())
        .map(|event| event.label.clone())
        .collect()
}

/// Monthly regulation/word series estimated from live title metadata.
///
/// Upstream exposes no historical counts, so each month is the current
/// section total scaled by compounding growth and a bounded perturbation.
pub struct HistoricalSeriesBuilder {
    config: HistoryConfig,
}

impl HistoricalSeriesBuilder {
    pub fn new(config: HistoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// One point per calendar month of `range`, both ends inclusive.
    pub fn build(
        &self,
        titles: &[Title],
        range: &DateRange,
        rng: &mut fastrand::Rng,
    ) -> Vec<HistoricalDataPoint> {
        let baseline: u64 = titles
            .iter()
            .map(|t| t.sections.unwrap_or(self.config.default_sections))
            .fold(0u64, u64::saturating_add);
        let growth = 1.0 + self.config.monthly_growth;
        let jitter = self.config.jitter;

        range
            .months()
            .enumerate()
            .map(|(elapsed, month)| {
                let perturbation = 1.0 - jitter + rng.f64() * 2.0 * jitter;
                let scaled = baseline as f64 * growth.powi(elapsed as i32) * perturbation;
                let regulation_count = scaled.floor().max(0.0) as u64;

                HistoricalDataPoint {
                    date: month,
                    regulation_count,
                    word_count: regulation_count.saturating_mul(self.config.words_per_regulation),
                    events: events_for(&self.config.events, month),
                }
            })
            .collect()
    }
}
