pub mod complexity;
pub mod history;
pub mod orchestrator;
pub mod sampling;
pub mod synthetic;
pub mod word_count;

pub use complexity::{ComplexityAggregator, ComplexityAnalyzer, TextMetrics};
pub use history::HistoricalSeriesBuilder;
pub use orchestrator::AggregateOrchestrator;
pub use sampling::{select_titles, Measured, SampleContext};
pub use synthetic::{SyntheticGenerator, SYNTHETIC_ROSTER};
pub use word_count::{count_words, WordCountAggregator, WordTally};
