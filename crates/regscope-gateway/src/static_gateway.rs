use crate::source::SourceGateway;
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use regscope_core::{Agency, DocumentNode, RegScopeError, Result, Title};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Calls served so far, per endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCalls {
    pub agencies: usize,
    pub titles: usize,
    pub structure: usize,
    pub raw_text: usize,
}

#[derive(Default)]
struct Tracker {
    calls: Mutex<GatewayCalls>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// In-memory gateway over fixed fixtures.
///
/// Titles without a fixture, and titles marked as failing, answer with
/// `UpstreamUnavailable`; titles marked malformed answer with `MalformedResponse`.
#[derive(Clone, Default)]
pub struct StaticGateway {
    agencies: Option<Vec<Agency>>,
    titles: Option<Vec<Title>>,
    structures: HashMap<u32, Arc<DocumentNode>>,
    raw_texts: HashMap<u32, Arc<str>>,
    failing: HashSet<u32>,
    malformed: HashSet<u32>,
    latency: Option<Duration>,
    tracker: Arc<Tracker>,
}

impl StaticGateway {
    /// Empty agency and title lists, no documents.
    pub fn new() -> Self {
        Self {
            agencies: Some(Vec::new()),
            titles: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn with_agencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agencies = Some(names.into_iter().map(Agency::new).collect());
        self
    }

    pub fn with_titles(mut self, titles: Vec<Title>) -> Self {
        self.titles = Some(titles);
        self
    }

    pub fn with_structure(mut self, title: u32, node: DocumentNode) -> Self {
        self.structures.insert(title, Arc::new(node));
        self
    }

    pub fn with_raw_text(mut self, title: u32, text: impl Into<String>) -> Self {
        self.raw_texts.insert(title, Arc::from(text.into()));
        self
    }

    /// Every document request for `title` fails as unavailable.
    pub fn failing_title(mut self, title: u32) -> Self {
        self.failing.insert(title);
        self
    }

    /// Every document request for `title` fails as unparseable.
    pub fn malformed_title(mut self, title: u32) -> Self {
        self.malformed.insert(title);
        self
    }

    pub fn unavailable_agencies(mut self) -> Self {
        self.agencies = None;
        self
    }

    pub fn unavailable_titles(mut self) -> Self {
        self.titles = None;
        self
    }

    /// Delay applied to every document request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> GatewayCalls {
        *self.tracker.calls.lock()
    }

    /// Highest number of document requests observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.tracker.max_in_flight.load(Ordering::SeqCst)
    }

    async fn document<T: Clone>(&self, title: u32, docs: &HashMap<u32, T>) -> Result<T> {
        let tracker = &self.tracker;
        let now = tracker.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        tracker.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let result = if self.failing.contains(&title) {
            Err(RegScopeError::from_status(&format!("title-{}", title), 503))
        } else if self.malformed.contains(&title) {
            Err(RegScopeError::MalformedResponse(format!(
                "title-{}: unexpected end of input",
                title
            )))
        } else {
            docs.get(&title)
                .cloned()
                .ok_or_else(|| RegScopeError::from_status(&format!("title-{}", title), 404))
        };

        tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl SourceGateway for StaticGateway {
    async fn list_agencies(&self) -> Result<Vec<Agency>> {
        self.tracker.calls.lock().agencies += 1;
        self.agencies
            .clone()
            .ok_or_else(|| RegScopeError::from_status("agencies", 500))
    }

    async fn list_titles(&self) -> Result<Vec<Title>> {
        self.tracker.calls.lock().titles += 1;
        self.titles
            .clone()
            .ok_or_else(|| RegScopeError::from_status("titles", 500))
    }

    async fn fetch_structure(&self, _date: NaiveDate, title: u32) -> Result<Arc<DocumentNode>> {
        self.tracker.calls.lock().structure += 1;
        self.document(title, &self.structures).await
    }

    async fn fetch_raw_text(&self, _date: NaiveDate, title: u32) -> Result<Arc<str>> {
        self.tracker.calls.lock().raw_text += 1;
        self.document(title, &self.raw_texts).await
    }

    fn gateway_name(&self) -> &str {
        "static"
    }
}
