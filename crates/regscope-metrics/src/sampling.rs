use chrono::NaiveDate;
use regscope_core::{DocumentNode, RegScopeError, Result, Title};
use regscope_gateway::SourceGateway;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A value computed for one agency, flagged when it came from the synthetic generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Measured<T> {
    pub value: T,
    pub synthetic: bool,
}

impl<T> Measured<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            synthetic: false,
        }
    }

    pub fn synthetic(value: T) -> Self {
        Self {
            value,
            synthetic: true,
        }
    }
}

/// Everything a per-agency stage needs to reach upstream.
///
/// Every document fetch holds a permit from `limiter`, so the number of
/// concurrent upstream calls never exceeds its capacity.
pub struct SampleContext<'a> {
    pub gateway: &'a dyn SourceGateway,
    pub limiter: &'a Semaphore,
    /// Point in time the documents are requested for
    pub date: NaiveDate,
}

impl<'a> SampleContext<'a> {
    pub fn new(gateway: &'a dyn SourceGateway, limiter: &'a Semaphore, date: NaiveDate) -> Self {
        Self {
            gateway,
            limiter,
            date,
        }
    }

    pub async fn fetch_structure(&self, title: u32) -> Result<Arc<DocumentNode>> {
        let _permit = self.limiter.acquire().await.map_err(limiter_closed)?;
        self.gateway.fetch_structure(self.date, title).await
    }

    pub async fn fetch_raw_text(&self, title: u32) -> Result<Arc<str>> {
        let _permit = self.limiter.acquire().await.map_err(limiter_closed)?;
        self.gateway.fetch_raw_text(self.date, title).await
    }
}

fn limiter_closed(err: tokio::sync::AcquireError) -> RegScopeError {
    RegScopeError::upstream(format!("request limiter closed: {}", err))
}

/// The first `cap` titles referencing `agency`, in title-list order.
pub fn select_titles<'t>(titles: &'t [Title], agency: &str, cap: usize) -> Vec<&'t Title> {
    titles
        .iter()
        .filter(|title| title.references(agency))
        .take(cap)
        .collect()
}
