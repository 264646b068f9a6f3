use async_trait::async_trait;
use chrono::NaiveDate;
use regscope_core::{Agency, DocumentNode, Result, Title};
use std::sync::Arc;

/// Read-only access to the upstream corpus service.
///
/// Implementations are pure I/O: they know nothing about agency metrics.
/// Failures surface as `UpstreamUnavailable` or `MalformedResponse`.
#[async_trait]
pub trait SourceGateway: Send + Sync {
    /// All agencies known upstream
    async fn list_agencies(&self) -> Result<Vec<Agency>>;

    /// All titles with their section counts and referencing agencies
    async fn list_titles(&self) -> Result<Vec<Title>>;

    /// Document structure tree of `title` as of `date`
    async fn fetch_structure(&self, date: NaiveDate, title: u32) -> Result<Arc<DocumentNode>>;

    /// Markup-bearing full text of `title` as of `date`
    async fn fetch_raw_text(&self, date: NaiveDate, title: u32) -> Result<Arc<str>>;

    /// Get the name of this gateway
    fn gateway_name(&self) -> &str;
}

#[async_trait]
impl<G: SourceGateway + ?Sized> SourceGateway for Arc<G> {
    async fn list_agencies(&self) -> Result<Vec<Agency>> {
        (**self).list_agencies().await
    }

    async fn list_titles(&self) -> Result<Vec<Title>> {
        (**self).list_titles().await
    }

    async fn fetch_structure(&self, date: NaiveDate, title: u32) -> Result<Arc<DocumentNode>> {
        (**self).fetch_structure(date, title).await
    }

    async fn fetch_raw_text(&self, date: NaiveDate, title: u32) -> Result<Arc<str>> {
        (**self).fetch_raw_text(date, title).await
    }

    fn gateway_name(&self) -> &str {
        (**self).gateway_name()
    }
}
