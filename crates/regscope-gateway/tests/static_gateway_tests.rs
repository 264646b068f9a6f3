use chrono::NaiveDate;
use regscope_core::{DocumentNode, RegScopeError, Title};
use regscope_gateway::{GatewayCalls, SourceGateway, StaticGateway};
use std::sync::Arc;
use std::time::Duration;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

#[tokio::test]
async fn test_fixtures_are_served() {
    let gateway = StaticGateway::new()
        .with_agencies(["Department of Energy"])
        .with_titles(vec![Title::new(10).with_agency("Department of Energy")])
        .with_structure(10, DocumentNode::leaf("energy conservation"))
        .with_raw_text(10, "<p>Part 430</p>");

    let agencies = gateway.list_agencies().await.unwrap();
    assert_eq!(agencies[0].name, "Department of Energy");

    let node = gateway.fetch_structure(today(), 10).await.unwrap();
    assert_eq!(node.text.as_deref(), Some("energy conservation"));

    let text = gateway.fetch_raw_text(today(), 10).await.unwrap();
    assert_eq!(&*text, "<p>Part 430</p>");

    assert_eq!(
        gateway.calls(),
        GatewayCalls {
            agencies: 1,
            titles: 0,
            structure: 1,
            raw_text: 1,
        }
    );
}

#[tokio::test]
async fn test_failures_are_typed() {
    let gateway = StaticGateway::new()
        .failing_title(1)
        .malformed_title(2)
        .unavailable_titles();

    assert!(matches!(
        gateway.fetch_structure(today(), 1).await,
        Err(RegScopeError::UpstreamUnavailable { .. })
    ));
    assert!(matches!(
        gateway.fetch_raw_text(today(), 2).await,
        Err(RegScopeError::MalformedResponse(_))
    ));
    // Missing fixture behaves like a 404
    let missing = gateway.fetch_structure(today(), 3).await.unwrap_err();
    assert!(!missing.is_retryable());
    assert!(gateway.list_titles().await.is_err());
}

#[tokio::test]
async fn test_shared_behind_arc_dyn() {
    let gateway: Arc<dyn SourceGateway> =
        Arc::new(StaticGateway::new().with_agencies(["Federal Reserve System"]));
    assert_eq!(gateway.gateway_name(), "static");
    assert_eq!(gateway.list_agencies().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_in_flight_tracking() {
    let gateway = StaticGateway::new()
        .with_structure(1, DocumentNode::leaf("a"))
        .with_latency(Duration::from_millis(20));

    let calls = (0..3).map(|_| gateway.fetch_structure(today(), 1));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(gateway.max_in_flight(), 3);
}
