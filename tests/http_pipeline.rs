use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weighbridge::cache::CacheScope;
use weighbridge::domain::StrategyKind;
use weighbridge::extractor::{ExtractConfig, Extractor};
use weighbridge::fetcher::{
    FetchConfig, FetchFailure, Fetcher, HttpFetcher, Pacing, RetryPolicy, RetryingFetcher,
};
use weighbridge::pipeline::{EnrichmentPipeline, PipelineConfig};

const PRODUCT_PAGE: &str = r#"<html><body>
<table id="product-attributes">
  <tr><th>Brand</th><td>Acme</td></tr>
  <tr><th>Material</th><td>Steel</td></tr>
  <tr><th>Weight</th><td>1,25 kg</td></tr>
</table>
<table class="product-specs"><tr><td>Gross weight</td><td>1.9 kg</td></tr></table>
</body></html>"#;

fn fetch_config(server: &MockServer) -> FetchConfig {
    FetchConfig {
        url_template: format!("{}/p/{{id}}", server.uri()),
        user_agent: "weighbridge-test/1.0".into(),
        accept_language: "de-DE".into(),
        timeout_secs: 1,
        ..Default::default()
    }
}

fn pipeline(server: &MockServer, scope: CacheScope) -> EnrichmentPipeline {
    let http: Arc<dyn Fetcher + Send + Sync> =
        Arc::new(HttpFetcher::new(&fetch_config(server)).unwrap());
    let policy = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(10),
        multiplier: 2.0,
    };
    let fetcher = RetryingFetcher::new(http, policy, Pacing::none());
    let extractor = Extractor::new(&ExtractConfig::default()).unwrap();
    EnrichmentPipeline::new(
        fetcher,
        extractor,
        &PipelineConfig {
            workers: 5,
            cache_scope: scope,
        },
    )
}

#[tokio::test]
async fn test_sends_identification_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/A1"))
        .and(header("user-agent", "weighbridge-test/1.0"))
        .and(header("accept-language", "de-DE"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&fetch_config(&server)).unwrap();
    let page = fetcher.fetch_once("A1").await.unwrap();

    assert_eq!(page.status, 200);
    assert!(page.body.contains("product-attributes"));
}

#[tokio::test]
async fn test_non_success_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/NOPE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&fetch_config(&server)).unwrap();
    let failure = fetcher.fetch_once("NOPE").await.unwrap_err();
    assert_eq!(failure, FetchFailure::Status(404));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/SLOW"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PRODUCT_PAGE)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&fetch_config(&server)).unwrap();
    let failure = fetcher.fetch_once("SLOW").await.unwrap_err();
    assert_eq!(failure, FetchFailure::Timeout);
}

#[tokio::test]
async fn test_recovers_after_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/FLAKY"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/FLAKY"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let value = pipeline(&server, CacheScope::Shared)
        .resolve("FLAKY")
        .await
        .unwrap();

    // The targeted cell wins over the differing product-specs value
    assert_eq!(value.value, 1.25);
    assert_eq!(value.strategy, StrategyKind::TargetedLocation);
}

#[tokio::test]
async fn test_batch_order_and_single_fetch_per_identifier() {
    let server = MockServer::start().await;
    for (id, weight) in [("A", "0,4"), ("B", "12"), ("C", "3.75")] {
        let page = format!(
            r#"<div class="product-features"><ul><li>Weight {} kg</li></ul></div>"#,
            weight
        );
        Mock::given(method("GET"))
            .and(path(format!("/p/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/p/DEAD"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let pipeline = pipeline(&server, CacheScope::Shared);
    let input: Vec<String> = ["C", "DEAD", "A", "B", "A", "C"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let first = pipeline.enrich(&input).await;
    let second = pipeline.enrich(&input).await;

    let weights: Vec<Option<f64>> = first.iter().map(|v| v.map(|v| v.value)).collect();
    assert_eq!(
        weights,
        vec![Some(3.75), None, Some(0.4), Some(12.0), Some(0.4), Some(3.75)]
    );
    assert_eq!(first, second);
    // Mock expectations verify the per-identifier call counts on drop
}
