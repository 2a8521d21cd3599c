//! HTTP page agent against a mock server

use review_harvester::agent::HttpPageAgent;
use review_harvester::config::CrawlerConfig;
use review_harvester::crawler::PageAgent;
use review_harvester::error::ErrorKind;
use review_harvester::sites::SiteId;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCT_PAGE: &str = r#"<html><body>
    <h2 class="prod-buy-header__title">Mock product</h2>
    <article class="js_reviewArticleContainer" data-review-id="1">first</article>
    <article class="js_reviewArticleContainer" data-review-id="2">second</article>
</body></html>"#;

/// Creates an agent whose captures go to a fresh temporary directory
fn create_test_agent(navigation_timeout_secs: u64) -> (HttpPageAgent, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = CrawlerConfig {
        navigation_timeout_secs,
        screenshot_dir: dir.path().display().to_string(),
        user_agent: "review-harvester-tests".to_string(),
        ..CrawlerConfig::default()
    };
    (HttpPageAgent::new(SiteId::Coupang, &config).unwrap(), dir)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_navigate_and_query_elements() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vp/products/1"))
        .respond_with(html(PRODUCT_PAGE))
        .mount(&mock_server)
        .await;

    let (agent, _dir) = create_test_agent(5);
    let url = format!("{}/vp/products/1", mock_server.uri());
    agent.navigate(&url).await.unwrap();

    assert_eq!(agent.current_url().await.as_deref(), Some(url.as_str()));

    let title = agent
        .wait_for_element(".prod-buy-header__title", Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(title.text, "Mock product");

    let articles = agent
        .wait_for_elements(".js_reviewArticleContainer", Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(articles.len(), 2);

    let missing = agent
        .wait_for_element(".js_reviewArticleContent", Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(missing.kind(), ErrorKind::ElementNotFound { .. }));

    let page = agent.render().await.unwrap();
    assert!(page.html.contains("Mock product"));
}

#[tokio::test]
async fn test_status_codes_are_classified() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let (agent, _dir) = create_test_agent(5);

    let err = agent
        .navigate(&format!("{}/missing", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::PageNotFound));

    let err = agent
        .navigate(&format!("{}/busy", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::RateLimit {
            retry_after: Some(d)
        } if *d == Duration::from_secs(7)
    ));

    let err = agent
        .navigate(&format!("{}/broken", mock_server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind().status_code(), Some(503));
    assert!(err.is_network());

    // failed navigations leave nothing rendered
    assert!(agent.render().await.is_err());
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(PRODUCT_PAGE).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let (agent, _dir) = create_test_agent(1);
    let err = agent
        .navigate(&format!("{}/slow", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Timeout));
}

#[tokio::test]
async fn test_advance_page_uses_review_page_parameter() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vp/products/1"))
        .and(query_param("reviewPage", "2"))
        .respond_with(html("<p class=\"page\">two</p>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vp/products/1"))
        .and(query_param("reviewPage", "3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vp/products/1"))
        .respond_with(html(PRODUCT_PAGE))
        .mount(&mock_server)
        .await;

    let (agent, _dir) = create_test_agent(5);
    agent
        .navigate(&format!("{}/vp/products/1", mock_server.uri()))
        .await
        .unwrap();

    assert!(agent.advance_page(2).await.unwrap());
    let page = agent.render().await.unwrap();
    assert!(page.html.contains("two"));
    assert!(page.url.contains("reviewPage=2"));

    // a missing page ends pagination without an error
    assert!(!agent.advance_page(3).await.unwrap());
    assert!(agent.render().await.unwrap().html.contains("two"));
}

#[tokio::test]
async fn test_screenshot_writes_current_document() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vp/products/1"))
        .respond_with(html(PRODUCT_PAGE))
        .mount(&mock_server)
        .await;

    let (agent, dir) = create_test_agent(5);
    agent
        .navigate(&format!("{}/vp/products/1", mock_server.uri()))
        .await
        .unwrap();
    agent.screenshot("overview_failed").await;

    let captures: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(captures.len(), 1);

    let name = captures[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("overview_failed_"));
    assert!(name.ends_with(".html"));
    assert!(std::fs::read_to_string(&captures[0])
        .unwrap()
        .contains("Mock product"));
}

#[tokio::test]
async fn test_closed_agent_rejects_work() {
    let (agent, _dir) = create_test_agent(5);
    agent.close().await.unwrap();

    let err = agent.render().await.unwrap_err();
    assert!(err.is_resource());
}
