//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use reel_harvest::config::{
    Config, CrawlerConfig, LabelConfig, OutputConfig, SelectorConfig, UserAgentConfig,
};
use reel_harvest::crawler::{
    build_http_client, crawl, fetch_with_retry, FetchError, HttpFetcher, PoolReport, RetryPolicy,
};
use reel_harvest::storage::{RunStatus, SqliteStorage, Storage};
use std::path::Path;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at a mock catalogue
fn create_test_config(base_url: &str, db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            category: "phim-le".to_string(),
            total_pages: 1,
            workers: 2,
            page_size: 30,
            fetch_retries: 1,
            resolve_attempts: 2,
            resolve_backoff_ms: 1, // Very short for testing
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.display().to_string(),
        },
        selectors: SelectorConfig::default(),
        labels: LabelConfig::default(),
    }
}

/// Listing page with 30 items; item 5 carries no detail link
fn listing_page() -> String {
    let mut body = String::from(r#"<html><body><ul class="list-movie">"#);
    for i in 1..=30 {
        if i == 5 {
            body.push_str(r#"<li class="movie-item"><span class="block-wrapper">sắp chiếu</span></li>"#);
        } else {
            body.push_str(&format!(
                r#"<li class="movie-item"><a class="block-wrapper" href="phim/item-{}/">Item {}</a></li>"#,
                i, i
            ));
        }
    }
    body.push_str("</ul></body></html>");
    body
}

const DETAIL_PAGE: &str = r#"<html><body>
    <a class="title-1">Ký Sinh Trùng</a>
    <span class="title-2">Parasite (2019)</span>
    <div class="movie-meta-info">
      <dl class="movie-dl">
        <dt class="movie-dt">Năm:</dt><dd class="movie-dd">2019</dd>
        <dt class="movie-dt">Quốc gia:</dt>
        <dd class="movie-dd dd-country"><a class="country" href="quoc-gia/han-quoc/">Hàn Quốc</a></dd>
        <dt class="movie-dt">Lượt xem:</dt><dd class="movie-dd">1,234</dd>
      </dl>
    </div>
    <div id="list_actor_carousel">
      <a class="actor-profile-item" href="dien-vien/song-kang-ho/">
        <div class="actor-image" style="background-image:url('http://img.test/skh.jpg')"></div>
        <span>Song Kang Ho</span>
      </a>
    </div>
</body></html>"#;

async fn mount_catalogue(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/phim-le/page-1.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/phim/item-\d+/$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(DETAIL_PAGE)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_fetch_retries_exactly_max_retries_plus_one() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), &dir.path().join("unused.db"));
    let client = build_http_client(&config.user_agent, &config.crawler).unwrap();
    let fetcher = HttpFetcher::new(client);

    let url = format!("{}/down", mock_server.uri());
    let result = fetch_with_retry(&fetcher, &url, RetryPolicy::new(2)).await;

    match result {
        Err(FetchError::Exhausted { attempts, last, .. }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, FetchError::Status { .. }));
        }
        other => panic!("Expected exhausted retries, got {:?}", other.map(|d| d.url().to_string())),
    }
    // expect(3) is verified when the mock server drops
}

#[tokio::test]
async fn test_fetcher_sends_configured_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hello"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>hi</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = create_test_config(&mock_server.uri(), &dir.path().join("unused.db"));
    let fetcher = HttpFetcher::new(build_http_client(&config.user_agent, &config.crawler).unwrap());

    let url = format!("{}/hello", mock_server.uri());
    let document = fetch_with_retry(&fetcher, &url, RetryPolicy::default())
        .await
        .expect("Fetch should succeed");

    assert_eq!(document.url(), url);
    assert_eq!(document.body(), "<p>hi</p>");
}

#[tokio::test]
async fn test_full_crawl_single_page() {
    let mock_server = MockServer::start().await;
    mount_catalogue(&mock_server).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("harvest.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    let report = crawl(config, 1, 2, "hash-1")
        .await
        .expect("Crawl should finish");
    assert_eq!(
        report,
        PoolReport {
            completed: 29,
            failed: 1
        }
    );

    let storage = SqliteStorage::new(&db_path).expect("Failed to open database");
    assert_eq!(storage.count_records().unwrap(), 29);
    assert_eq!(storage.count_people().unwrap(), 1);
    assert_eq!(storage.count_countries().unwrap(), 1);

    let url = format!("{}/phim/item-1/", mock_server.uri());
    let stored = storage
        .get_record_by_url(&url)
        .unwrap()
        .expect("Item 1 should be stored");
    assert_eq!(stored.record.title, "Ký Sinh Trùng");
    assert_eq!(stored.record.year, 2019);
    assert_eq!(stored.record.views, 1234.0);
    assert_eq!(stored.record.countries[0].code, "han-quoc");
    assert_eq!(
        stored.record.actors[0].image.as_deref(),
        Some("http://img.test/skh.jpg")
    );

    let missing = format!("{}/phim/item-5/", mock_server.uri());
    assert!(storage.get_record_by_url(&missing).unwrap().is_none());

    let run = storage.get_latest_run().unwrap().expect("Run recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "hash-1");
    assert_eq!(run.tasks_completed, 29);
    assert_eq!(run.tasks_failed, 1);
}

#[tokio::test]
async fn test_recrawl_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_catalogue(&mock_server).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("harvest.db");

    crawl(create_test_config(&mock_server.uri(), &db_path), 1, 3, "hash")
        .await
        .expect("First crawl should finish");
    let second = crawl(create_test_config(&mock_server.uri(), &db_path), 1, 3, "hash")
        .await
        .expect("Second crawl should finish");

    // Already-stored records still count as completed tasks
    assert_eq!(second.completed, 29);

    let storage = SqliteStorage::new(&db_path).expect("Failed to open database");
    assert_eq!(storage.count_records().unwrap(), 29);
    assert_eq!(storage.count_people().unwrap(), 1);
    assert_eq!(storage.count_runs().unwrap(), 2);
}

#[tokio::test]
async fn test_unavailable_listing_fails_every_task() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/phim-le/page-1.html"))
        .respond_with(ResponseTemplate::new(500))
        // 2 listing attempts x 2 GETs each, shared by all 30 tasks
        .expect(4)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("harvest.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    let report = crawl(config, 1, 4, "hash")
        .await
        .expect("Crawl should finish even when every task fails");
    assert_eq!(
        report,
        PoolReport {
            completed: 0,
            failed: 30
        }
    );

    let storage = SqliteStorage::new(&db_path).expect("Failed to open database");
    assert_eq!(storage.count_records().unwrap(), 0);
    let run = storage.get_latest_run().unwrap().expect("Run recorded");
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_failing_detail_page_is_skipped() {
    let mock_server = MockServer::start().await;

    // Item 2 always errors; mounted first so it wins over the catch-all detail mock
    Mock::given(method("GET"))
        .and(path("/phim/item-2/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_catalogue(&mock_server).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("harvest.db");
    let config = create_test_config(&mock_server.uri(), &db_path);

    let report = crawl(config, 1, 4, "hash").await.expect("Crawl should finish");
    assert_eq!(
        report,
        PoolReport {
            completed: 28,
            failed: 2
        }
    );

    let storage = SqliteStorage::new(&db_path).expect("Failed to open database");
    assert_eq!(storage.count_records().unwrap(), 28);
}
