use crate::common::{listing_config, mount_listing};
use catalog_harvest::config::FirstPageNotFound;
use catalog_harvest::{HarvestError, Harvester};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn links(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("/c/{}", i)).collect()
}

#[tokio::test]
async fn test_crawl_stops_after_short_page() {
    let server = MockServer::start().await;
    let page_size = 3;

    mount_listing(&server, 1, &links(0..3)).await;
    mount_listing(&server, 2, &links(3..6)).await;
    mount_listing(&server, 3, &links(6..9)).await;
    mount_listing(&server, 4, &links(9..10)).await;

    // Page 5 must never be requested
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = listing_config(&server, page_size, "unused.json");
    let records = Harvester::new(config).unwrap().run().await.unwrap();

    assert_eq!(records.len(), 3 * page_size + 1);
    for (index, record) in records.iter().enumerate() {
        assert_eq!(record.id, index + 1);
        assert_eq!(record.link(), format!("{}/c/{}", server.uri(), index));
    }
}

#[tokio::test]
async fn test_crawl_stops_on_not_found() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, &links(0..2)).await;
    mount_listing(&server, 2, &links(2..4)).await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = listing_config(&server, 2, "unused.json");
    let records = Harvester::new(config).unwrap().run().await.unwrap();
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn test_first_page_not_found_is_empty_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = listing_config(&server, 20, "unused.json");
    let records = Harvester::new(config).unwrap().run().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_first_page_not_found_fatal_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = listing_config(&server, 20, "unused.json");
    config.source.first_page_not_found = FirstPageNotFound::Fatal;

    let err = Harvester::new(config).unwrap().run().await.unwrap_err();
    assert!(matches!(err, HarvestError::EmptySource { .. }));
}

#[tokio::test]
async fn test_listing_failure_aborts_crawl() {
    let server = MockServer::start().await;

    mount_listing(&server, 1, &links(0..2)).await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let config = listing_config(&server, 2, "unused.json");
    let err = Harvester::new(config).unwrap().run().await.unwrap_err();
    assert!(matches!(err, HarvestError::Protocol { status: 500, .. }));
}

#[tokio::test]
async fn test_existing_query_parameters_are_kept() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("sort", "name"))
        .and(query_param("random_page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(crate::common::listing_page(&links(0..1))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = listing_config(&server, 20, "unused.json");
    config.source.url = format!("{}/list?sort=name", server.uri());
    config.source.page_param = "random_page".to_string();

    let records = Harvester::new(config).unwrap().run().await.unwrap();
    assert_eq!(records.len(), 1);
}
