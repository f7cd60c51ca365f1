use catalog_harvest::config::{parse_config, Config};
use catalog_harvest::{FieldValue, HarvestError, Harvester};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn teams_config(server: &MockServer, assets_dir: &str) -> Config {
    parse_config(&format!(
        r#"
[source]
url = "{}/teams"
page-size = 30

[pipeline]
concurrency = 3

[listing]
item = ".table-teams tr"
name = ".link-team"

[listing.link]
selector = "img"
attr = "src"

[listing.asset]
selector = "img"
attr = "src"

[[listing.fields]]
name = "league"
text = ".link-league"

[[listing.fields]]
name = "stars"
score = [{{ selector = ".fas" }}, {{ selector = ".fa-star-half-alt", weight = -0.5 }}]

[assets]
dir = "{}"
path-prefix = "/img/logos"

[output]
data-path = "unused.json"
"#,
        server.uri(),
        assets_dir
    ))
    .expect("valid teams config")
}

fn team_row(logo: &str, name: &str, full_stars: usize, half: bool) -> String {
    let mut stars = "<i class=\"fas fa-star\"></i>".repeat(full_stars);
    if half {
        stars.push_str("<i class=\"fas fa-star-half-alt\"></i>");
    }
    format!(
        r#"<tr><td><img src="{}"></td><td><a class="link-team">{}</a></td><td><a class="link-league">Premier</a></td><td>{}</td></tr>"#,
        logo, name, stars
    )
}

async fn mount_teams(server: &MockServer, rows: &[String]) {
    Mock::given(method("GET"))
        .and(path("/teams"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<table class="table-teams"><tr><th>Team</th></tr>{}</table>"#,
            rows.concat()
        )))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_assets_downloaded_with_placeholder_fallback() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let assets_dir = dir.path().join("logos");

    let rows: Vec<String> = vec![
        team_row("/logos/lions.png", "Lions", 4, true),
        team_row("/logos/missing.png", "Ghosts", 2, false),
        team_row("/logos/bears.png", "Bears", 3, false),
    ];
    mount_teams(&server, &rows).await;

    Mock::given(method("GET"))
        .and(path("/logos/lions.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"lions-png".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logos/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logos/bears.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bears-png".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = teams_config(&server, assets_dir.to_str().unwrap());
    let records = Harvester::new(config).unwrap().run().await.unwrap();

    let ids: Vec<usize> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    assert_eq!(records[0].name, "Lions");
    assert_eq!(records[0].asset.as_deref(), Some("/img/logos/lions.png"));
    assert_eq!(records[0].fields["stars"], FieldValue::Number(4.5));
    assert_eq!(
        records[0].fields["league"],
        FieldValue::Text("Premier".to_string())
    );

    assert_eq!(records[1].asset.as_deref(), Some("/img/logos/not_found.png"));
    assert_eq!(records[2].asset.as_deref(), Some("/img/logos/bears.png"));

    // Identity links stay the source URLs
    assert_eq!(records[0].link(), format!("{}/logos/lions.png", server.uri()));

    assert_eq!(std::fs::read(assets_dir.join("lions.png")).unwrap(), b"lions-png");
    assert_eq!(std::fs::read(assets_dir.join("bears.png")).unwrap(), b"bears-png");
    assert!(!assets_dir.join("missing.png").exists());
}

#[tokio::test]
async fn test_asset_order_survives_reversed_completion() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let count: u64 = 6;

    let rows: Vec<String> = (0..count)
        .map(|i| team_row(&format!("/logos/team-{}.png", i), &format!("Team {}", i), 1, false))
        .collect();
    mount_teams(&server, &rows).await;

    // Earlier logos answer later, so downloads finish in reverse id order
    for i in 0..count {
        Mock::given(method("GET"))
            .and(path(format!("/logos/team-{}.png", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(format!("logo-{}", i).into_bytes())
                    .set_delay(Duration::from_millis((count - i) * 30)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = teams_config(&server, dir.path().to_str().unwrap());
    config.pipeline.concurrency = count as usize;
    let records = Harvester::new(config).unwrap().run().await.unwrap();

    let ids: Vec<usize> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=count as usize).collect::<Vec<_>>());
    for (index, record) in records.iter().enumerate() {
        assert_eq!(record.name, format!("Team {}", index));
        assert_eq!(
            record.asset.as_deref(),
            Some(format!("/img/logos/team-{}.png", index).as_str())
        );
    }
}

#[tokio::test]
async fn test_percent_encoded_logo_name_is_decoded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_teams(&server, &[team_row("/logos/real%20madrid.png", "Real Madrid", 5, false)]).await;
    Mock::given(method("GET"))
        .and(path("/logos/real%20madrid.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"rm".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = teams_config(&server, dir.path().to_str().unwrap());
    let records = Harvester::new(config).unwrap().run().await.unwrap();

    assert_eq!(records[0].asset.as_deref(), Some("/img/logos/real madrid.png"));
    assert_eq!(std::fs::read(dir.path().join("real madrid.png")).unwrap(), b"rm");
}

#[tokio::test]
async fn test_asset_failure_aborts_download() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let rows = vec![
        team_row("/logos/lions.png", "Lions", 1, false),
        team_row("/logos/broken.png", "Broken", 1, false),
    ];
    mount_teams(&server, &rows).await;

    Mock::given(method("GET"))
        .and(path("/logos/lions.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logos/broken.png"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let config = teams_config(&server, dir.path().to_str().unwrap());
    let err = Harvester::new(config).unwrap().run().await.unwrap_err();
    assert!(matches!(err, HarvestError::Protocol { status: 502, .. }));
}

#[tokio::test]
async fn test_rows_without_logo_are_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let rows = vec![
        r#"<tr><td></td><td><a class="link-team">No logo</a></td></tr>"#.to_string(),
        team_row("/logos/owls.png", "Owls", 5, false),
    ];
    mount_teams(&server, &rows).await;
    Mock::given(method("GET"))
        .and(path("/logos/owls.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"owls".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = teams_config(&server, dir.path().to_str().unwrap());
    let records = Harvester::new(config).unwrap().run().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 1);
    assert_eq!(records[0].name, "Owls");
    assert_eq!(records[0].fields["stars"], FieldValue::Number(5.0));
}
