use catalog_harvest::config::{parse_config, Config};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Listing page with one `.item` link per entry
pub fn listing_page(links: &[String]) -> String {
    let items: String = links
        .iter()
        .map(|link| format!(r#"<li><a class="item" href="{}">entry</a></li>"#, link))
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", items)
}

/// Detail page with a name and ingredient/tool links
pub fn detail_page(name: &str, ingredients: &[&str], tools: &[&str]) -> String {
    let links = |hrefs: &[&str]| -> String {
        hrefs
            .iter()
            .map(|href| format!(r#"<a href="{}">x</a>"#, href))
            .collect()
    };
    format!(
        r#"<html><body>
        <h1 class="common-name">{}</h1>
        <div class="previews">
          <div class="ingredients">{}</div>
          <div class="tools">{}</div>
        </div>
        </body></html>"#,
        name,
        links(ingredients),
        links(tools)
    )
}

/// Sub-resource page carrying only a name
pub fn item_page(name: &str) -> String {
    format!(r#"<html><body><h1 class="common-name">{}</h1></body></html>"#, name)
}

/// Mounts listing page `page` at `/list`
pub async fn mount_listing(server: &MockServer, page: usize, links: &[String]) {
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(links)))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts an HTML page at `route`, expecting exactly `hits` requests
pub async fn mount_page(server: &MockServer, route: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(hits)
        .mount(server)
        .await;
}

/// Listing-only configuration against `server`
pub fn listing_config(server: &MockServer, page_size: usize, data_path: &str) -> Config {
    parse_config(&format!(
        r#"
[source]
url = "{}/list"
page-size = {}

[pipeline]
concurrency = 4

[listing]
item = ".item"

[listing.link]
attr = "href"

[output]
data-path = "{}"
"#,
        server.uri(),
        page_size,
        data_path
    ))
    .expect("valid listing config")
}

/// Cocktail-style configuration with detail pages and sub-resources
pub fn catalog_config(
    server: &MockServer,
    page_size: usize,
    concurrency: usize,
    data_path: &str,
) -> Config {
    parse_config(&format!(
        r#"
[source]
url = "{}/list"
page-size = {}

[pipeline]
concurrency = {}

[listing]
item = ".item"

[listing.link]
attr = "href"

[detail]
name = ".common-name"

[[detail.references]]
name = "ingredients"
selector = ".previews .ingredients a"

[[detail.references]]
name = "tools"
selector = ".previews .tools a"

[sub-resource]
name = ".common-name"

[output]
data-path = "{}"
"#,
        server.uri(),
        page_size,
        concurrency,
        data_path
    ))
    .expect("valid catalog config")
}
