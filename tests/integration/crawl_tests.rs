//! Integration tests for the harvester
//!
//! These tests use wiremock to stand up a mock forum and run the full
//! listing -> extract -> save -> ledger cycle end-to-end.

use forum_harvest::archive::Archiver;
use forum_harvest::config::{load_config, Config};
use forum_harvest::crawler::run_harvest;
use forum_harvest::output::section_content_dir;
use forum_harvest::Ledger;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a configuration pointing at the mock server and loads it back
fn create_test_config(root: &Path, base_url: &str, extra_crawler: &str) -> Config {
    let toml = format!(
        r#"
[site]
base-url = "{base_url}"
user-agent = "TestHarvester/1.0"

[crawler]
request-delay-ms = 0
max-retries = 0
timeout-secs = 5
download-workers = 2
{extra_crawler}

[output]
media-dir = "{root}/pic"
text-dir = "{root}/literature"
archive-dir = "{root}/zips"
media-ledger = "{root}/logs/pic_crawled.log"
text-ledger = "{root}/logs/literature_crawled.log"

[[section]]
key = "pics"
name = "Pictures"
kind = "media"
url-template = "{{base}}/list?fid=7&page={{page}}"

[[section]]
key = "lit"
name = "Stories"
kind = "text"
url-template = "{{base}}/list?fid=20&page={{page}}"
"#,
        root = root.display()
    );

    let config_path = root.join("harvest.toml");
    std::fs::write(&config_path, toml).expect("Failed to write config");
    load_config(&config_path).expect("Failed to load config")
}

async fn mount_listing(server: &MockServer, fid: &str, page: &str, links: &[&str]) {
    let body: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">post</a>"#, l))
        .collect();

    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("fid", fid))
        .and(query_param("page", page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("<html><body>{}</body></html>", body))
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_media_section_end_to_end() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &base_url, "");

    mount_listing(
        &server,
        "7",
        "1",
        &["htm_data/7/1.html", "htm_data/7/2.html", "htm_data/7/1.html"],
    )
    .await;

    // Gallery with two images
    Mock::given(method("GET"))
        .and(path("/htm_data/7/1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><head><title>Harbor Lights | Forum</title></head><body>
            <img ess-data="{base}/img/one.jpg">
            <img ess-data="{base}/img/two.png">
            </body></html>"#,
            base = base_url
        )))
        .expect(1)
        .mount(&server)
        .await;

    // Post without any media
    Mock::given(method("GET"))
        .and(path("/htm_data/7/2.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>Just words</title></head><body>No pictures</body></html>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/one.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 64]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/two.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![2u8; 32]))
        .mount(&server)
        .await;

    let report = run_harvest(&config, "pics", 1..=1)
        .await
        .expect("Harvest failed");

    assert_eq!(report.posts_listed, 2, "duplicate links collapse");
    assert_eq!(report.success_count(), 1);
    assert_eq!(report.posts_empty, 1);

    let gallery = dir.path().join("pic/Pictures/Harbor Lights");
    assert_eq!(std::fs::read(gallery.join("Harbor Lights1.jpg")).unwrap().len(), 64);
    assert_eq!(std::fs::read(gallery.join("Harbor Lights2.png")).unwrap().len(), 32);

    // Both attempted posts are ledgered, including the empty one
    let seen = Ledger::new(dir.path().join("logs/pic_crawled.log")).load();
    assert_eq!(seen.len(), 2);
    assert!(seen.contains("htm_data/7/1.html"));
    assert!(seen.contains("htm_data/7/2.html"));

    // A second run skips everything; the `expect(1)` mocks verify no refetch
    let rerun = run_harvest(&config, "pics", 1..=1)
        .await
        .expect("Second harvest failed");
    assert_eq!(rerun.posts_skipped, 2);
    assert_eq!(rerun.posts_attempted, 0);

    // The section directory packages into a single archive
    let section = config.section("pics").unwrap();
    let output = dir.path().join("zips/pictures/pics.zip");
    let archive = Archiver::from_config(&config.archive)
        .zip_directory(&section_content_dir(&config, section), &output)
        .expect("Packaging failed");

    assert_eq!(archive.file_count, 2);
    assert_eq!(archive.total_bytes, 96);
    assert!(output.exists());
}

#[tokio::test]
async fn test_text_section_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri(), "max-posts-per-page = 1");

    mount_listing(&server, "20", "1", &["htm_data/20/10.html", "htm_data/20/11.html"]).await;
    mount_listing(&server, "20", "2", &[]).await;

    Mock::given(method("GET"))
        .and(path("/htm_data/20/10.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head>
            <title>【Complete】Winter Letters | Forum</title>
            <meta name="author" content="Quill">
            </head><body>
            <div id="read_body"><p>Dear friend,</p><p>The snow came early.</p></div>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    // Beyond the per-page cap, never requested
    Mock::given(method("GET"))
        .and(path("/htm_data/20/11.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_harvest(&config, "lit", 1..=2)
        .await
        .expect("Harvest failed");

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.success_count(), 1);

    let saved = std::fs::read_to_string(dir.path().join("literature/Stories/Winter Letters.txt"))
        .expect("Text not saved");
    assert_eq!(
        saved,
        "Title: Winter Letters\nAuthor: Quill\n\nDear friend,\n\nThe snow came early.\n"
    );

    let ledger = std::fs::read_to_string(dir.path().join("logs/literature_crawled.log")).unwrap();
    assert_eq!(ledger, "htm_data/20/10.html\n");
}

#[tokio::test]
async fn test_unreachable_posts_are_absorbed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri(), "");

    mount_listing(&server, "7", "1", &["htm_data/7/gone.html"]).await;

    Mock::given(method("GET"))
        .and(path("/htm_data/7/gone.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    // Page 2 has no listing mock and answers 404 as well
    let report = run_harvest(&config, "pics", 1..=2)
        .await
        .expect("Harvest should absorb per-post failures");

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.success_count(), 0);
    assert_eq!(report.posts_empty, 1);

    let seen = Ledger::new(dir.path().join("logs/pic_crawled.log")).load();
    assert!(seen.contains("htm_data/7/gone.html"));
}

#[tokio::test]
async fn test_unknown_section_is_an_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path(), &server.uri(), "");

    assert!(run_harvest(&config, "nope", 1..=1).await.is_err());
}
