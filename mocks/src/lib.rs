use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::json;

/// Start an empty mock server standing in for the device's gallery backend.
pub fn gallery_server() -> Server {
    Server::run()
}

/// Base address of a mock server, suitable for `ApiClient::new`.
pub fn base_url(server: &Server) -> String {
    format!("http://{}", server.addr())
}

/// Id-addressed record as sent by current backends.
pub fn item_record(id: u64, kind: &str, taken_at: i64, game: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": kind,
        "takenAt": taken_at,
        "game": game,
        "storedAt": "sd",
        "fileSize": 1536
    })
}

/// Path-addressed record as sent by legacy backends.
pub fn legacy_record(path: &str, taken_at: i64) -> serde_json::Value {
    json!({
        "path": path,
        "takenAt": taken_at.to_string(),
        "game": "Super Mario Odyssey",
        "storedAt": "nand"
    })
}

/// A `/gallery` envelope holding `items`.
pub fn gallery_body(items: Vec<serde_json::Value>, pages: u32, theme: &str) -> serde_json::Value {
    json!({
        "gallery": items,
        "pages": pages,
        "theme": theme,
        "stats": {
            "numScreenshots": 40,
            "numVideos": 2,
            "indexTime": 1.25
        }
    })
}

/// Answer every `GET /gallery?page={page}` with `body`.
pub fn expect_gallery_page(server: &Server, page: u32, body: serde_json::Value) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/gallery"),
            request::query(url_decoded(contains((eq("page".to_string()), eq(page.to_string()))))),
        ])
        .times(..)
        .respond_with(json_encoded(body)),
    );
}

/// Answer every `GET /gallery?page={page}` with an error status.
pub fn expect_gallery_failure(server: &Server, page: u32, status: u16) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/gallery"),
            request::query(url_decoded(contains((eq("page".to_string()), eq(page.to_string()))))),
        ])
        .times(..)
        .respond_with(status_code(status).body("Invalid content ID")),
    );
}

/// Serve `bytes` for `GET /file?id={id}` exactly once.
pub fn expect_file(server: &Server, id: u64, content_type: &str, bytes: &'static [u8]) {
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/file"),
            request::query(url_decoded(contains((eq("id".to_string()), eq(id.to_string()))))),
        ])
        .respond_with(
            status_code(200)
                .insert_header("Content-Type", content_type.to_string())
                .body(bytes),
        ),
    );
}
