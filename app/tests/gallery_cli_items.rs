use assert_cmd::prelude::*;
use mocks::{base_url, expect_file, expect_gallery_page, gallery_body, gallery_server, item_record};
use predicates::str::contains;
use std::process::Command;
use tempfile::TempDir;

fn build_cmd(home: &std::path::Path, base: &str) -> Command {
    let mut cmd = Command::cargo_bin("gallery_cli").unwrap();
    cmd.env("HOME", home);
    cmd.args(["--base-url", base, "--log-level", "warn", "--date-style", "iso"]);
    cmd
}

fn serve_first_page(server: &httptest::Server) {
    let mut hinted = item_record(3, "video", 1672574400, "Splatoon 3");
    hinted["fileName"] = serde_json::json!("2023010112000000-CAFE.mp4");
    expect_gallery_page(
        server,
        1,
        gallery_body(
            vec![item_record(2, "screenshot", 1672574400, "Super Mario Odyssey"), hinted],
            1,
            "light",
        ),
    );
}

#[test]
fn show_prints_details() {
    let server = gallery_server();
    serve_first_page(&server);
    let home = TempDir::new().unwrap();
    let base = base_url(&server);

    build_cmd(home.path(), &base)
        .args(["show", "2"])
        .assert()
        .success()
        .stdout(contains("Screenshot"))
        .stdout(contains("SD Card"))
        .stdout(contains(format!("{}/thumbnail?id=2", base)))
        .stdout(contains(format!("{}/file?id=2", base)))
        .stdout(contains("Super_Mario_Odyssey_2023-01-01120000.jpg"));
}

#[test]
fn show_json_output() {
    let server = gallery_server();
    serve_first_page(&server);
    let home = TempDir::new().unwrap();

    build_cmd(home.path(), &base_url(&server))
        .args(["show", "3", "--json"])
        .assert()
        .success()
        .stdout(contains("\"element\": \"video\""))
        .stdout(contains("\"download_filename\": \"2023010112000000-CAFE.mp4\""));
}

#[test]
fn show_unknown_item() {
    let server = gallery_server();
    serve_first_page(&server);
    let home = TempDir::new().unwrap();

    build_cmd(home.path(), &base_url(&server))
        .args(["show", "99"])
        .assert()
        .success()
        .stdout(contains("Item not found: 99"));
}

#[test]
fn download_writes_derived_filename() {
    let server = gallery_server();
    serve_first_page(&server);
    expect_file(&server, 2, "image/jpeg", b"JPEGDATA");
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    build_cmd(home.path(), &base_url(&server))
        .args(["download", "2", "--out"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(contains("Downloaded Super_Mario_Odyssey_2023-01-01120000.jpg (8 B)"));

    let written = std::fs::read(out.path().join("Super_Mario_Odyssey_2023-01-01120000.jpg")).unwrap();
    assert_eq!(written, b"JPEGDATA");
}

#[test]
fn download_uses_server_filename_hint() {
    let server = gallery_server();
    serve_first_page(&server);
    expect_file(&server, 3, "video/mp4", b"MP4");
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    build_cmd(home.path(), &base_url(&server))
        .args(["download", "3", "--out"])
        .arg(out.path())
        .assert()
        .success();

    assert!(out.path().join("2023010112000000-CAFE.mp4").exists());
}
