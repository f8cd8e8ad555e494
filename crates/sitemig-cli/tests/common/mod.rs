#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a `sitemig` command pointed at `base_url`, isolated from the
/// caller's environment.
#[allow(dead_code)]
pub fn sitemig_cmd(base_url: &str) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sitemig"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("SITEMIG_CONFIG");
    cmd.env("SITEMIG_BASE_URL", base_url);
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Serve `body` at `at`.
#[allow(dead_code)]
pub async fn serve(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// A one-section legacy site with a single bilingual page.
#[allow(dead_code)]
pub async fn small_site() -> MockServer {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        r##"<div class="divprinc"><a href="#">Chi siamo</a>
            <div class="divsec"><a href="/home/storia.html">Storia</a></div></div>"##,
    )
    .await;
    serve(
        &server,
        "/home_eng/00000208_Home_Eng.html",
        r##"<div class="divprinc"><a href="#">About us</a>
            <div class="divsec"><a href="/home_eng/history.html">History</a></div></div>"##,
    )
    .await;
    serve(
        &server,
        "/home/storia.html",
        r#"<div class="bread">Home &raquo; Chi siamo &raquo; Storia</div>
           <a id="ling2" href="/home_eng/history.html">EN</a>
           <div class="titolo">Storia</div><div class="testo"><p>Testo</p></div>"#,
    )
    .await;
    serve(
        &server,
        "/home_eng/history.html",
        r#"<div class="bread">Home Eng &raquo; About us &raquo; History</div>
           <div class="titolo">History</div><div class="testo"><p>Text</p></div>"#,
    )
    .await;
    server
}
