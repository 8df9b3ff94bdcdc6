//! Preview protocol against an in-process preview server.
//!
//! The server mimics the CMS preview view: a POST stores the submitted form
//! state, a GET renders the last stored state.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use warp::Filter;
use wy_core::{FormSnapshot, PanelError, PreviewControl, PreviewSource, ProtocolStep, StaticPage};
use wy_preview::{FetcherSettings, PreviewFetcher};

#[derive(Debug, Default)]
struct Recorded {
    /// (method, path) in arrival order
    requests: Vec<(String, String)>,
    fields: HashMap<String, String>,
    csrf: Option<String>,
    cookie: Option<String>,
}

async fn spawn_preview_server() -> (SocketAddr, Arc<Mutex<Recorded>>) {
    let recorded = Arc::new(Mutex::new(Recorded::default()));

    let on_post = Arc::clone(&recorded);
    let submit = warp::post()
        .and(warp::path::full())
        .and(warp::header::optional::<String>("x-csrftoken"))
        .and(warp::header::optional::<String>("cookie"))
        .and(warp::body::form::<HashMap<String, String>>())
        .map(move |path: warp::path::FullPath, csrf, cookie, fields| {
            let mut rec = on_post.lock();
            rec.requests.push(("POST".to_string(), path.as_str().to_string()));
            rec.fields = fields;
            rec.csrf = csrf;
            rec.cookie = cookie;
            warp::reply::json(&serde_json::json!({ "is_valid": true }))
        });

    let on_get = Arc::clone(&recorded);
    let retrieve = warp::get()
        .and(warp::path::full())
        .map(move |path: warp::path::FullPath| {
            let mut rec = on_get.lock();
            rec.requests.push(("GET".to_string(), path.as_str().to_string()));
            let title = rec.fields.get("title").cloned().unwrap_or_default();
            warp::reply::html(format!("<html><body><h1>{title}</h1></body></html>"))
        });

    let (addr, server) = warp::serve(submit.or(retrieve)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, recorded)
}

/// Preview server that accepts submissions but never answers retrieval
async fn spawn_stalling_server() -> (SocketAddr, Arc<Mutex<Recorded>>) {
    let recorded = Arc::new(Mutex::new(Recorded::default()));

    let on_post = Arc::clone(&recorded);
    let submit = warp::post()
        .and(warp::path::full())
        .map(move |path: warp::path::FullPath| {
            on_post
                .lock()
                .requests
                .push(("POST".to_string(), path.as_str().to_string()));
            warp::reply::json(&serde_json::json!({ "is_valid": true }))
        });

    let on_get = Arc::clone(&recorded);
    let retrieve = warp::get()
        .and(warp::path::full())
        .and_then(move |path: warp::path::FullPath| {
            on_get
                .lock()
                .requests
                .push(("GET".to_string(), path.as_str().to_string()));
            async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, warp::Rejection>(warp::reply::html(String::new()))
            }
        });

    let (addr, server) = warp::serve(submit.or(retrieve)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, recorded)
}

fn edit_page(addr: SocketAddr) -> StaticPage {
    let origin = Url::parse(&format!("http://{addr}")).unwrap();
    StaticPage::new(origin, "/admin/pages/3/edit/")
        .with_cookies("sessionid=s3cr3t; csrftoken=tok%3D1")
        .with_form(
            FormSnapshot::new("page-edit-form")
                .with_field("title", "Hello world")
                .with_field("slug", "hello-world"),
        )
}

#[tokio::test]
async fn submits_then_retrieves_rendered_preview() {
    let (addr, recorded) = spawn_preview_server().await;
    let page = edit_page(addr);
    let fetcher = PreviewFetcher::new(FetcherSettings::default()).unwrap();

    let html = fetcher.fetch(&page).await.unwrap();

    assert_eq!(html, "<html><body><h1>Hello world</h1></body></html>");
    let rec = recorded.lock();
    assert_eq!(
        rec.requests,
        vec![
            ("POST".to_string(), "/admin/pages/3/preview/".to_string()),
            ("GET".to_string(), "/admin/pages/3/preview/".to_string()),
        ]
    );
    assert_eq!(rec.fields.get("slug").map(String::as_str), Some("hello-world"));
    assert_eq!(rec.csrf.as_deref(), Some("tok=1"));
    assert!(rec.cookie.as_deref().unwrap_or_default().contains("sessionid=s3cr3t"));
}

#[tokio::test]
async fn retrieval_reflects_latest_form_state() {
    let (addr, _recorded) = spawn_preview_server().await;
    let page = edit_page(addr);
    let fetcher = PreviewFetcher::new(FetcherSettings::default()).unwrap();

    assert!(fetcher.fetch(&page).await.unwrap().contains("Hello world"));

    page.set_value("id_title", "Second draft");
    assert!(fetcher.fetch(&page).await.unwrap().contains("Second draft"));
}

#[tokio::test]
async fn declared_endpoint_is_used_over_inferred_one() {
    let (addr, recorded) = spawn_preview_server().await;
    let origin = Url::parse(&format!("http://{addr}")).unwrap();
    let page = StaticPage::new(origin, "/admin/pages/3/edit/")
        .with_form(
            FormSnapshot::new("page-edit-form")
                .with_attribute("data-preview-url", "/cms/preview/3/")
                .with_field("title", "Declared"),
        )
        .with_control(PreviewControl::Link {
            href: Some("/link/preview/".to_string()),
        });
    let fetcher = PreviewFetcher::new(FetcherSettings::default()).unwrap();

    fetcher.fetch(&page).await.unwrap();

    let rec = recorded.lock();
    assert!(rec.requests.iter().all(|(_, path)| path == "/cms/preview/3/"));
    assert_eq!(rec.csrf, None);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_submit_failure() {
    // Port 1 is never served in the test environment
    let page = StaticPage::new(Url::parse("http://127.0.0.1:1").unwrap(), "/admin/pages/3/edit/")
        .with_form(FormSnapshot::new("page-edit-form"));
    let fetcher = PreviewFetcher::new(FetcherSettings::default()).unwrap();

    let err = fetcher.fetch(&page).await.unwrap_err();
    assert!(
        matches!(
            err,
            PanelError::NetworkFailure {
                step: ProtocolStep::Submit,
                ..
            }
        ),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn stalled_retrieval_is_a_retrieve_failure() {
    let (addr, recorded) = spawn_stalling_server().await;
    let page = edit_page(addr);
    let fetcher = PreviewFetcher::new(FetcherSettings {
        timeout_secs: 1,
        ..FetcherSettings::default()
    })
    .unwrap();

    let err = fetcher.fetch(&page).await.unwrap_err();
    assert!(
        matches!(
            err,
            PanelError::NetworkFailure {
                step: ProtocolStep::Retrieve,
                ..
            }
        ),
        "unexpected error: {err:?}"
    );

    let rec = recorded.lock();
    assert_eq!(
        rec.requests.first(),
        Some(&("POST".to_string(), "/admin/pages/3/preview/".to_string()))
    );
    assert_eq!(rec.requests.len(), 2);
}
