//! Header propagation over a real connection.

use probe_server::config::environment::DEFAULT_VERSION;
use reqwest::StatusCode;

mod common;

// Single test: it mutates the process-wide `VERSION` variable.
#[tokio::test]
async fn echoes_request_headers_and_stamps_version() {
    std::env::remove_var("VERSION");
    let service = common::start_service(common::fast_config()).await;
    let client = common::client();

    let res = client
        .get(service.url("/run"))
        .header("x-tenant", "blue")
        .header("x-forwarded-for", "198.51.100.4")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);
    assert_eq!(res.headers()["x-tenant"], "blue");
    assert_eq!(res.headers()["x-forwarded-for"], "198.51.100.4");
    assert_eq!(res.headers()["version"], DEFAULT_VERSION);

    // Multiple values: only the first comes back.
    let res = client
        .get(service.url("/info"))
        .header("x-multi", "first")
        .header("x-multi", "second")
        .send()
        .await
        .unwrap();
    let values: Vec<_> = res.headers().get_all("x-multi").iter().collect();
    assert_eq!(values, vec!["first"]);

    // The override is read per request.
    std::env::set_var("VERSION", "v9.9.9-test");
    let res = client.get(service.url("/info")).send().await.unwrap();
    assert_eq!(res.headers()["version"], "v9.9.9-test");
    std::env::remove_var("VERSION");

    service.token.cancel();
    service.task.await.unwrap().unwrap();
}
