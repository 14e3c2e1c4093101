//! End-to-end lifecycle tests through the public API.

use std::sync::Arc;

use reclient::{ClientConfig, ClientFactory, Error, HostScope, KeyStrategy};

#[test]
fn handles_survive_removal_until_closed() {
    let factory = ClientFactory::per_host();
    let handle = factory.get("https://api.example.com/v1").unwrap();

    let key = HostScope.derive_key(&url::Url::parse("https://api.example.com/v1").unwrap());
    let removed = factory.cache().remove(&key).unwrap();
    assert!(Arc::ptr_eq(&handle, &removed));

    // Still usable after removal.
    assert!(handle.get("https://api.example.com/v1/users").is_ok());

    // Re-fetching builds a distinct handle.
    let fresh = factory.get("https://api.example.com/v1").unwrap();
    assert!(!Arc::ptr_eq(&handle, &fresh));

    handle.close();
    assert!(matches!(
        handle.get("https://api.example.com/v1/users"),
        Err(Error::Disposed)
    ));
}

#[test]
fn dispose_all_tears_down_every_handle() {
    let factory = ClientFactory::per_base_url();
    let v1 = factory.get("https://api.example.com/v1").unwrap();
    let v2 = factory.get("https://api.example.com/v2").unwrap();
    assert_eq!(factory.cache().len(), 2);

    factory.dispose_all();

    assert!(factory.cache().is_empty());
    assert!(v1.is_closed());
    assert!(v2.is_closed());

    // The factory itself stays usable and rebuilds on demand.
    let rebuilt = factory.get("https://api.example.com/v1").unwrap();
    assert!(!rebuilt.is_closed());
    assert!(!Arc::ptr_eq(&v1, &rebuilt));
}

#[test]
fn custom_config_reaches_the_request() {
    let mut config = ClientConfig::default();
    config.user_agent = "lifecycle-test/1.0".into();
    let factory = ClientFactory::per_host_with_config(config);

    let handle = factory.get("https://api.example.com").unwrap();
    handle.set_default_header("x-tenant", "acme").unwrap();
    handle
        .configure(|d| d.timeout = Some(std::time::Duration::from_secs(3)))
        .unwrap();

    let request = handle
        .post("https://api.example.com/v1/orders")
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(request.headers().get("x-tenant").unwrap(), "acme");
    assert_eq!(request.timeout(), Some(&std::time::Duration::from_secs(3)));
}

#[tokio::test]
async fn handle_issues_requests_inside_a_runtime() {
    // Connection-refused is fine; the point is that a handle obtained from
    // the factory can drive reqwest end to end without panicking.
    let factory = ClientFactory::per_host();
    let handle = factory.get("http://127.0.0.1:9/").unwrap();
    let result = handle.get("http://127.0.0.1:9/").unwrap().send().await;
    assert!(result.is_err());
}
