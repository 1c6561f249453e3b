//! Integration tests for monitored-resource discovery against a fake
//! metadata server.

use std::collections::HashMap;
use std::time::Duration;
use user_service::errors::StartupError;
use user_service::monitoring::metadata::{
    CLUSTER_NAME_PATH, METADATA_FLAVOR, METADATA_FLAVOR_VALUE, PROJECT_ID_PATH, ZONE_PATH,
};
use user_service::monitoring::{
    discover_monitored_resource, GceMetadataClient, POD_NAME_VAR, RESOURCE_TYPE_K8S_CONTAINER,
};
use us_test_utils::*;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fake metadata server answering all three lookups.
async fn spawn_metadata_server() -> MockServer {
    let server = MockServer::start().await;

    for (metadata_path, body) in [
        (PROJECT_ID_PATH, TEST_PROJECT_ID),
        (CLUSTER_NAME_PATH, TEST_CLUSTER_NAME),
        (ZONE_PATH, TEST_ZONE_PATH),
    ] {
        Mock::given(method("GET"))
            .and(path(metadata_path))
            .and(header(METADATA_FLAVOR, METADATA_FLAVOR_VALUE))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    server
}

fn pod_env(pod_name: &str) -> HashMap<String, String> {
    HashMap::from([(POD_NAME_VAR.to_string(), pod_name.to_string())])
}

#[tokio::test]
async fn test_discovers_resource_from_metadata_server() -> Result<(), anyhow::Error> {
    let server = spawn_metadata_server().await;
    let client = GceMetadataClient::new(Some(server.uri()), Duration::from_secs(2))?;

    let resource = discover_monitored_resource(&pod_env(TEST_POD_NAME), &client).await?;

    assert_eq!(resource.resource_type, RESOURCE_TYPE_K8S_CONTAINER);
    assert_eq!(resource.project_id, TEST_PROJECT_ID);

    let labels = resource.labels.to_map();
    let expected: HashMap<&str, &str> = HashMap::from([
        ("namespace_name", "default"),
        ("container_name", TEST_CONTAINER_NAME),
        ("pod_name", TEST_POD_NAME),
        ("cluster_name", TEST_CLUSTER_NAME),
        ("location", TEST_ZONE),
    ]);
    assert_eq!(labels.len(), expected.len());
    for (key, value) in expected {
        assert_eq!(labels.get(key).map(String::as_str), Some(value), "label {key}");
    }

    Ok(())
}

#[tokio::test]
async fn test_bad_pod_name_sends_no_metadata_requests() -> Result<(), anyhow::Error> {
    let server = spawn_metadata_server().await;
    let client = GceMetadataClient::new(Some(server.uri()), Duration::from_secs(2))?;

    for pod in [TEST_POD_NAME_NO_HYPHEN, TEST_POD_NAME_LEADING_HYPHEN] {
        let result = discover_monitored_resource(&pod_env(pod), &client).await;
        assert!(matches!(
            result,
            Err(StartupError::UnexpectedPodNameFormat { .. })
        ));
    }

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "got {} requests", requests.len());

    Ok(())
}

#[tokio::test]
async fn test_missing_cluster_attribute_fails() -> Result<(), anyhow::Error> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CLUSTER_NAME_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = GceMetadataClient::new(Some(server.uri()), Duration::from_secs(2))?;
    let result = discover_monitored_resource(&pod_env(TEST_POD_NAME), &client).await;

    match result {
        Err(StartupError::Metadata(msg)) => assert!(msg.contains("cluster-name"), "{msg}"),
        other => panic!("expected metadata error, got {other:?}"),
    }

    Ok(())
}
