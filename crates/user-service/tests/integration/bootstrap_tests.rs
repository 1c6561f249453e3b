//! End-to-end startup: configuration in, verified token and resource out.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::collections::HashMap;
use std::time::Duration;
use user_service::bootstrap;
use user_service::config::{
    Config, METADATA_HOST_VAR, PRIVATE_KEY_VAR, TOKEN_EXPIRY_SECONDS_VAR,
};
use user_service::errors::StartupError;
use user_service::monitoring::metadata::{CLUSTER_NAME_PATH, PROJECT_ID_PATH, ZONE_PATH};
use user_service::monitoring::{GceMetadataClient, POD_NAME_VAR};
use user_service::observability::metrics::{metrics_router, prometheus_builder};
use user_service::services::{Claims, TokenSubject};
use us_test_utils::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_metadata_server() -> MockServer {
    let server = MockServer::start().await;
    for (metadata_path, body) in [
        (PROJECT_ID_PATH, TEST_PROJECT_ID),
        (CLUSTER_NAME_PATH, TEST_CLUSTER_NAME),
        (ZONE_PATH, TEST_ZONE_PATH),
    ] {
        Mock::given(method("GET"))
            .and(path(metadata_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }
    server
}

/// Config built the way the process would see it, metadata host included.
fn service_config(server: &MockServer, pem: &str) -> Result<Config, anyhow::Error> {
    let host = server.uri().trim_start_matches("http://").to_string();
    Ok(Config::from_vars(&HashMap::from([
        (PRIVATE_KEY_VAR.to_string(), pem.to_string()),
        (TOKEN_EXPIRY_SECONDS_VAR.to_string(), "1800".to_string()),
        (METADATA_HOST_VAR.to_string(), host),
    ]))?)
}

#[tokio::test]
async fn test_startup_issues_verifiable_tokens() -> Result<(), anyhow::Error> {
    let server = spawn_metadata_server().await;
    let config = service_config(&server, &with_crlf_line_endings(RSA_PRIMARY_PKCS8_PEM))?;
    let metadata = GceMetadataClient::new(config.metadata_endpoint.clone(), Duration::from_secs(2))?;
    let env = HashMap::from([(POD_NAME_VAR.to_string(), TEST_POD_NAME.to_string())]);

    let ready = bootstrap::run(&config, &env, &metadata).await?;

    assert_eq!(ready.monitored_resource.labels.location, TEST_ZONE);

    let token = ready.token_issuer.issue_token(&TokenSubject {
        username: TEST_USERNAME.to_string(),
        account_id: TEST_ACCOUNT_ID.to_string(),
        display_name: TEST_DISPLAY_NAME.to_string(),
    })?;

    let key = DecodingKey::from_rsa_pem(RSA_PRIMARY_PUBLIC_PEM.as_bytes())?;
    let claims = decode::<Claims>(&token, &key, &Validation::new(Algorithm::RS256))?.claims;

    assert_eq!(claims.user, TEST_USERNAME);
    assert_eq!(claims.acct, TEST_ACCOUNT_ID);
    assert_eq!(claims.exp - claims.iat, 1800);

    Ok(())
}

#[tokio::test]
async fn test_bad_key_aborts_before_metadata_traffic() -> Result<(), anyhow::Error> {
    let server = spawn_metadata_server().await;
    let config = service_config(&server, RSA_PRIMARY_PKCS1_PEM)?;
    let metadata = GceMetadataClient::new(config.metadata_endpoint.clone(), Duration::from_secs(2))?;
    let env = HashMap::from([(POD_NAME_VAR.to_string(), TEST_POD_NAME.to_string())]);

    let result = bootstrap::run(&config, &env, &metadata).await;

    assert!(matches!(result, Err(StartupError::MalformedKey(_))));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_missing_pod_name_aborts_startup() -> Result<(), anyhow::Error> {
    let server = spawn_metadata_server().await;
    let config = service_config(&server, RSA_PRIMARY_PKCS8_PEM)?;
    let metadata = GceMetadataClient::new(config.metadata_endpoint.clone(), Duration::from_secs(2))?;

    let result = bootstrap::run(&config, &HashMap::<String, String>::new(), &metadata).await;

    assert!(matches!(
        result,
        Err(StartupError::MissingEnvironment(var)) if var == POD_NAME_VAR
    ));

    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_serves_labelled_startup_steps() -> Result<(), anyhow::Error> {
    let server = spawn_metadata_server().await;
    let config = service_config(&server, RSA_PRIMARY_PKCS8_PEM)?;
    let metadata = GceMetadataClient::new(config.metadata_endpoint.clone(), Duration::from_secs(2))?;
    let env = HashMap::from([(POD_NAME_VAR.to_string(), TEST_POD_NAME.to_string())]);

    // Startup, then recorder, then step metrics: the order the binary uses.
    let ready = bootstrap::run(&config, &env, &metadata).await?;
    let recorder = prometheus_builder(&ready.monitored_resource)
        .map_err(anyhow::Error::msg)?
        .build_recorder();
    let handle = recorder.handle();
    metrics::with_local_recorder(&recorder, || ready.record_startup_metrics());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, metrics_router(handle)).await;
    });

    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await?
        .error_for_status()?
        .text()
        .await?;

    let step_lines: Vec<&str> = body
        .lines()
        .filter(|line| line.starts_with("us_startup_step_total{"))
        .collect();
    assert_eq!(step_lines.len(), 2, "{body}");
    for line in step_lines {
        assert!(line.contains(r#"status="success""#), "{line}");
        assert!(line.contains(r#"cluster_name="test-cluster""#), "{line}");
        assert!(line.contains(r#"location="us-central1-b""#), "{line}");
    }

    Ok(())
}
