#[cfg(test)]
mod test {
    use std::io::Write;

    use http::StatusCode;
    use serial_test::serial;
    use tempfile::NamedTempFile;

    use crate::config::env::EnvSnapshot;
    use crate::config::loader::file_to_config;
    use crate::config::provider::{Config, ProviderConfig};
    use crate::config::settings::{LogFormat, SettingsConfig};
    use crate::credential::Credential;
    use crate::server::server::build_router;
    use crate::tests::common::{build_reqwest_client, context_with, spawn_axum, status, FakeTransport};
    use crate::utils::config_loader;

    fn yaml_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    #[serial]
    async fn config_file_is_expanded_before_parsing() {
        std::env::set_var("AGENT_TEST_ROLE_ARN", "acs:ram::100:role/from-env");
        std::env::remove_var("AGENT_TEST_REGION");
        let file = yaml_file(
            r#"
settings:
  server:
    port: "9911"
  metrics:
    is_enabled: true
  logging:
    level: debug
    format: json
credential:
  type: ram_role_arn
  access_key_id: akid
  access_key_secret: secret
  role_arn: ${AGENT_TEST_ROLE_ARN}
  sts_region_id: ${AGENT_TEST_REGION:cn-shanghai}
  role_session_expiration: 1800
  timeout: 2500
"#,
        );

        let config = file_to_config(file.path()).await.unwrap();
        std::env::remove_var("AGENT_TEST_ROLE_ARN");

        assert_eq!(config.settings.server.port, "9911");
        assert_eq!(config.settings.server.host, "127.0.0.1");
        assert!(config.settings.metrics.is_enabled);
        assert_eq!(config.settings.metrics.path, "/metrics");
        let logging = config.settings.logging.clone().unwrap();
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);

        let credential = config.credential.clone().unwrap();
        assert_eq!(credential.role_arn.as_deref(), Some("acs:ram::100:role/from-env"));
        assert_eq!(credential.sts_region_id.as_deref(), Some("cn-shanghai"));
        assert!(matches!(credential.provider_config().unwrap(), ProviderConfig::RamRoleArn(_)));
        assert_eq!(config.runtime_options().read_timeout_ms, 2500);
    }

    #[tokio::test]
    async fn missing_or_malformed_config_is_reported() {
        let err = config_loader::run("/nonexistent/credentials-agent.yaml").await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid config format: unable to read config file"));

        let file = yaml_file("credential:\n  type: access_key\n  colour: blue\n");
        let err = config_loader::run(file.path().to_str().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("unknown field `colour`"), "{err}");
    }

    #[tokio::test]
    async fn no_credential_block_means_default_chain() {
        let file = yaml_file("settings:\n  server:\n    credentials_path: creds\n");
        let config = file_to_config(file.path()).await.unwrap();
        assert!(config.credential.is_none());
        assert_eq!(config.settings.server.credentials_path, "creds");
    }

    fn settings(metrics: bool) -> SettingsConfig {
        let mut settings = SettingsConfig::default();
        settings.metrics.is_enabled = metrics;
        settings
    }

    #[tokio::test]
    async fn credentials_route_serves_uri_document() {
        let transport = FakeTransport::unreachable();
        let config = Config::new()
            .with_type("sts")
            .with_access_key_id("STS.id")
            .with_access_key_secret("sts-secret")
            .with_security_token("sts-token");
        let credential =
            Credential::with_parts(Some(config), context_with(&transport, EnvSnapshot::default()), None).unwrap();

        let router = build_router(&settings(true), credential).await;
        let (handle, addr) = spawn_axum(router).await;
        let client = build_reqwest_client();

        let response = client.get(format!("http://{addr}/credentials")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["Code"], "Success");
        assert_eq!(body["AccessKeyId"], "STS.id");
        assert_eq!(body["AccessKeySecret"], "sts-secret");
        assert_eq!(body["SecurityToken"], "sts-token");
        // static credentials never expire
        assert!(body.get("Expiration").is_none());
        assert!(body.get("Message").is_none());

        let metrics = client.get(format!("http://{addr}/metrics")).send().await.unwrap();
        assert_eq!(metrics.status(), StatusCode::OK);
        let text = metrics.text().await.unwrap();
        assert!(text.contains("credentialsagent_credential_requests_total"), "{text}");

        handle.abort();
    }

    #[tokio::test]
    async fn credentials_route_reports_failures() {
        let transport = FakeTransport::new(|_| status(500, "boom"));
        let config = Config::new()
            .with_type("ram_role_arn")
            .with_access_key_id("akid")
            .with_access_key_secret("secret")
            .with_role_arn("acs:ram::100:role/app");
        let credential =
            Credential::with_parts(Some(config), context_with(&transport, EnvSnapshot::default()), None).unwrap();

        let router = build_router(&settings(false), credential).await;
        let (handle, addr) = spawn_axum(router).await;
        let client = build_reqwest_client();

        let response = client.get(format!("http://{addr}/credentials")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["Code"], "Failed");
        assert_eq!(body["Message"], "get session token failed: boom");
        assert!(body.get("AccessKeyId").is_none());

        // metrics route is off
        let metrics = client.get(format!("http://{addr}/metrics")).send().await.unwrap();
        assert_eq!(metrics.status(), StatusCode::NOT_FOUND);

        handle.abort();
    }
}
