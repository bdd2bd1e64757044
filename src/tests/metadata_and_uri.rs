#[cfg(test)]
mod test {
    use std::sync::Arc;

    use httpmock::Method::{GET, PUT};
    use httpmock::MockServer;

    use crate::cache::credential::CredentialType;
    use crate::config::env::EnvSnapshot;
    use crate::config::provider::Config;
    use crate::credential::Credential;
    use crate::providers::ProviderContext;
    use crate::tests::common::{expiration_in, json};
    use crate::transport::{ReqwestTransport, RuntimeOptions};

    fn http_context() -> ProviderContext {
        ProviderContext::new(
            Arc::new(ReqwestTransport::new().unwrap()),
            RuntimeOptions::default(),
            EnvSnapshot::default(),
        )
    }

    fn build(config: Config) -> Credential {
        Credential::with_parts(Some(config), http_context(), None).unwrap()
    }

    #[tokio::test]
    async fn imds_v2_flow_discovers_role_and_fetches_credentials() {
        let server = MockServer::start_async().await;
        let token = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/latest/api/token")
                    .header("X-aliyun-ecs-metadata-token-ttl-seconds", "600");
                then.status(200).body("imds-token");
            })
            .await;
        let role = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/latest/meta-data/ram/security-credentials/")
                    .header("X-aliyun-ecs-metadata-token", "imds-token");
                then.status(200).body("app-role");
            })
            .await;
        let credentials = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/latest/meta-data/ram/security-credentials/app-role")
                    .header("X-aliyun-ecs-metadata-token", "imds-token");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({
                        "Code": "Success",
                        "AccessKeyId": "STS.imds",
                        "AccessKeySecret": "imds-secret",
                        "SecurityToken": "imds-token-value",
                        "Expiration": expiration_in(3600),
                    }));
            })
            .await;

        let credential = build(
            Config::new()
                .with_type("ecs_ram_role")
                .with_enable_imds_v2(true)
                .with_metadata_token_duration(600)
                .with_metadata_endpoint(server.base_url()),
        );

        let value = credential.get_credential().await.unwrap();
        assert_eq!(value.access_key_id, "STS.imds");
        assert_eq!(value.security_token, "imds-token-value");
        assert_eq!(value.credential_type, CredentialType::EcsRamRole);

        // still fresh, nothing is requested again
        credential.get_credential().await.unwrap();

        token.assert_async().await;
        role.assert_async().await;
        credentials.assert_async().await;
    }

    #[tokio::test]
    async fn imds_rejects_non_success_code() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest/meta-data/ram/security-credentials/app-role");
                then.status(200).json_body(json!({ "Code": "Failed" }));
            })
            .await;

        let credential = build(
            Config::new()
                .with_type("ecs_ram_role")
                .with_role_name("app-role")
                .with_metadata_endpoint(server.base_url()),
        );

        let err = credential.get_credential().await.unwrap_err();
        assert_eq!(err.to_string(), "refresh Ecs sts token err: Code is not Success");
    }

    #[tokio::test]
    async fn imds_error_status_is_reported_with_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/latest/meta-data/ram/security-credentials/");
                then.status(404).body("no role");
            })
            .await;

        let credential = build(
            Config::new()
                .with_type("ecs_ram_role")
                .with_metadata_endpoint(server.base_url()),
        );

        let err = credential.get_credential().await.unwrap_err();
        assert_eq!(err.to_string(), "refresh Ecs sts token err: unexpected status 404: no role");
    }

    #[tokio::test]
    async fn credentials_uri_success_is_cached() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/credentials");
                then.status(200).json_body(json!({
                    "Code": "Success",
                    "AccessKeyId": "STS.uri",
                    "AccessKeySecret": "uri-secret",
                    "SecurityToken": "uri-token",
                    "Expiration": expiration_in(3600),
                }));
            })
            .await;

        let credential = build(
            Config::new()
                .with_type("credentials_uri")
                .with_url(server.url("/credentials")),
        );

        let value = credential.get_credential().await.unwrap();
        assert_eq!(value.access_key_id, "STS.uri");
        assert_eq!(value.credential_type, CredentialType::CredentialsUri);
        assert_eq!(value.provider_name, "credentials_uri");
        assert_eq!(credential.security_token().await.unwrap(), "uri-token");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn credentials_uri_failures_are_descriptive() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/broken");
                then.status(500).body("internal");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/denied");
                then.status(200).json_body(json!({ "Code": "Denied" }));
            })
            .await;

        let broken = build(Config::new().with_type("credentials_uri").with_url(server.url("/broken")));
        let err = broken.get_credential().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("get credentials from {} failed, status code 500, body: internal", server.url("/broken"))
        );

        let denied = build(Config::new().with_type("credentials_uri").with_url(server.url("/denied")));
        let err = denied.get_credential().await.unwrap_err();
        assert_eq!(err.to_string(), "get credentials from uri err, Code is not Success");
    }
}
