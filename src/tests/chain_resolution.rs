#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::cache::credential::{CredentialType, CredentialValue};
    use crate::config::env::EnvSnapshot;
    use crate::config::provider::Config;
    use crate::credential::Credential;
    use crate::error::{CredentialError, Result};
    use crate::providers::chain::ChainProvider;
    use crate::providers::CredentialsProvider;
    use crate::tests::common::{context_with, ecs_body, expiration_in, ok, FakeTransport};

    /// Provider with a fixed outcome that counts how often it was asked.
    #[derive(Debug)]
    struct Scripted {
        name: &'static str,
        outcome: std::result::Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(name: &'static str, access_key_id: &'static str) -> Arc<Self> {
            Arc::new(Self { name, outcome: Ok(access_key_id), calls: AtomicUsize::new(0) })
        }

        fn failing(name: &'static str, message: &'static str) -> Arc<Self> {
            Arc::new(Self { name, outcome: Err(message), calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialsProvider for Scripted {
        fn provider_name(&self) -> &str {
            self.name
        }

        async fn get_credentials(&self) -> Result<CredentialValue> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Ok(id) => Ok(CredentialValue::access_key(id, "secret", CredentialType::AccessKey, self.name)),
                Err(message) => Err(CredentialError::transport(message)),
            }
        }
    }

    #[tokio::test]
    async fn static_access_key_resolves_without_network() {
        let transport = FakeTransport::unreachable();
        let config = Config::new()
            .with_type("access_key")
            .with_access_key_id("AKID")
            .with_access_key_secret("SECRET");
        let credential =
            Credential::with_parts(Some(config), context_with(&transport, EnvSnapshot::default()), None).unwrap();

        let value = credential.get_credential().await.unwrap();
        assert_eq!(value.access_key_id, "AKID");
        assert_eq!(value.access_key_secret, "SECRET");
        assert_eq!(value.security_token, "");
        assert_eq!(value.credential_type, CredentialType::AccessKey);
        assert_eq!(value.provider_name, "static_ak");
        assert_eq!(credential.access_key_id().await.unwrap(), "AKID");
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn bearer_token_resolves_with_its_own_type() {
        let transport = FakeTransport::unreachable();
        let config = Config::new().with_type("bearer").with_bearer_token("bearer-123");
        let credential =
            Credential::with_parts(Some(config), context_with(&transport, EnvSnapshot::default()), None).unwrap();

        assert_eq!(credential.bearer_token().await.unwrap(), "bearer-123");
        assert_eq!(credential.credential_type(), CredentialType::Bearer);
        assert_eq!(credential.access_key_id().await.unwrap(), "");
    }

    #[tokio::test]
    async fn chain_short_circuits_on_first_success() {
        let a = Scripted::failing("a", "a is down");
        let b = Scripted::ok("b", "from-b");
        let c = Scripted::ok("c", "from-c");
        let chain = ChainProvider::new(vec![a.clone(), b.clone(), c.clone()]);

        let value = chain.get_credentials().await.unwrap();
        assert_eq!(value.access_key_id, "from-b");
        assert_eq!(value.provider_name, "b");
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 0));
    }

    #[tokio::test]
    async fn exhausted_chain_aggregates_every_error() {
        let chain = ChainProvider::new(vec![Scripted::failing("x", "x"), Scripted::failing("y", "y")]);

        let err = chain.get_credentials().await.unwrap_err();
        assert_eq!(err, CredentialError::ChainExhausted(vec!["x".into(), "y".into()]));
        assert_eq!(
            err.to_string(),
            "unable to get credentials from any of the providers in the chain: x, y"
        );
    }

    #[tokio::test]
    async fn default_chain_relabels_the_answering_provider() {
        let transport = FakeTransport::unreachable();
        let env = EnvSnapshot {
            access_key_id: Some("env-id".into()),
            access_key_secret: Some("env-secret".into()),
            ..Default::default()
        };
        let credential = Credential::with_parts(None, context_with(&transport, env), None).unwrap();

        let value = credential.get_credential().await.unwrap();
        assert_eq!(value.access_key_id, "env-id");
        assert_eq!(value.credential_type, CredentialType::Default);
        assert_eq!(value.provider_name, "default/env");
        assert_eq!(credential.credential_type(), CredentialType::Default);
    }

    #[tokio::test]
    async fn default_chain_honours_environment_switches() {
        let transport = FakeTransport::unreachable();
        let profile: Arc<dyn CredentialsProvider> = Scripted::ok("cli_profile", "profile-id");

        let env = EnvSnapshot { ecs_metadata_disabled: true, ..Default::default() };
        let chain = ChainProvider::default_chain(&context_with(&transport, env), Some(profile.clone())).unwrap();
        let names: Vec<&str> = chain.providers().iter().map(|p| p.provider_name()).collect();
        assert_eq!(names, vec!["env", "cli_profile"]);

        let env = EnvSnapshot {
            cli_profile_disabled: true,
            oidc_token_file: Some("/var/run/token".into()),
            oidc_provider_arn: Some("acs:ram::1:oidc-provider/p".into()),
            role_arn: Some("acs:ram::1:role/r".into()),
            ..Default::default()
        };
        let chain = ChainProvider::default_chain(&context_with(&transport, env), Some(profile)).unwrap();
        let names: Vec<&str> = chain.providers().iter().map(|p| p.provider_name()).collect();
        assert_eq!(names, vec!["env", "oidc_role_arn", "ecs_ram_role"]);
    }

    #[tokio::test]
    async fn default_chain_falls_through_to_instance_role() {
        let transport = FakeTransport::new(|request| {
            if request.url.ends_with("/security-credentials/app-role") {
                ok(ecs_body("STS.ecs", &expiration_in(3600)))
            } else {
                panic!("unexpected request to {}", request.url)
            }
        });
        let env = EnvSnapshot { ecs_metadata_role: Some("app-role".into()), ..Default::default() };
        let credential = Credential::with_parts(None, context_with(&transport, env), None).unwrap();

        let value = credential.get_credential().await.unwrap();
        assert_eq!(value.access_key_id, "STS.ecs");
        assert_eq!(value.provider_name, "default/ecs_ram_role");
        assert_eq!(transport.calls_to("100.100.100.200"), 1);
    }
}
