//! Login, session validation, and logout.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use photogate_auth::{CredentialError, CredentialVerifier, TokenError};
    use photogate_core::{GatewayConfig, Identity, UserId};
    use photogate_gateway::{Gateway, GatewayError};
    use photogate_store::InMemoryObjectStore;

    use crate::{fixture, fixture_with, test_config};

    #[derive(Debug)]
    struct UnreachableVerifier;

    #[async_trait]
    impl CredentialVerifier for UnreachableVerifier {
        async fn verify(&self, _: &str, _: &str) -> Result<Identity, CredentialError> {
            Err(CredentialError::Unavailable("connection refused".to_owned()))
        }
    }

    fn flip_first_signature_char(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut chars: Vec<char> = signature.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        format!("{head}.{}", chars.into_iter().collect::<String>())
    }

    #[tokio::test]
    async fn test_should_issue_token_that_validates_to_same_identity() {
        let fx = fixture();
        let issued = fx.gateway.login("pox", "pox-secret").await.unwrap();

        let identity = fx.gateway.authenticate(&issued.token).unwrap();
        assert_eq!(identity, Identity::new(UserId(2), "pox"));
        assert_eq!(identity, issued.identity);
        assert_eq!(
            (issued.expires_at - issued.issued_at).num_seconds(),
            3_600
        );
    }

    #[tokio::test]
    async fn test_should_fail_login_identically_for_bad_user_and_password() {
        let fx = fixture();
        let bad_password = fx.gateway.login("pin", "pox-secret").await.unwrap_err();
        let bad_user = fx.gateway.login("pix", "pin-secret").await.unwrap_err();
        assert!(matches!(bad_password, GatewayError::AuthenticationFailure));
        assert!(matches!(bad_user, GatewayError::AuthenticationFailure));
    }

    #[tokio::test]
    async fn test_should_report_unreachable_credential_store_as_auth_failure() {
        let gateway = Gateway::from_config(
            &test_config(),
            Arc::new(UnreachableVerifier),
            Arc::new(InMemoryObjectStore::default()),
        )
        .unwrap();
        let err = gateway.login("pin", "pin-secret").await.unwrap_err();
        assert!(matches!(err, GatewayError::AuthenticationFailure));
    }

    #[tokio::test]
    async fn test_should_accept_token_across_instances_sharing_a_key() {
        let first = fixture();
        let second = fixture();
        let token = first.gateway.login("pin", "pin-secret").await.unwrap().token;
        assert_eq!(
            second.gateway.authenticate(&token).unwrap().display_name,
            "pin"
        );
    }

    #[tokio::test]
    async fn test_should_reject_token_from_instance_with_other_key() {
        let keyed = fixture();
        let ephemeral = fixture_with(&GatewayConfig::default());
        let token = keyed.gateway.login("pin", "pin-secret").await.unwrap().token;
        assert!(matches!(
            ephemeral.gateway.authenticate(&token),
            Err(GatewayError::TokenInvalid(TokenError::SignatureInvalid))
        ));
    }

    #[tokio::test]
    async fn test_should_reject_expired_token_with_valid_signature() {
        let fx = fixture();
        let identity = Identity::new(UserId(1), "pin");
        let stale = fx
            .gateway
            .tokens()
            .issue_at(&identity, Utc::now() - Duration::hours(2))
            .unwrap();

        let err = fx.gateway.authenticate(&stale.token).unwrap_err();
        assert!(matches!(err, GatewayError::TokenInvalid(TokenError::Expired)));
        assert_eq!(err.to_string(), "unauthorized");
    }

    #[tokio::test]
    async fn test_should_reject_tampered_signature() {
        let fx = fixture();
        let token = fx.gateway.login("pin", "pin-secret").await.unwrap().token;
        let tampered = flip_first_signature_char(&token);
        assert!(matches!(
            fx.gateway.authenticate(&tampered),
            Err(GatewayError::TokenInvalid(TokenError::SignatureInvalid))
        ));
    }

    #[tokio::test]
    async fn test_should_reject_malformed_token() {
        let fx = fixture();
        for token in ["", "not-a-token", "v2.a.b", "v1.a.b.c", "v1.!!!.AAAA"] {
            assert!(matches!(
                fx.gateway.authenticate(token),
                Err(GatewayError::TokenInvalid(TokenError::Malformed))
            ));
        }
    }

    #[tokio::test]
    async fn test_should_report_session_info() {
        let fx = fixture();
        let issued = fx.gateway.login("pin", "pin-secret").await.unwrap();
        let info = fx.gateway.session_info(&issued.token).unwrap();
        assert_eq!(info.identity, issued.identity);
        assert_eq!(info.issued_at.timestamp(), issued.issued_at.timestamp());
        assert_eq!(info.expires_at.timestamp(), issued.expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_should_end_only_the_logged_out_session() {
        let fx = fixture();
        let first = fx.gateway.login("pin", "pin-secret").await.unwrap().token;
        let second = fx.gateway.login("pin", "pin-secret").await.unwrap().token;

        assert_eq!(fx.gateway.logout(&first).unwrap().display_name, "pin");
        assert!(matches!(
            fx.gateway.authenticate(&first),
            Err(GatewayError::TokenInvalid(TokenError::Revoked))
        ));
        assert!(fx.gateway.authenticate(&second).is_ok());
        assert!(matches!(
            fx.gateway.list_albums(&first).await,
            Err(GatewayError::TokenInvalid(TokenError::Revoked))
        ));
    }

    #[tokio::test]
    async fn test_should_use_configured_token_ttl() {
        let config = GatewayConfig::builder()
            .signing_key(crate::SIGNING_KEY.to_owned())
            .token_ttl_secs(60)
            .build();
        let fx = fixture_with(&config);
        let issued = fx.gateway.login("pin", "pin-secret").await.unwrap();
        assert_eq!((issued.expires_at - issued.issued_at).num_seconds(), 60);
    }
}
