//! Image resolution through the gateway, following the returned URLs.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::TimeDelta;
    use photogate_core::GatewayConfig;
    use photogate_gateway::{Gateway, GatewayError};
    use photogate_media::Variant;
    use photogate_store::StoreErrorKind;

    use crate::{Fixture, SIGNING_KEY, fixture, fixture_with, test_config, verifier};

    async fn login(fx: &Fixture) -> String {
        fx.gateway.login("pin", "pin-secret").await.unwrap().token
    }

    #[tokio::test]
    async fn test_should_serve_thumbnail_when_present() {
        let fx = fixture();
        let token = login(&fx).await;

        let resolution = fx
            .gateway
            .image(&token, "vacation", "1.jpg", Some("true"))
            .await
            .unwrap();
        assert_eq!(resolution.variant, Variant::Thumbnail);
        assert_eq!(resolution.bucket, "thumbnails");
        assert_eq!(resolution.key, "vacation/1.jpg.jpg");
        assert_eq!(fx.store.fetch(&resolution.url).unwrap(), b"vacation-1-thumb");
    }

    #[tokio::test]
    async fn test_should_fall_back_to_original_when_thumbnail_missing() {
        let fx = fixture();
        let token = login(&fx).await;

        let resolution = fx
            .gateway
            .image(&token, "vacation", "2.jpg", Some("1"))
            .await
            .unwrap();
        assert_eq!(resolution.variant, Variant::Original);
        assert_eq!(resolution.bucket, "media");
        assert_eq!(resolution.key, "vacation/2.jpg");
        assert_eq!(fx.store.fetch(&resolution.url).unwrap(), b"vacation-2-full");
    }

    #[tokio::test]
    async fn test_should_serve_original_without_thumbnail_flag() {
        let fx = fixture();
        let token = login(&fx).await;

        for flag in [None, Some("false"), Some("yes")] {
            let resolution = fx
                .gateway
                .image(&token, "work", "desk.jpg", flag)
                .await
                .unwrap();
            assert_eq!(resolution.variant, Variant::Original, "flag {flag:?}");
            assert_eq!(fx.store.fetch(&resolution.url).unwrap(), b"desk-full");
        }
    }

    #[tokio::test]
    async fn test_should_not_fall_back_when_thumbnail_store_denies_access() {
        let fx = fixture();
        let token = login(&fx).await;
        fx.store.inject_fault("thumbnails", StoreErrorKind::AccessDenied);
        let checks_before = fx.store.existence_checks();

        let err = fx
            .gateway
            .image(&token, "vacation", "2.jpg", Some("true"))
            .await
            .unwrap_err();
        match err {
            GatewayError::StoreUnavailable(source) => {
                assert_eq!(source.kind, StoreErrorKind::AccessDenied);
                assert_eq!(source.bucket, "thumbnails");
            }
            other => panic!("expected StoreUnavailable, got {other:?}"),
        }
        assert_eq!(fx.store.existence_checks() - checks_before, 1);
    }

    #[tokio::test]
    async fn test_should_report_not_found_when_nothing_exists() {
        let fx = fixture();
        let token = login(&fx).await;

        let err = fx
            .gateway
            .image(&token, "vacation", "missing.jpg", Some("true"))
            .await
            .unwrap_err();
        match err {
            GatewayError::MediaNotFound { key } => assert_eq!(key.as_str(), "vacation/missing.jpg"),
            other => panic!("expected MediaNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_should_resolve_repeat_requests_to_same_object() {
        let fx = fixture();
        let token = login(&fx).await;

        let first = fx
            .gateway
            .image(&token, "vacation", "1.jpg", Some("t"))
            .await
            .unwrap();
        let second = fx
            .gateway
            .image(&token, "vacation", "1.jpg", Some("t"))
            .await
            .unwrap();
        assert_eq!((first.bucket, first.key), (second.bucket, second.key));
    }

    #[tokio::test]
    async fn test_should_issue_url_that_stops_working_after_an_hour() {
        let fx = fixture();
        let token = login(&fx).await;

        let resolution = fx
            .gateway
            .image(&token, "work", "desk.jpg", None)
            .await
            .unwrap();
        let lifetime = resolution.expires_at - chrono::Utc::now();
        assert!(lifetime <= TimeDelta::hours(1));
        assert!(lifetime > TimeDelta::minutes(59));

        let before = resolution.expires_at - TimeDelta::minutes(1);
        assert!(fx.store.fetch_at(&resolution.url, before).is_ok());

        let after = resolution.expires_at + TimeDelta::minutes(1);
        let err = fx.store.fetch_at(&resolution.url, after).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::AccessDenied);
    }

    #[tokio::test]
    async fn test_should_reject_tampered_url() {
        let fx = fixture();
        let token = login(&fx).await;

        let resolution = fx
            .gateway
            .image(&token, "vacation", "1.jpg", None)
            .await
            .unwrap();
        let tampered = resolution.url.replace("vacation/1.jpg", "vacation/2.jpg");
        let err = fx.store.fetch(&tampered).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::AccessDenied);
    }

    #[tokio::test]
    async fn test_should_address_keys_containing_percent_escapes() {
        let fx = fixture();
        let token = login(&fx).await;
        fx.store.put_object("media", "vacation/100%25.jpg", b"escaped".to_vec());
        fx.store.put_object("media", "vacation/100%.jpg", b"literal".to_vec());

        for (image, body) in [("100%25.jpg", b"escaped"), ("100%.jpg", b"literal")] {
            let resolution = fx.gateway.image(&token, "vacation", image, None).await.unwrap();
            assert_eq!(resolution.key, format!("vacation/{image}"));
            assert_eq!(fx.store.fetch(&resolution.url).unwrap(), body, "{image}");
        }
    }

    #[tokio::test]
    async fn test_should_presign_against_configured_endpoint() {
        let fx = fixture();
        let token = login(&fx).await;

        let resolution = fx
            .gateway
            .image(&token, "work", "desk.jpg", None)
            .await
            .unwrap();
        assert!(
            resolution
                .url
                .starts_with("http://objects.test:9000/media/work/desk.jpg?"),
            "{}",
            resolution.url
        );
        assert!(resolution.url.contains("X-Amz-Credential=integration%2F"));
        assert_eq!(fx.store.fetch(&resolution.url).unwrap(), b"desk-full");
    }

    #[tokio::test]
    async fn test_should_presign_virtual_hosted_urls_when_configured() {
        let mut config = test_config();
        config.s3_virtual_hosting = true;
        let fx = fixture_with(&config);
        let token = login(&fx).await;

        let resolution = fx
            .gateway
            .image(&token, "vacation", "1.jpg", Some("true"))
            .await
            .unwrap();
        assert!(
            resolution
                .url
                .starts_with("http://thumbnails.objects.test:9000/vacation/1.jpg.jpg?"),
            "{}",
            resolution.url
        );
        assert_eq!(fx.store.fetch(&resolution.url).unwrap(), b"vacation-1-thumb");
    }

    #[test]
    fn test_should_refuse_to_start_with_unusable_url_lifetime() {
        for secs in [0, 7 * 24 * 60 * 60 + 1] {
            let mut config = test_config();
            config.presign_ttl_secs = secs;
            let result = Gateway::in_memory(&config, Arc::new(verifier()));
            assert!(matches!(result, Err(GatewayError::Config(_))), "{secs}s");
        }
    }

    #[tokio::test]
    async fn test_should_find_original_uploaded_after_not_found() {
        let config = GatewayConfig::builder()
            .signing_key(SIGNING_KEY.to_owned())
            .build();
        let fx = fixture_with(&config);
        let token = login(&fx).await;

        let err = fx
            .gateway
            .image(&token, "work", "plan.jpg", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::MediaNotFound { .. }));

        fx.store.put_object("media", "work/plan.jpg", b"plan-full".to_vec());
        let resolution = fx
            .gateway
            .image(&token, "work", "plan.jpg", None)
            .await
            .unwrap();
        assert_eq!(fx.store.fetch(&resolution.url).unwrap(), b"plan-full");
    }

    #[tokio::test]
    async fn test_should_reject_invalid_media_path() {
        let fx = fixture();
        let token = login(&fx).await;

        for (album, image) in [("", "1.jpg"), ("vacation", ""), ("vacation/", "1.jpg")] {
            let err = fx.gateway.image(&token, album, image, None).await.unwrap_err();
            assert!(
                matches!(err, GatewayError::InvalidRequest(_)),
                "{album}/{image} gave {err:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_time_out_slow_store() {
        let config = GatewayConfig::builder()
            .signing_key(SIGNING_KEY.to_owned())
            .existence_cache_ttl_secs(0)
            .store_timeout_ms(200)
            .build();
        let fx = fixture_with(&config);
        let token = login(&fx).await;
        fx.store.set_latency(Some(Duration::from_secs(10)));

        let err = fx
            .gateway
            .image(&token, "vacation", "1.jpg", Some("true"))
            .await
            .unwrap_err();
        match err {
            GatewayError::StoreUnavailable(source) => {
                assert_eq!(source.kind, StoreErrorKind::Timeout);
            }
            other => panic!("expected StoreUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_should_skip_store_call_for_cached_existence() {
        let config = GatewayConfig::builder()
            .signing_key(SIGNING_KEY.to_owned())
            .build();
        let fx = fixture_with(&config);
        let token = login(&fx).await;

        let warm = fx
            .gateway
            .image(&token, "vacation", "1.jpg", Some("true"))
            .await
            .unwrap();
        let checks = fx.store.existence_checks();

        let cached = fx
            .gateway
            .image(&token, "vacation", "1.jpg", Some("true"))
            .await
            .unwrap();
        assert_eq!(cached.key, warm.key);
        assert_eq!(fx.store.existence_checks(), checks);
    }

    #[tokio::test]
    async fn test_should_resolve_concurrently_for_many_sessions() {
        let fx = fixture();
        let pin = login(&fx).await;
        let pox = fx.gateway.login("pox", "pox-secret").await.unwrap().token;

        let requests = (0..32).map(|i| {
            let token = if i % 2 == 0 { &pin } else { &pox };
            let image = if i % 3 == 0 { "1.jpg" } else { "2.jpg" };
            fx.gateway.image(token, "vacation", image, Some("true"))
        });
        let results = futures::future::join_all(requests).await;

        for (i, result) in results.into_iter().enumerate() {
            let resolution = result.unwrap();
            let expected = if i % 3 == 0 { Variant::Thumbnail } else { Variant::Original };
            assert_eq!(resolution.variant, expected);
        }
    }
}
