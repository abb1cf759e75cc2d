//! Album listings, including partial results on store failure.

#[cfg(test)]
mod tests {
    use photogate_gateway::GatewayError;
    use photogate_media::Listing;
    use photogate_store::StoreErrorKind;

    use crate::{Fixture, fixture};

    async fn login(fx: &Fixture) -> String {
        fx.gateway.login("pox", "pox-secret").await.unwrap().token
    }

    fn names(listing: &Listing) -> Vec<&str> {
        listing.entries.iter().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn test_should_list_albums() {
        let fx = fixture();
        let token = login(&fx).await;

        let listing = fx.gateway.list_albums(&token).await.unwrap();
        assert_eq!(names(&listing), ["vacation", "work"]);
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn test_should_list_album_contents() {
        let fx = fixture();
        let token = login(&fx).await;

        let listing = fx.gateway.list_album(&token, "vacation").await.unwrap();
        assert_eq!(names(&listing), ["vacation/1.jpg", "vacation/2.jpg"]);
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn test_should_return_empty_listing_for_unknown_album() {
        let fx = fixture();
        let token = login(&fx).await;

        let listing = fx.gateway.list_album(&token, "albums").await.unwrap();
        assert!(listing.entries.is_empty());
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn test_should_reject_nested_album_name() {
        let fx = fixture();
        let token = login(&fx).await;

        let err = fx.gateway.list_album(&token, "vacation/raw").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_should_truncate_listing_interrupted_by_store_failure() {
        let fx = fixture();
        let token = login(&fx).await;
        fx.store.fail_listing_after("media", 1, StoreErrorKind::Transient);

        let listing = fx.gateway.list_albums(&token).await.unwrap();
        assert_eq!(names(&listing), ["vacation"]);
        assert!(listing.truncated);

        fx.store.clear_faults("media");
        let listing = fx.gateway.list_albums(&token).await.unwrap();
        assert_eq!(names(&listing), ["vacation", "work"]);
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn test_should_return_empty_truncated_listing_when_bucket_unreachable() {
        let fx = fixture();
        let token = login(&fx).await;
        fx.store.inject_fault("media", StoreErrorKind::AccessDenied);

        let listing = fx.gateway.list_album(&token, "vacation").await.unwrap();
        assert!(listing.entries.is_empty());
        assert!(listing.truncated);
    }

    #[tokio::test]
    async fn test_should_list_newly_uploaded_album() {
        let fx = fixture();
        let token = login(&fx).await;
        fx.store.put_object("media", "birthday/cake.jpg", b"cake".to_vec());

        let listing = fx.gateway.list_albums(&token).await.unwrap();
        assert_eq!(names(&listing), ["birthday", "vacation", "work"]);

        let token_after = fx.gateway.login("pin", "pin-secret").await.unwrap().token;
        let listing = fx.gateway.list_album(&token_after, "birthday").await.unwrap();
        assert_eq!(names(&listing), ["birthday/cake.jpg"]);
    }

    #[tokio::test]
    async fn test_should_require_session_for_listing() {
        let fx = fixture();
        assert!(matches!(
            fx.gateway.list_albums("").await,
            Err(GatewayError::TokenInvalid(_))
        ));
        assert!(matches!(
            fx.gateway.list_album("v1.x.y", "vacation").await,
            Err(GatewayError::TokenInvalid(_))
        ));
    }
}
