//! Session provider tests
//! Covers loading resolution, sign-in/out flows and token persistence
//!
//! Run with: cargo test --test session_tests

mod common;

use common::{local_provider, ScriptedProvider, PASSWORD};
use donorlink::auth::{Identity, IdentityError, IdentityProvider, ProfileUpdate, SessionProvider, SignInMethod};
use donorlink::auth::FederatedProfile;
use donorlink::error::Error;
use donorlink::storage::{FileStorage, LocalStorage, MemoryStorage, ACCESS_TOKEN_KEY};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn start() -> (Arc<donorlink::auth::LocalIdentityProvider>, Arc<MemoryStorage>, SessionProvider) {
    let idp = Arc::new(local_provider());
    let storage = Arc::new(MemoryStorage::new());
    let provider = SessionProvider::start(idp.clone(), storage.clone());
    (idp, storage, provider)
}

#[tokio::test]
async fn test_loading_never_reverts() {
    let (_idp, _storage, provider) = start();
    let mut consumer = provider.consumer();
    consumer.ready().await.unwrap();

    provider.register_user("a@example.org", PASSWORD).await.unwrap();
    let session = consumer.changed().await.unwrap();
    assert!(!session.is_loading);

    provider.log_out_user().await.unwrap();
    provider.login_user("a@example.org", PASSWORD).await.unwrap();
    let session = consumer.wait_for(|s| s.is_signed_in()).await.unwrap();
    assert!(!session.is_loading);
}

#[tokio::test]
async fn test_consumers_share_state() {
    let (_idp, _storage, provider) = start();
    let first = provider.consumer();
    let second = first.clone();

    provider.register_user("b@example.org", PASSWORD).await.unwrap();
    first.wait_for(|s| s.is_signed_in()).await.unwrap();

    assert_eq!(second.current_user().and_then(|u| u.email), Some("b@example.org".to_string()));
    assert!(!second.is_loading());
}

#[tokio::test]
async fn test_identity_errors_propagate() {
    let (_idp, _storage, provider) = start();
    provider.register_user("c@example.org", PASSWORD).await.unwrap();

    let duplicate = provider.register_user("c@example.org", PASSWORD).await;
    assert!(matches!(duplicate, Err(Error::Identity(IdentityError::EmailAlreadyInUse(_)))));

    let wrong = provider.login_user("c@example.org", "Wrong1").await;
    assert!(matches!(wrong, Err(Error::Identity(IdentityError::InvalidCredential))));

    let weak = provider.register_user("d@example.org", "abc").await;
    assert!(matches!(weak, Err(Error::Identity(IdentityError::WeakPassword))));
}

#[tokio::test]
async fn test_popup_without_profile_is_closed() {
    let (_idp, _storage, provider) = start();
    let result = provider.sign_in_with_google().await;
    assert!(matches!(result, Err(Error::Identity(IdentityError::PopupClosed))));
}

#[tokio::test]
async fn test_popup_signs_in_federated_user() {
    let idp = Arc::new(local_provider().with_federated_profile(FederatedProfile {
        email: "g@example.org".to_string(),
        display_name: Some("Gazi".to_string()),
        photo_url: None,
    }));
    let storage = Arc::new(MemoryStorage::new());
    let provider = SessionProvider::start(idp, storage.clone());

    let identity = provider.sign_in_with_google().await.unwrap();
    assert_eq!(identity.method, SignInMethod::Federated);

    provider.consumer().wait_for(|s| s.is_signed_in()).await.unwrap();
    assert!(storage.get(ACCESS_TOKEN_KEY).unwrap().is_some());
}

#[tokio::test]
async fn test_update_profile_reaches_session() {
    let (_idp, _storage, provider) = start();
    provider.register_user("e@example.org", PASSWORD).await.unwrap();

    let updated = provider
        .update_profile(&ProfileUpdate::new("Esha", Some("https://img.example.org/e.png".to_string())))
        .await
        .unwrap();
    assert_eq!(updated.display_name.as_deref(), Some("Esha"));

    let session = provider
        .consumer()
        .wait_for(|s| s.current_user.as_ref().and_then(|u| u.display_name.as_deref()) == Some("Esha"))
        .await
        .unwrap();
    assert_eq!(
        session.current_user.and_then(|u| u.photo_url).as_deref(),
        Some("https://img.example.org/e.png")
    );
}

#[tokio::test]
async fn test_sign_out_without_user_succeeds() {
    let (_idp, storage, provider) = start();
    provider.consumer().ready().await.unwrap();

    provider.log_out_user().await.unwrap();
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_token_fallback_to_persisted_value() {
    let idp = Arc::new(ScriptedProvider::new());
    let storage = Arc::new(MemoryStorage::new());
    let provider = SessionProvider::start(idp.clone(), storage.clone());

    idp.set_user(Some(Identity::new("f@example.org", SignInMethod::Password)));
    provider.consumer().wait_for(|s| s.is_signed_in()).await.unwrap();

    // Minting failed during the notification, so nothing was persisted
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
    assert!(provider.bearer_token().await.is_err());

    storage.set(ACCESS_TOKEN_KEY, "persisted-token").unwrap();
    assert_eq!(provider.bearer_token().await.unwrap().as_deref(), Some("persisted-token"));

    idp.set_token(Some("fresh-token"));
    assert_eq!(provider.bearer_token().await.unwrap().as_deref(), Some("fresh-token"));
}

#[tokio::test]
async fn test_session_restored_from_state_file() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("identity.json");
    let store = dir.path().join("storage.json");

    {
        let idp = Arc::new(local_provider().with_state_file(&state).unwrap());
        let provider = SessionProvider::start(idp, Arc::new(FileStorage::new(&store)));
        provider.register_user("h@example.org", PASSWORD).await.unwrap();
        provider.consumer().wait_for(|s| s.is_signed_in()).await.unwrap();
        provider.shutdown();
    }

    let idp = Arc::new(local_provider().with_state_file(&state).unwrap());
    let storage = Arc::new(FileStorage::new(&store));
    let provider = SessionProvider::start(idp, storage.clone());

    let session = provider.consumer().ready().await.unwrap();
    assert_eq!(session.email(), Some("h@example.org"));
    assert!(storage.get(ACCESS_TOKEN_KEY).unwrap().is_some());
}

#[tokio::test]
async fn test_shutdown_stops_listening() {
    let (idp, _storage, provider) = start();
    let consumer = provider.consumer();
    consumer.ready().await.unwrap();
    provider.shutdown();

    idp.register("late@example.org", PASSWORD).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(consumer.current_user().is_none());
}
