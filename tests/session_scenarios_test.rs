//! End-to-end session scenarios across consecutive requests

use std::sync::Arc;
use std::time::Duration;

use webapp_session::model::{Account, Authority};
use webapp_session::session::{InMemorySessionStore, RedisConfig};
use webapp_session::{RequestContext, SessionConfig, SessionError, SessionManager};

const SECRET_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

fn cookie_config() -> SessionConfig {
    SessionConfig {
        secret_key: Some(SECRET_KEY.to_string()),
        ..Default::default()
    }
}

fn account() -> Account {
    Account::new(1, "test", Authority { id: 1, name: "Admin".to_string() })
        .with_password("$2a$10$secret-hash")
}

async fn cookie_manager() -> SessionManager {
    SessionManager::from_config(&cookie_config()).await.unwrap()
}

fn in_memory_manager() -> SessionManager {
    let store = InMemorySessionStore::new(&cookie_config()).unwrap();
    SessionManager::new(Arc::new(store), Duration::from_secs(3600))
}

#[tokio::test]
async fn test_cookie_value_survives_to_next_request() {
    let sessions = cookie_manager().await;

    let mut ctx = RequestContext::new();
    sessions.set_value(&mut ctx, "lang", "en").await.unwrap();
    sessions.save(&mut ctx).await.unwrap();

    let mut next = ctx.next_request();
    assert_eq!(sessions.get_value(&mut next, "lang").await, "en");
}

#[tokio::test]
async fn test_unsaved_mutations_are_discarded() {
    let sessions = cookie_manager().await;

    let mut ctx = RequestContext::new();
    sessions.set_value(&mut ctx, "lang", "en").await.unwrap();

    let mut next = ctx.next_request();
    assert_eq!(sessions.get_value(&mut next, "lang").await, "");
}

#[tokio::test]
async fn test_unreachable_redis_is_fatal_at_startup() {
    let config = SessionConfig {
        redis: RedisConfig {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 1,
            connection_pool_size: 4,
            connect_timeout_seconds: 2,
        },
        ..cookie_config()
    };

    let err = SessionManager::from_config(&config).await.unwrap_err();
    assert!(matches!(err, SessionError::BackendInitialization(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_identity_absent_after_delete_cookie_backend() {
    let sessions = cookie_manager().await;

    let mut ctx = RequestContext::new();
    sessions.set_identity(&mut ctx, &account()).await.unwrap();
    sessions.save(&mut ctx).await.unwrap();

    let mut ctx = ctx.next_request();
    let signed_in: Account = sessions.get_identity(&mut ctx).await.unwrap();
    assert_eq!(signed_in.name, "test");
    assert_eq!(signed_in.password, "");

    sessions.delete(&mut ctx).await.unwrap();

    let mut ctx = ctx.next_request();
    assert_eq!(sessions.get_identity::<Account>(&mut ctx).await, None);
}

#[tokio::test]
async fn test_identity_absent_after_delete_server_side_backend() {
    let sessions = in_memory_manager();

    let mut ctx = RequestContext::new();
    sessions.set_identity(&mut ctx, &account()).await.unwrap();
    sessions.save(&mut ctx).await.unwrap();
    let stolen_cookie = ctx.next_request();

    let mut ctx = ctx.next_request();
    sessions.delete(&mut ctx).await.unwrap();

    let mut ctx = ctx.next_request();
    assert_eq!(sessions.get_identity::<Account>(&mut ctx).await, None);

    // Replaying the pre-logout cookie does not resurrect the session
    let mut replay = stolen_cookie;
    assert_eq!(sessions.get_identity::<Account>(&mut replay).await, None);
    assert!(sessions.get(&mut replay).await.is_empty());
}

#[tokio::test]
async fn test_logout_flash_does_not_revive_identity() {
    for sessions in [in_memory_manager(), cookie_manager().await] {
        let mut ctx = RequestContext::new();
        sessions.set_identity(&mut ctx, &account()).await.unwrap();
        sessions.save(&mut ctx).await.unwrap();
        let pre_logout = ctx.next_request();

        // Logout handler that leaves a flash message behind
        let mut ctx = ctx.next_request();
        sessions.delete(&mut ctx).await.unwrap();
        sessions.set_value(&mut ctx, "flash", "bye").await.unwrap();
        sessions.save(&mut ctx).await.unwrap();

        let mut ctx = ctx.next_request();
        assert_eq!(sessions.get_identity::<Account>(&mut ctx).await, None);
        assert_eq!(sessions.get_value(&mut ctx, "flash").await, "bye");

        if sessions.store().name() == "in-memory" {
            let mut replay = pre_logout;
            assert_eq!(sessions.get_identity::<Account>(&mut replay).await, None);
        }
    }
}

#[tokio::test]
async fn test_session_lifecycle_across_saves() {
    let sessions = in_memory_manager();

    // NoSession -> Active
    let mut ctx = RequestContext::new();
    sessions.set_value(&mut ctx, "step", &1).await.unwrap();
    sessions.save(&mut ctx).await.unwrap();
    let id = sessions.get(&mut ctx).await.id().map(str::to_string);

    // Active -> Active, value replaced
    let mut ctx = ctx.next_request();
    sessions.set_value(&mut ctx, "step", &2).await.unwrap();
    sessions.save(&mut ctx).await.unwrap();

    let mut ctx = ctx.next_request();
    assert_eq!(sessions.get(&mut ctx).await.id().map(str::to_string), id);
    assert_eq!(sessions.get_value(&mut ctx, "step").await, "2");

    // Active -> Expired -> fresh session
    sessions.delete(&mut ctx).await.unwrap();
    let mut ctx = ctx.next_request();
    let bag = sessions.get(&mut ctx).await;
    assert!(bag.is_new());
    assert_ne!(bag.id().map(str::to_string), id);
}

#[tokio::test]
async fn test_concurrent_requests_do_not_share_bags() {
    let sessions = in_memory_manager();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let sessions = sessions.clone();
            tokio::spawn(async move {
                let mut ctx = RequestContext::new();
                sessions.set_value(&mut ctx, "n", &i).await.unwrap();
                sessions.save(&mut ctx).await.unwrap();

                let mut next = ctx.next_request();
                sessions.get_value(&mut next, "n").await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), i.to_string());
    }
}
