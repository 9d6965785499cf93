//! End-to-end account lifecycle over the file-backed store.

use std::sync::Arc;
use std::time::Duration;

use keyward_accounts::codec;
use keyward_accounts::{
    AccountError, AccountEvent, AccountRegistry, AccountStore, CipherParams, EphemeralStore,
    FileAccountStore,
};
use keyward_core::SecretString;
use keyward_integration_tests::{exported, TestEnv, TEST_ITERATIONS};

fn pw(s: &str) -> SecretString {
    SecretString::new(s)
}

#[tokio::test]
async fn test_create_unlock_sign_lock() {
    let env = TestEnv::new();
    let registry = AccountRegistry::from_config(&env.config).unwrap();

    let created = registry.create_imported(exported(1), &pw("p1")).await.unwrap();
    let account = registry.get(&created.id).await.unwrap();
    assert!(account.is_locked().await);

    account.unlock(&pw("p1")).await.unwrap();
    assert!(!account.is_locked().await);
    assert_eq!(registry.sessions().len().await, 1);

    let signature = account.sign_data(&[1, 2, 3]).await.unwrap();
    assert!(codec::verify_serialized_signature(
        &[1, 2, 3],
        &signature,
        &created.public_key
    ));

    account.lock(false).await.unwrap();
    assert!(matches!(
        account.sign_data(&[1, 2, 3]).await,
        Err(AccountError::AccountLocked(_))
    ));
}

#[tokio::test]
async fn test_record_on_disk_holds_no_plaintext() {
    let env = TestEnv::new();
    let registry = AccountRegistry::from_config(&env.config).unwrap();
    let created = registry.create_imported(exported(2), &pw("p1")).await.unwrap();

    let path = env.accounts_dir().join(format!("{}.json", created.id));
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains(&exported(2).private_key));

    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["type"], "imported");
    assert_eq!(json["address"], created.address.as_str());
    assert_eq!(json["publicKey"], created.public_key.as_str());
    assert!(json["lastUnlockedOn"].is_null());

    let blob: serde_json::Value =
        serde_json::from_str(json["encrypted"].as_str().unwrap()).unwrap();
    assert_eq!(blob["iterations"], TEST_ITERATIONS);
    for field in ["data", "iv", "salt"] {
        assert!(blob[field].is_string(), "blob is missing {field}");
    }
}

#[tokio::test]
async fn test_wrong_password_leaves_account_locked() {
    let env = TestEnv::new();
    let registry = AccountRegistry::from_config(&env.config).unwrap();
    let created = registry.create_imported(exported(3), &pw("p1")).await.unwrap();
    let account = registry.get(&created.id).await.unwrap();

    assert!(matches!(
        account.unlock(&pw("p2")).await,
        Err(AccountError::WrongPassword)
    ));
    assert!(account.is_locked().await);
    assert!(registry.sessions().is_empty().await);
    assert!(account
        .to_display_serialized()
        .await
        .unwrap()
        .last_unlocked_on
        .is_none());
}

#[tokio::test]
async fn test_remove_while_unlocked() {
    let env = TestEnv::new();
    let registry = AccountRegistry::from_config(&env.config).unwrap();
    let mut events = registry.subscribe();

    let created = registry.create_imported(exported(4), &pw("p1")).await.unwrap();
    registry
        .get(&created.id)
        .await
        .unwrap()
        .unlock(&pw("p1"))
        .await
        .unwrap();

    registry.remove(&created.id).await.unwrap();

    assert!(registry.sessions().is_empty().await);
    assert!(!env
        .accounts_dir()
        .join(format!("{}.json", created.id))
        .exists());
    assert!(registry.list().await.unwrap().is_empty());

    assert!(matches!(events.recv().await.unwrap(), AccountEvent::Unlocked { .. }));
    assert_eq!(
        events.recv().await.unwrap(),
        AccountEvent::Removed { id: created.id }
    );
}

#[tokio::test]
async fn test_concurrent_unlocks_leave_winner_key() {
    let env = TestEnv::new();
    let registry = AccountRegistry::from_config(&env.config).unwrap();
    let created = registry.create_imported(exported(5), &pw("right")).await.unwrap();

    let mut handles = Vec::new();
    for attempt in ["wrong-1", "right", "wrong-2", "right"] {
        let registry = registry.clone();
        let id = created.id.clone();
        handles.push(tokio::spawn(async move {
            let account = registry.get(&id).await.unwrap();
            account.unlock(&SecretString::new(attempt)).await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(AccountError::WrongPassword) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(ok, 2);
    assert_eq!(registry.sessions().len().await, 1);

    let account = registry.get(&created.id).await.unwrap();
    let signature = account.sign_data(b"race").await.unwrap();
    assert!(codec::verify_serialized_signature(
        b"race",
        &signature,
        &created.public_key
    ));
}

#[tokio::test]
async fn test_auto_lock_expires_session() {
    let env = TestEnv::new();
    let store = Arc::new(FileAccountStore::from_config(&env.config).unwrap());
    let registry = AccountRegistry::new(
        store.clone(),
        Arc::new(EphemeralStore::new(Some(Duration::from_secs(5 * 60)))),
        CipherParams {
            iterations: TEST_ITERATIONS,
        },
    );
    let created = registry.create_imported(exported(6), &pw("p1")).await.unwrap();
    let account = registry.get(&created.id).await.unwrap();
    account.unlock(&pw("p1")).await.unwrap();

    tokio::time::pause();
    tokio::time::advance(Duration::from_secs(4 * 60)).await;
    assert!(account.sign_data(b"early").await.is_ok());

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(account.is_locked().await);
    assert!(matches!(
        account.sign_data(b"late").await,
        Err(AccountError::AccountLocked(_))
    ));

    // Expiry only affects the session; the record is untouched.
    let record = store.load(&created.id).await.unwrap();
    assert!(record.last_unlocked_on.is_some());
}

#[tokio::test]
async fn test_lock_all_then_reunlock() {
    let env = TestEnv::new();
    let registry = AccountRegistry::from_config(&env.config).unwrap();

    let mut ids = Vec::new();
    for seed in [7, 8] {
        let created = registry.create_imported(exported(seed), &pw("p")).await.unwrap();
        registry.get(&created.id).await.unwrap().unlock(&pw("p")).await.unwrap();
        ids.push(created.id);
    }
    ids.sort();

    assert_eq!(registry.lock_all().await, ids);
    assert!(registry.sessions().is_empty().await);

    let account = registry.get(&ids[0]).await.unwrap();
    account.unlock(&pw("p")).await.unwrap();
    assert!(account.sign_data(b"again").await.is_ok());
}
