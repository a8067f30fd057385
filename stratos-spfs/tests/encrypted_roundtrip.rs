//! Encrypting client against a mock gateway.

use std::sync::Arc;

use stratos_ipfs::testing::{init_test_tracing, MockGateway};
use stratos_spfs::{AddOptions, CatOptions, EncryptionKey, IpfsError, SpfsClient, SpfsError};

async fn setup() -> (MockGateway, SpfsClient) {
    init_test_tracing();
    let gateway = MockGateway::start().await.unwrap();
    let client = SpfsClient::new(gateway.config()).unwrap();
    (gateway, client)
}

#[tokio::test]
async fn hello_world_without_encryption() {
    let (gateway, client) = setup().await;

    let descriptor = client
        .add(b"hello world".to_vec(), AddOptions::new().filename("greeting.txt"))
        .await
        .unwrap();
    assert_eq!(gateway.stored(descriptor.cid()).unwrap(), b"hello world");

    let content = client.cat(descriptor.cid(), CatOptions::new()).await.unwrap();
    assert_eq!(content, b"hello world");
}

#[tokio::test]
async fn encrypted_round_trip_hides_plaintext_from_gateway() {
    let (gateway, client) = setup().await;
    let key = EncryptionKey::from_bytes([0x42; 32]);

    let descriptor = client
        .add(b"test data".to_vec(), AddOptions::new().filename("test").encryption_key(&key))
        .await
        .unwrap();

    let stored = gateway.stored(descriptor.cid()).unwrap();
    assert_ne!(stored, b"test data");
    assert!(!stored.windows(9).any(|w| w == b"test data"));

    let uploads = gateway.uploads();
    assert_eq!(uploads[0].filename.as_deref(), Some("test"));
    assert_eq!(uploads[0].size, stored.len());

    let content = client
        .cat(descriptor.cid(), CatOptions::new().encryption_key(&key))
        .await
        .unwrap();
    assert_eq!(content, b"test data");
}

#[tokio::test]
async fn different_key_raises_decryption_error() {
    let (_gateway, client) = setup().await;
    let k1 = EncryptionKey::from_bytes([1; 32]);
    let k2 = EncryptionKey::from_bytes([2; 32]);

    let descriptor = client
        .add(b"secret".to_vec(), AddOptions::new().encryption_key(&k1))
        .await
        .unwrap();

    let err = client
        .cat(descriptor.cid(), CatOptions::new().encryption_key(&k2))
        .await
        .unwrap_err();
    assert!(matches!(err, SpfsError::Decryption(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn no_key_on_encrypted_content_returns_ciphertext() {
    let (gateway, client) = setup().await;
    let key = EncryptionKey::from_bytes([9; 32]);

    let descriptor = client
        .add(b"payload".to_vec(), AddOptions::new().encryption_key(&key))
        .await
        .unwrap();

    let raw = client.cat(descriptor.cid(), CatOptions::new()).await.unwrap();
    assert_ne!(raw, b"payload");
    assert_eq!(raw, gateway.stored(descriptor.cid()).unwrap());
}

#[tokio::test]
async fn one_client_mixes_encrypted_and_plain_content() {
    let (_gateway, client) = setup().await;
    let key = EncryptionKey::from_base64url(&EncryptionKey::from_bytes([5; 32]).to_base64url())
        .unwrap();

    let plain = client
        .add(b"public".to_vec(), AddOptions::new())
        .await
        .unwrap();
    let sealed = client
        .add(b"private".to_vec(), AddOptions::new().encryption_key(&key))
        .await
        .unwrap();

    assert_eq!(
        client.cat(plain.cid(), CatOptions::new()).await.unwrap(),
        b"public"
    );
    assert_eq!(
        client
            .cat(sealed.cid(), CatOptions::new().encryption_key(&key))
            .await
            .unwrap(),
        b"private"
    );
}

#[tokio::test]
async fn filename_does_not_affect_content() {
    let (_gateway, client) = setup().await;

    for name in ["a", "b"] {
        let descriptor = client
            .add(b"same".to_vec(), AddOptions::new().filename(name))
            .await
            .unwrap();
        let content = client.cat(descriptor.cid(), CatOptions::new()).await.unwrap();
        assert_eq!(content, b"same");
    }
}

#[tokio::test]
async fn gateway_failures_are_not_decryption_failures() {
    let (gateway, client) = setup().await;
    let key = EncryptionKey::from_bytes([4; 32]);
    gateway.fail_with(502, "bad gateway");

    let err = client
        .cat("QmWhatever", CatOptions::new().encryption_key(&key))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SpfsError::Gateway(IpfsError::GatewayRequest { status: 502, .. })
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn close_twice_keeps_earlier_results() {
    let (_gateway, client) = setup().await;
    let key = EncryptionKey::from_bytes([8; 32]);

    let descriptor = client
        .add(b"kept".to_vec(), AddOptions::new().encryption_key(&key))
        .await
        .unwrap();
    let content = client
        .cat(descriptor.cid(), CatOptions::new().encryption_key(&key))
        .await
        .unwrap();

    client.close().await;
    client.close().await;

    assert_eq!(content, b"kept");
    assert!(client.inner().is_closed());
}

#[tokio::test]
async fn scope_releases_client_on_decryption_error() {
    init_test_tracing();
    let gateway = MockGateway::start().await.unwrap();
    let k1 = EncryptionKey::from_bytes([1; 32]);
    let k2 = EncryptionKey::from_bytes([2; 32]);

    let mut leaked = None;
    let result: Result<Vec<u8>, SpfsError> = SpfsClient::scope(gateway.config(), |client| {
        leaked = Some(Arc::clone(&client));
        async move {
            let descriptor = client
                .add(b"secret".to_vec(), AddOptions::new().encryption_key(&k1))
                .await?;
            client
                .cat(descriptor.cid(), CatOptions::new().encryption_key(&k2))
                .await
        }
    })
    .await;

    assert!(matches!(result, Err(SpfsError::Decryption(_))));
    assert!(leaked.unwrap().inner().is_closed());
}

#[tokio::test]
async fn concurrent_encrypted_calls() {
    let (_gateway, client) = setup().await;
    let client = Arc::new(client);

    let mut handles = Vec::new();
    for i in 0..16u8 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            let key = EncryptionKey::from_bytes([i; 32]);
            let payload = vec![i; 1024];
            let descriptor = client
                .add(payload.clone(), AddOptions::new().encryption_key(&key))
                .await
                .unwrap();
            let content = client
                .cat(descriptor.cid(), CatOptions::new().encryption_key(&key))
                .await
                .unwrap();
            assert_eq!(content, payload);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}
