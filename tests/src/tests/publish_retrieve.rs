use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::StatusCode;
use serde_json::Value;

use kestrel_core::chain::DaMessage;
use kestrel_core::da::{double_hash, hash};
use kestrel_tests::nodes::{TestNode, DEFAULT_PARAMS, PUBLISHER};

fn blob() -> Vec<u8> {
    (0u8..24).collect()
}

async fn publish_ok(node: &TestNode, blob: &[u8], protocol: &str) -> String {
    let response = node.publish(blob, 4, 2, protocol).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(!body["tx_hash"].as_str().unwrap().is_empty());
    body["metadata_uri"].as_str().unwrap().to_owned()
}

async fn blob_of(node: &TestNode, metadata_uri: &str) -> Vec<u8> {
    let response = node.get_blob(metadata_uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    STANDARD.decode(body["blob"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn publish_and_retrieve_roundtrip() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let blob = blob();

    let metadata_uri = publish_ok(&node, &blob, "ipfs").await;
    assert!(metadata_uri.starts_with("ipfs://"));

    let metadata = node.store.fetch_metadata(&metadata_uri).await.unwrap();
    assert_eq!(metadata.shard_size, 6);
    assert_eq!(metadata.shard_uris.len(), 6);
    assert_eq!(metadata.parity_shard_count, 2);

    let broadcasts = node.chain.broadcasts();
    let [DaMessage::PublishData {
        sender,
        metadata_uri: published_uri,
        parity_shard_count,
        shard_double_hashes,
        ..
    }] = broadcasts.as_slice()
    else {
        panic!("expected exactly one publish message, got {broadcasts:?}");
    };
    assert_eq!(sender, PUBLISHER);
    assert_eq!(published_uri, &metadata_uri);
    assert_eq!(*parity_shard_count, 2);

    // The first data shard holds the first `shard_size` bytes of the blob.
    assert_eq!(shard_double_hashes[0], double_hash(&blob[..6]));
    let shards = node
        .store
        .fetch_shards(
            &metadata.shard_uris,
            &[0, 1, 2, 3, 4, 5],
            kestrel_da_storage::FailurePolicy::Abort,
        )
        .await
        .unwrap();
    for (index, shard) in shards {
        assert_eq!(shard_double_hashes[index], double_hash(&shard));
    }

    assert_eq!(blob_of(&node, &metadata_uri).await, blob);
}

#[tokio::test]
async fn retrieve_survives_parity_many_losses() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let blob = blob();
    let metadata_uri = publish_ok(&node, &blob, "arweave").await;
    assert!(metadata_uri.starts_with("ar://"));

    let metadata = node.store.fetch_metadata(&metadata_uri).await.unwrap();
    assert!(node.arweave.remove(&metadata.shard_uris[0]));
    assert!(node.arweave.corrupt(&metadata.shard_uris[3]));
    assert_eq!(blob_of(&node, &metadata_uri).await, blob);

    assert!(node.arweave.remove(&metadata.shard_uris[5]));
    let response = node.get_blob(&metadata_uri).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().await.unwrap().contains("Not enough shards"));
}

#[tokio::test]
async fn unknown_protocol_touches_nothing() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;

    let response = node.publish(&blob(), 4, 2, "filecoin").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(node.chain.broadcasts().is_empty());
    assert_eq!(node.ipfs.store_calls(), 0);
    assert_eq!(node.arweave.store_calls(), 0);
}

#[tokio::test]
async fn shard_bounds_are_enforced() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;

    let too_many = node.publish(&blob(), 12, 6, "ipfs").await;
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);

    let too_large = node.publish(&[1; 4097], 4, 2, "ipfs").await;
    assert_eq!(too_large.status(), StatusCode::BAD_REQUEST);

    let no_data = node.publish(&blob(), 0, 2, "ipfs").await;
    assert_eq!(no_data.status(), StatusCode::BAD_REQUEST);

    let overflowing = node.publish(&blob(), 2, usize::MAX, "ipfs").await;
    assert_eq!(overflowing.status(), StatusCode::BAD_REQUEST);

    assert!(node.chain.broadcasts().is_empty());
    assert_eq!(node.ipfs.store_calls(), 0);
}

#[tokio::test]
async fn shard_hashes_follow_request_order() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let blob = blob();
    let metadata_uri = publish_ok(&node, &blob, "ipfs").await;

    let response = node.shard_hashes(&metadata_uri, "3,0,x,9", "single").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["shard_size"], 6);
    assert_eq!(body["shard_uris"].as_array().unwrap().len(), 6);

    let hashes: Vec<Vec<u8>> = body["shard_hashes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hash| STANDARD.decode(hash.as_str().unwrap()).unwrap())
        .collect();
    assert_eq!(hashes, vec![hash(&blob[18..24]).to_vec(), hash(&blob[..6]).to_vec()]);

    let response = node.shard_hashes(&metadata_uri, "1", "double").await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        STANDARD
            .decode(body["shard_hashes"][0].as_str().unwrap())
            .unwrap(),
        double_hash(&blob[6..12]).to_vec()
    );
}

#[tokio::test]
async fn missing_metadata_is_not_found() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let response = node.get_blob("ipfs://bafynothinghere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = node.get_blob("gopher://host/1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zero_parity_roundtrip() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let blob = blob();

    let response = node.publish(&blob, 4, 0, "ipfs").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let metadata_uri = body["metadata_uri"].as_str().unwrap();

    assert_eq!(node.ipfs.store_calls(), 5);
    assert_eq!(blob_of(&node, metadata_uri).await, blob);
}

#[tokio::test]
async fn file_upload_publishes_like_json() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let file = b"genesis.json contents, uploaded as a form".to_vec();

    let response = node.publish_file("genesis.json", &file, 3, 2, "arweave").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let metadata_uri = body["metadata_uri"].as_str().unwrap();
    assert!(metadata_uri.starts_with("ar://"));
    assert_eq!(blob_of(&node, metadata_uri).await, file);

    let response = node.publish_file("genesis.json", &file, 3, 2, "ftp").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = node.publish_file("genesis.json", &file, 12, 6, "ipfs").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(node.chain.broadcasts().len(), 1);
}
