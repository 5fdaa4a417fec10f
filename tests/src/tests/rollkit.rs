use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::StatusCode;
use serde_json::Value;

use kestrel_core::chain::DaMessage;
use kestrel_tests::nodes::{TestNode, DEFAULT_PARAMS};

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item.as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn submit_then_get_by_id() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let blobs = vec![b"rollkit block 17".to_vec(), vec![0x5a; 200]];

    let response = node.rollkit_submit(&blobs).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let ids = strings(&body["ids"]);
    assert_eq!(ids.len(), 2);
    for id in &ids {
        let uri = String::from_utf8(STANDARD.decode(id).unwrap()).unwrap();
        assert!(uri.starts_with("ipfs://"));
    }
    assert!(node
        .chain
        .broadcasts()
        .iter()
        .all(|message| matches!(message, DaMessage::PublishData { .. })));

    let response = node.rollkit_get(&ids).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let fetched: Vec<Vec<u8>> = strings(&body["blobs"])
        .iter()
        .map(|blob| STANDARD.decode(blob).unwrap())
        .collect();
    assert_eq!(fetched, blobs);
}

#[tokio::test]
async fn max_blob_size_is_advertised() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let response = node.rollkit_max_blob_size().await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["max_blob_size"], 2_048_000);
}

#[tokio::test]
async fn bad_ids_are_rejected() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;

    let response = node.rollkit_get(&["not base64!".to_owned()]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown = STANDARD.encode("ipfs://bafyunknownblob");
    let response = node.rollkit_get(&[unknown]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
