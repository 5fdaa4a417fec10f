use reqwest::StatusCode;

use kestrel_core::altda::{encode_commitment, GENERIC_COMMITMENT_TYPE, VERSION_BYTE};
use kestrel_tests::nodes::{TestNode, DEFAULT_PARAMS};

#[tokio::test]
async fn put_returns_a_commitment_get_resolves() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let batch = b"op batch 0001: transfers and withdrawals".to_vec();

    let response = node.put(&batch).await;
    assert_eq!(response.status(), StatusCode::OK);
    let commitment = response.bytes().await.unwrap().to_vec();
    assert_eq!(commitment[0], GENERIC_COMMITMENT_TYPE);
    assert_eq!(commitment[1], VERSION_BYTE);
    assert!(commitment[2..].starts_with(b"ipfs://"));

    let response = node.get(&commitment).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.bytes().await.unwrap().to_vec(), batch);
}

#[tokio::test]
async fn unknown_commitment_is_not_found() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let response = node.get(&encode_commitment("ipfs://bafymissing")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_commitments_are_bad_requests() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;

    let mut wrong_type = encode_commitment("ipfs://bafy");
    wrong_type[0] = 0x00;
    assert_eq!(node.get(&wrong_type).await.status(), StatusCode::BAD_REQUEST);

    assert_eq!(node.get(&[0x01]).await.status(), StatusCode::BAD_REQUEST);
}
