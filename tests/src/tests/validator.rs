use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use kestrel_core::chain::DaMessage;
use kestrel_core::proofs::mock::MockProver;
use kestrel_node::config::ValidatorSettings;
use kestrel_tests::nodes::{TestNode, DEFAULT_PARAMS, DEPUTY, VALIDATOR};
use kestrel_tests::wait_for;
use kestrel_validator::{sample_indices, AuditPolicy};

const VALIDATOR_TIMEOUT: Duration = Duration::from_secs(10);

fn settings(policy: AuditPolicy) -> ValidatorSettings {
    let mut settings = ValidatorSettings {
        address: Some(VALIDATOR.to_owned()),
        policy,
        ..ValidatorSettings::default()
    };
    settings.watcher.poll_interval = Duration::from_millis(10);
    settings.watcher.start_height = Some(0);
    settings
}

const FULL_POLICY: AuditPolicy = AuditPolicy {
    submit_challenge: true,
    submit_proof: true,
};

async fn publish(node: &TestNode, blob: &[u8]) -> String {
    let response = node.publish(blob, 4, 2, "ipfs").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["metadata_uri"].as_str().unwrap().to_owned()
}

fn audit_messages(node: &TestNode) -> Vec<DaMessage> {
    node.chain
        .broadcasts()
        .into_iter()
        .filter(|message| !matches!(message, DaMessage::PublishData { .. }))
        .collect()
}

#[tokio::test]
async fn honest_publish_gets_sampled_validity_proofs() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 3).await;
    let metadata_uri = publish(&node, &[42; 100]).await;
    node.chain.set_height(2);

    let (_task, _handle) = node
        .start_validator(MockProver::default(), settings(FULL_POLICY))
        .await;
    assert!(wait_for(VALIDATOR_TIMEOUT, || !audit_messages(&node).is_empty()).await);

    let messages = audit_messages(&node);
    let [DaMessage::SubmitValidityProof {
        sender,
        validator_address,
        metadata_uri: proved_uri,
        indices,
        proofs,
    }] = messages.as_slice()
    else {
        panic!("expected a single validity proof, got {messages:?}");
    };
    assert_eq!(sender, DEPUTY);
    assert_eq!(validator_address, VALIDATOR);
    assert_eq!(proved_uri, &metadata_uri);
    assert_eq!(indices, &sample_indices(VALIDATOR, 3, 6));
    assert_eq!(proofs.len(), 3);
}

#[tokio::test]
async fn withheld_shards_are_challenged() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 6).await;
    let metadata_uri = publish(&node, &[7; 100]).await;
    let metadata = node.store.fetch_metadata(&metadata_uri).await.unwrap();
    for uri in &metadata.shard_uris[..3] {
        assert!(node.ipfs.remove(uri));
    }
    node.chain.set_height(2);

    let (_task, _handle) = node
        .start_validator(MockProver::default(), settings(FULL_POLICY))
        .await;
    assert!(
        wait_for(VALIDATOR_TIMEOUT, || {
            audit_messages(&node)
                .iter()
                .any(|message| matches!(message, DaMessage::SubmitInvalidity { .. }))
        })
        .await
    );

    let messages = audit_messages(&node);
    assert!(messages.iter().any(|message| matches!(
        message,
        DaMessage::ChallengeForFraud { sender, metadata_uri: uri } if sender == DEPUTY && *uri == metadata_uri
    )));
    let invalid: BTreeSet<usize> = messages
        .iter()
        .find_map(|message| match message {
            DaMessage::SubmitInvalidity { indices, .. } => Some(indices.iter().copied().collect()),
            _ => None,
        })
        .unwrap();
    assert_eq!(invalid, BTreeSet::from([0, 1, 2]));
    assert!(!messages
        .iter()
        .any(|message| matches!(message, DaMessage::SubmitValidityProof { .. })));
}

#[tokio::test]
async fn detect_only_validator_stays_silent() {
    let node = TestNode::spawn(DEFAULT_PARAMS, 2).await;
    let metadata_uri = publish(&node, &[9; 64]).await;
    let metadata = node.store.fetch_metadata(&metadata_uri).await.unwrap();
    for uri in &metadata.shard_uris {
        assert!(node.ipfs.corrupt(uri));
    }
    node.chain.set_height(3);

    let (_task, handle) = node
        .start_validator(MockProver::default(), settings(AuditPolicy::default()))
        .await;
    assert!(wait_for(VALIDATOR_TIMEOUT, || handle.last_scanned_height() >= Some(2)).await);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(audit_messages(&node).is_empty());
}
