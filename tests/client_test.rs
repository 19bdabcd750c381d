//! Task client lifecycle against the in-process broker.

use kcenter_rs::broker::{MemoryBroker, RESULT_KEY_PREFIX, result_key};
use kcenter_rs::client::{MALFORMED_RESULT_ERROR, TaskClient};
use kcenter_rs::codec::decode_submit;
use kcenter_rs::error::Error;
use kcenter_rs::model::{TaskId, TaskStatus};
use serde_json::{Map, json};
use std::sync::Arc;
use std::time::Duration;

fn client() -> (TaskClient, MemoryBroker) {
    let broker = MemoryBroker::new();
    let client = TaskClient::new(Arc::new(broker.clone()), "celery", Duration::from_secs(3600));
    (client, broker)
}

#[test]
fn result_key_is_prefix_plus_id() {
    for raw in ["X", "abc-123", "", "4f1c2f7e-0000-4000-8000-000000000000"] {
        let id = TaskId::from(raw);
        assert_eq!(result_key(&id), format!("celery-task-meta-{raw}"));
        assert!(result_key(&id).starts_with(RESULT_KEY_PREFIX));
    }
}

#[tokio::test]
async fn submit_pushes_one_message_with_matching_id() {
    let (client, broker) = client();
    let mut kwargs = Map::new();
    kwargs.insert("text".to_string(), json!("go rust"));

    let id = client
        .submit("ai_worker.tasks.extract_keywords", kwargs)
        .await
        .unwrap();

    assert_eq!(id.as_str().len(), 36);
    assert_eq!(broker.queue_len("celery"), 1);
    let msg = decode_submit(&broker.queue_items("celery")[0]).unwrap();
    assert_eq!(msg.properties.correlation_id, id.as_str());
    assert_eq!(msg.headers.id, id.as_str());
    assert_eq!(msg.envelope().unwrap().id, id.as_str());
}

#[tokio::test]
async fn submit_prepends_to_the_queue() {
    let (client, broker) = client();
    let first = client.submit("t", Map::new()).await.unwrap();
    let second = client.submit("t", Map::new()).await.unwrap();

    let items = broker.queue_items("celery");
    assert_eq!(decode_submit(&items[0]).unwrap().headers.id, second.as_str());
    assert_eq!(decode_submit(&items[1]).unwrap().headers.id, first.as_str());
}

#[tokio::test]
async fn fetch_without_record_is_pending() {
    let (client, _) = client();
    let id = TaskId::from("missing");
    let result = client.fetch(&id).await.unwrap();
    assert_eq!(result.task_id, id);
    assert_eq!(result.status, TaskStatus::Pending);
    assert!(result.result.is_none());
    assert!(result.error.is_none());
    assert!(result.completed_at.is_none());
}

#[tokio::test]
async fn fetch_success_copies_result_and_date_done() {
    let (client, broker) = client();
    let id = TaskId::from("X");
    broker.put_result(
        &id,
        r#"{"status":"SUCCESS","result":{"summary":"s"},"date_done":"2025-12-06T10:30:00Z"}"#,
    );

    let result = client.fetch(&id).await.unwrap();
    assert_eq!(result.status, TaskStatus::Success);
    assert_eq!(result.result, Some(json!({"summary": "s"})));
    assert!(result.error.is_none());
    assert_eq!(result.completed_at.as_deref(), Some("2025-12-06T10:30:00Z"));
}

#[tokio::test]
async fn fetch_failure_maps_traceback_to_error() {
    let (client, broker) = client();
    let id = TaskId::from("X");
    broker.put_result(
        &id,
        r#"{"status":"FAILURE","result":{"exc_type":"ValueError"},"traceback":"Traceback..."}"#,
    );

    let result = client.fetch(&id).await.unwrap();
    assert_eq!(result.status, TaskStatus::Failure);
    assert_eq!(result.error.as_deref(), Some("Traceback..."));
    assert!(result.result.is_none());
}

#[tokio::test]
async fn fetch_intermediate_status_derives_nothing() {
    let (client, broker) = client();
    let id = TaskId::from("X");
    broker.put_result(&id, r#"{"status":"RETRY","traceback":"t","result":{"a":1}}"#);

    let result = client.fetch(&id).await.unwrap();
    assert_eq!(result.status, TaskStatus::Retry);
    assert!(result.result.is_none());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn fetch_unknown_status_is_verbatim() {
    let (client, broker) = client();
    let id = TaskId::from("X");
    broker.put_result(&id, r#"{"status":"PROGRESS","result":{"pct":50}}"#);

    let result = client.fetch(&id).await.unwrap();
    assert_eq!(result.status, TaskStatus::Other("PROGRESS".to_string()));
    assert!(result.result.is_none());
    assert!(result.error.is_none());
}

#[tokio::test]
async fn fetch_malformed_record_is_synthetic_failure() {
    let (client, broker) = client();
    let id = TaskId::from("X");

    for raw in ["{not json", r#"{"result":{}}"#, "[]"] {
        broker.put_result(&id, raw);
        let result = client.fetch(&id).await.unwrap();
        assert_eq!(result.status, TaskStatus::Failure);
        assert_eq!(result.error.as_deref(), Some(MALFORMED_RESULT_ERROR));
    }
}

#[tokio::test]
async fn status_matches_fetch() {
    let (client, broker) = client();
    let id = TaskId::from("X");
    assert_eq!(client.status(&id).await.unwrap(), TaskStatus::Pending);
    broker.put_result(&id, r#"{"status":"STARTED"}"#);
    assert_eq!(client.status(&id).await.unwrap(), TaskStatus::Started);
}

#[tokio::test]
async fn delete_is_idempotent_and_resets_to_pending() {
    let (client, broker) = client();
    let id = TaskId::from("X");
    broker.put_result(&id, r#"{"status":"SUCCESS","result":{}}"#);

    client.delete(&id).await.unwrap();
    client.delete(&id).await.unwrap();
    assert!(!broker.has_key(&result_key(&id)));
    assert_eq!(client.fetch(&id).await.unwrap().status, TaskStatus::Pending);
}

#[tokio::test]
async fn broker_outage_surfaces_as_unreachable() {
    let (client, broker) = client();
    broker.set_reachable(false);
    let id = TaskId::from("X");

    assert!(matches!(
        client.submit("t", Map::new()).await,
        Err(Error::Unreachable(_))
    ));
    assert!(matches!(client.fetch(&id).await, Err(Error::Unreachable(_))));
    assert!(matches!(client.delete(&id).await, Err(Error::Unreachable(_))));
    assert_eq!(broker.queue_len("celery"), 0);
}

#[tokio::test]
async fn concurrent_submits_all_land() {
    let (client, broker) = client();
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.submit("t", Map::new()).await })
        })
        .collect();

    let mut ids = std::collections::HashSet::new();
    for h in handles {
        ids.insert(h.await.unwrap().unwrap());
    }
    assert_eq!(ids.len(), 32);
    assert_eq!(broker.queue_len("celery"), 32);
}

#[test]
fn result_ttl_is_exposed() {
    let (client, _) = client();
    assert_eq!(client.result_ttl(), Duration::from_secs(3600));
    assert_eq!(client.queue(), "celery");
    assert_eq!(client.backend_name(), "memory");
}
