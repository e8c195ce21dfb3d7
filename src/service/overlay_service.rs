//! Overlay service: the topic manager and lookup service behind one facade.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::indexer::RecordIndexer;
use super::query_engine::{LookupQuery, QueryEngine};
use crate::admission::{AdmissionDecider, AdmittanceInstructions};
use crate::codec::FieldDecoder;
use crate::config::ProtocolConfig;
use crate::domain::{Outpoint, TransactionOutput};
use crate::error::OverlayError;
use crate::storage::RecordStore;

/// Name and description an overlay host shows for a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    /// Configured identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub short_description: String,
}

/// Metadata for both overlay components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverlayMetadata {
    /// Topic manager metadata.
    pub topic_manager: ServiceMetadata,
    /// Lookup service metadata.
    pub lookup_service: ServiceMetadata,
}

/// Markdown documentation for both overlay components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverlayDocumentation {
    /// Record layouts and admission rules.
    pub topic_manager: String,
    /// Supported queries and their parameters.
    pub lookup_service: String,
}

const TOPIC_MANAGER_DOCS: &str = include_str!("docs/topic_manager.md");
const LOOKUP_SERVICE_DOCS: &str = include_str!("docs/lookup_service.md");

/// Coordinates admission, indexing and lookups.
///
/// Stateless apart from the record store it was built over; cheap to clone.
#[derive(Debug, Clone)]
pub struct OverlayService {
    config: Arc<ProtocolConfig>,
    decider: AdmissionDecider,
    indexer: RecordIndexer,
    queries: QueryEngine,
}

impl OverlayService {
    /// Wires the service from a policy, a field decoder and a record store.
    #[must_use]
    pub fn new(
        config: Arc<ProtocolConfig>,
        decoder: Arc<dyn FieldDecoder>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            decider: AdmissionDecider::new(Arc::clone(&config), decoder),
            indexer: RecordIndexer::new(Arc::clone(&store)),
            queries: QueryEngine::new(store),
            config,
        }
    }

    /// The admission and lookup policy.
    #[must_use]
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Admission decision for `outputs` at the current time. Pure; nothing
    /// is indexed.
    #[must_use]
    pub fn identify_admissible_outputs(
        &self,
        outputs: &[TransactionOutput],
    ) -> AdmittanceInstructions {
        self.decider
            .identify_admissible_outputs(outputs, Utc::now().timestamp_millis())
    }

    /// Admits the outputs of transaction `txid` and indexes every admitted
    /// record.
    ///
    /// Every admitted output is attempted even after a failure. An output
    /// already indexed at the same outpoint counts as indexed, so a retry
    /// after a partial failure completes the remaining outputs.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::PersistenceError`] naming every outpoint that
    /// could not be indexed. Outputs indexed in the same call stay indexed.
    pub async fn submit_transaction(
        &self,
        txid: &str,
        outputs: &[TransactionOutput],
    ) -> Result<AdmittanceInstructions, OverlayError> {
        let admitted = self
            .decider
            .admissible_records(outputs, Utc::now().timestamp_millis());

        let mut outputs_to_admit = Vec::with_capacity(admitted.len());
        let mut failed = Vec::new();
        for (output_index, record) in admitted {
            let outpoint = Outpoint::new(txid, output_index);
            match self.indexer.insert(outpoint.clone(), record).await {
                Ok(()) => outputs_to_admit.push(output_index),
                Err(OverlayError::DuplicateOutpoint(_)) => {
                    tracing::debug!(%outpoint, "output already indexed");
                    outputs_to_admit.push(output_index);
                }
                Err(error) => {
                    tracing::warn!(%outpoint, %error, "failed to index admitted output");
                    failed.push(outpoint);
                }
            }
        }

        if !failed.is_empty() {
            let outpoints: Vec<String> = failed.iter().map(ToString::to_string).collect();
            return Err(OverlayError::PersistenceError(format!(
                "failed to index {}",
                outpoints.join(", ")
            )));
        }

        tracing::info!(
            txid,
            admitted = outputs_to_admit.len(),
            outputs = outputs.len(),
            "transaction submitted"
        );
        Ok(AdmittanceInstructions {
            outputs_to_admit,
            coins_to_retain: Vec::new(),
        })
    }

    /// Indexes an output the host admitted under `topic`.
    ///
    /// Outputs for other topics and outputs of other protocols are ignored;
    /// returns whether a record was indexed.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::MalformedOutput`] if the script does not
    /// project into a record, or a storage error from the indexer.
    pub async fn output_admitted(
        &self,
        topic: &str,
        outpoint: Outpoint,
        locking_script: &[u8],
    ) -> Result<bool, OverlayError> {
        if topic != self.config.topic_manager {
            tracing::debug!(topic, %outpoint, "ignoring output admitted for another topic");
            return Ok(false);
        }
        let record = match self.decider.project(locking_script) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(false),
            Err(reason) => {
                return Err(OverlayError::MalformedOutput {
                    outpoint,
                    reason: reason.to_string(),
                });
            }
        };
        self.indexer.insert(outpoint, record).await?;
        Ok(true)
    }

    /// Handles a spend notification. Returns how many records were removed.
    pub async fn output_spent(&self, topic: &str, outpoint: &Outpoint) -> u64 {
        if topic != self.config.topic_manager {
            tracing::debug!(topic, %outpoint, "ignoring spend for another topic");
            return 0;
        }
        self.indexer.delete(outpoint).await
    }

    /// Handles an eviction. Returns how many records were removed.
    pub async fn output_evicted(&self, outpoint: &Outpoint) -> u64 {
        self.indexer.delete(outpoint).await
    }

    /// Answers a lookup addressed to `service`.
    ///
    /// # Errors
    ///
    /// - [`OverlayError::UnsupportedService`] if `service` is not this lookup
    ///   service
    /// - any error from [`LookupQuery::parse`] or the store
    pub async fn lookup(
        &self,
        service: &str,
        query: &str,
        parameter: Option<&Value>,
    ) -> Result<Vec<Outpoint>, OverlayError> {
        if service != self.config.lookup_service {
            return Err(OverlayError::UnsupportedService(service.to_string()));
        }
        let query = LookupQuery::parse(query, parameter)?;
        let outpoints = self.queries.execute(&query).await?;
        tracing::debug!(?query, results = outpoints.len(), "lookup answered");
        Ok(outpoints)
    }

    /// Topic manager and lookup service metadata.
    #[must_use]
    pub fn metadata(&self) -> OverlayMetadata {
        OverlayMetadata {
            topic_manager: ServiceMetadata {
                id: self.config.topic_manager.clone(),
                name: "Forum Topic Manager".to_string(),
                short_description: "Admit forum topics, posts, replies and paid reactions"
                    .to_string(),
            },
            lookup_service: ServiceMetadata {
                id: self.config.lookup_service.clone(),
                name: "Forum Lookup Service".to_string(),
                short_description: "Find forum records on-chain".to_string(),
            },
        }
    }

    /// Topic manager and lookup service documentation.
    #[must_use]
    pub fn documentation(&self) -> OverlayDocumentation {
        OverlayDocumentation {
            topic_manager: TOPIC_MANAGER_DOCS.to_string(),
            lookup_service: LOOKUP_SERVICE_DOCS.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::admission::validator::tests::{fields, post_fields, reaction_fields, topic_fields};
    use crate::admission::PayoutVerifier;
    use crate::codec::{PushDropDecoder, encode_push_drop};
    use crate::domain::{IndexedRecord, Record};
    use crate::storage::{Collection, MemoryRecordStore, RecordFilter};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    const LOCK_KEY: [u8; 33] = [3u8; 33];

    fn service() -> OverlayService {
        OverlayService::new(
            Arc::new(ProtocolConfig::default()),
            Arc::new(PushDropDecoder::new()),
            Arc::new(MemoryRecordStore::new()),
        )
    }

    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn output(fields: &[Vec<u8>]) -> TransactionOutput {
        TransactionOutput::new(1, encode_push_drop(&LOCK_KEY, fields))
    }

    fn paid_reaction(post_txid: &str) -> Vec<TransactionOutput> {
        let fields = reaction_fields(post_txid, "🔥");
        let validator = crate::admission::RecordValidator::new(Arc::new(ProtocolConfig::default()));
        let Ok(Some(Record::Reaction(reaction))) = validator.project(&fields) else {
            panic!("reaction should project");
        };
        let verifier = PayoutVerifier::new(Arc::new(ProtocolConfig::default()));
        let Ok(script) = verifier.expected_script(&reaction) else {
            panic!("payout script");
        };
        vec![output(&fields), TransactionOutput::new(2_500, script)]
    }

    /// Store that fails the first insert at `fail_at`, then recovers.
    #[derive(Debug)]
    struct FailOnceStore {
        inner: MemoryRecordStore,
        fail_at: Outpoint,
        failed: AtomicBool,
    }

    #[async_trait::async_trait]
    impl RecordStore for FailOnceStore {
        async fn insert(&self, record: &IndexedRecord) -> Result<(), OverlayError> {
            if record.outpoint == self.fail_at && !self.failed.swap(true, Ordering::SeqCst) {
                return Err(OverlayError::PersistenceError("transient".to_string()));
            }
            self.inner.insert(record).await
        }

        async fn delete(
            &self,
            collection: Collection,
            outpoint: &Outpoint,
        ) -> Result<u64, OverlayError> {
            self.inner.delete(collection, outpoint).await
        }

        async fn find(
            &self,
            collection: Collection,
            filter: &RecordFilter,
        ) -> Result<Vec<Outpoint>, OverlayError> {
            self.inner.find(collection, filter).await
        }
    }

    async fn lookup(service: &OverlayService, query: &str, parameter: Value) -> Vec<Outpoint> {
        let Ok(found) = service.lookup("ls_testforum1", query, Some(&parameter)).await else {
            panic!("lookup {query} failed");
        };
        found
    }

    #[tokio::test]
    async fn topic_round_trip() {
        let service = service();
        let outputs = vec![output(&topic_fields("cute-cats_2", now()))];
        let Ok(instructions) = service.submit_transaction("t1", &outputs).await else {
            panic!("submit failed");
        };
        assert_eq!(instructions.outputs_to_admit, vec![0]);

        let found = lookup(&service, "getTopic", json!("cute-cats_2")).await;
        assert_eq!(found, vec![Outpoint::new("t1", 0)]);

        assert_eq!(service.output_spent("tm_testforum1", &Outpoint::new("t1", 0)).await, 1);
        assert!(lookup(&service, "getTopic", json!("cute-cats_2")).await.is_empty());
    }

    #[tokio::test]
    async fn retry_completes_partially_indexed_transaction() {
        let store = FailOnceStore {
            inner: MemoryRecordStore::new(),
            fail_at: Outpoint::new("tx", 1),
            failed: AtomicBool::new(false),
        };
        let service = OverlayService::new(
            Arc::new(ProtocolConfig::default()),
            Arc::new(PushDropDecoder::new()),
            Arc::new(store),
        );
        let outputs = vec![
            output(&topic_fields("cats", now())),
            output(&topic_fields("dogs", now())),
            output(&topic_fields("birds", now())),
        ];

        let Err(OverlayError::PersistenceError(message)) =
            service.submit_transaction("tx", &outputs).await
        else {
            panic!("first submission should report the failed output");
        };
        assert!(message.contains("tx.1"));
        assert!(!message.contains("tx.2"));
        assert_eq!(
            lookup(&service, "getTopic", json!("birds")).await,
            vec![Outpoint::new("tx", 2)]
        );
        assert!(lookup(&service, "getTopic", json!("dogs")).await.is_empty());

        let Ok(instructions) = service.submit_transaction("tx", &outputs).await else {
            panic!("retry should succeed");
        };
        assert_eq!(instructions.outputs_to_admit, vec![0, 1, 2]);
        assert_eq!(
            lookup(&service, "getTopic", json!("dogs")).await,
            vec![Outpoint::new("tx", 1)]
        );
        assert_eq!(lookup(&service, "getAllTopics", Value::Null).await.len(), 3);
    }

    #[tokio::test]
    async fn post_with_two_reactions() {
        let service = service();
        let post = vec![output(&post_fields("t1", now()))];
        assert!(service.submit_transaction("p1", &post).await.is_ok());
        assert!(service.submit_transaction("r1", &paid_reaction("p1")).await.is_ok());
        assert!(service.submit_transaction("r2", &paid_reaction("p1")).await.is_ok());

        let found = lookup(&service, "getPost", json!("p1")).await;
        assert_eq!(
            found,
            vec![
                Outpoint::new("p1", 0),
                Outpoint::new("r1", 0),
                Outpoint::new("r2", 0)
            ]
        );
    }

    #[tokio::test]
    async fn identify_does_not_index() {
        let service = service();
        let outputs = vec![output(&topic_fields("cats", now()))];
        assert_eq!(service.identify_admissible_outputs(&outputs).outputs_to_admit, vec![0]);
        assert!(lookup(&service, "getAllTopics", Value::Null).await.is_empty());
    }

    #[tokio::test]
    async fn admitted_output_projects_without_freshness() {
        let service = service();
        let script = encode_push_drop(&LOCK_KEY, &topic_fields("old-news", 1));
        let admitted = service
            .output_admitted("tm_testforum1", Outpoint::new("old", 2), &script)
            .await;
        assert!(matches!(admitted, Ok(true)));
        let found = lookup(&service, "getTopic", json!("old-news")).await;
        assert_eq!(found, vec![Outpoint::new("old", 2)]);
    }

    #[tokio::test]
    async fn admitted_output_for_other_topic_is_ignored() {
        let service = service();
        let script = encode_push_drop(&LOCK_KEY, &topic_fields("cats", now()));
        let admitted = service
            .output_admitted("tm_other", Outpoint::new("x", 0), &script)
            .await;
        assert!(matches!(admitted, Ok(false)));
        assert!(lookup(&service, "getAllTopics", Value::Null).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_admitted_output_is_reported() {
        let service = service();
        let script = encode_push_drop(&LOCK_KEY, &fields(&["topic", "Cute Cats"]));
        let admitted = service
            .output_admitted("tm_testforum1", Outpoint::new("x", 0), &script)
            .await;
        assert!(matches!(admitted, Err(OverlayError::MalformedOutput { .. })));
    }

    #[tokio::test]
    async fn eviction_of_unknown_outpoint_is_noop() {
        assert_eq!(service().output_evicted(&Outpoint::new("nope", 0)).await, 0);
    }

    #[tokio::test]
    async fn wrong_service_is_rejected() {
        let result = service().lookup("ls_other", "getAllTopics", None).await;
        assert!(matches!(result, Err(OverlayError::UnsupportedService(_))));
    }

    #[tokio::test]
    async fn unsupported_query_is_not_empty_result() {
        let result = service().lookup("ls_testforum1", "getEverything", None).await;
        assert!(matches!(result, Err(OverlayError::UnsupportedQuery(_))));
    }

    #[test]
    fn metadata_names_both_components() {
        let metadata = service().metadata();
        assert_eq!(metadata.topic_manager.id, "tm_testforum1");
        assert_eq!(metadata.lookup_service.name, "Forum Lookup Service");
    }

    #[test]
    fn documentation_covers_every_query() {
        let docs = service().documentation();
        assert!(docs.topic_manager.starts_with("# Forum Topic Manager"));
        for name in LookupQuery::NAMES {
            assert!(docs.lookup_service.contains(name), "{name} undocumented");
        }
    }
}
