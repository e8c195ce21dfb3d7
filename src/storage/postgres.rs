//! PostgreSQL implementation of the record store.

use sqlx::PgPool;

use super::{Collection, RecordFilter, RecordStore};
use crate::domain::{IndexedRecord, Outpoint, Record};
use crate::error::OverlayError;

/// PostgreSQL-backed record store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`OverlayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), OverlayError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| OverlayError::PersistenceError(e.to_string()))
    }
}

const fn table(collection: Collection) -> &'static str {
    match collection {
        Collection::Topics => "forum_topics",
        Collection::Posts => "forum_posts",
        Collection::Replies => "forum_replies",
        Collection::Reactions => "forum_reactions",
    }
}

/// Column a single-value filter compares against, `None` for `All` and
/// `Outpoint`.
fn filter_column(filter: &RecordFilter, collection: Collection) -> Option<&'static str> {
    match (filter, collection) {
        (RecordFilter::OwnTxid(_), _) => Some("txid"),
        (RecordFilter::TopicTitle(_), _) => Some("title"),
        (RecordFilter::TopicTxid(_), _) => Some("topic_txid"),
        (RecordFilter::ParentPostTxid(_), Collection::Replies) => Some("post_txid"),
        (RecordFilter::ParentPostTxid(_), _) => Some("parent_post_txid"),
        (RecordFilter::RecipientKey(_), _) => Some("recipient_key"),
        (RecordFilter::All | RecordFilter::Outpoint(_), _) => None,
    }
}

fn map_insert_error(err: sqlx::Error, outpoint: &Outpoint) -> OverlayError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            OverlayError::DuplicateOutpoint(outpoint.clone())
        }
        _ => OverlayError::PersistenceError(err.to_string()),
    }
}

fn to_outpoint((txid, output_index): (String, i64)) -> Result<Outpoint, OverlayError> {
    let output_index = u32::try_from(output_index).map_err(|_| {
        OverlayError::PersistenceError(format!("stored output index {output_index} out of range"))
    })?;
    Ok(Outpoint { txid, output_index })
}

#[async_trait::async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert(&self, indexed: &IndexedRecord) -> Result<(), OverlayError> {
        let outpoint = &indexed.outpoint;
        let output_index = i64::from(outpoint.output_index);

        let query = match &indexed.record {
            Record::Topic(topic) => sqlx::query(
                "INSERT INTO forum_topics \
                 (txid, output_index, title, description, created_at, created_by, admitted_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(&outpoint.txid)
            .bind(output_index)
            .bind(&topic.title)
            .bind(&topic.description)
            .bind(topic.created_at)
            .bind(&topic.created_by)
            .bind(indexed.admitted_at),
            Record::Post(post) => sqlx::query(
                "INSERT INTO forum_posts \
                 (txid, output_index, topic_txid, title, media_url, body, created_at, created_by, \
                  tags, pre_edit_txid, admitted_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(&outpoint.txid)
            .bind(output_index)
            .bind(&post.topic_txid)
            .bind(&post.title)
            .bind(&post.media_url)
            .bind(&post.body)
            .bind(post.created_at)
            .bind(&post.created_by)
            .bind(&post.tags)
            .bind(&post.pre_edit_txid)
            .bind(indexed.admitted_at),
            Record::Reply(reply) => sqlx::query(
                "INSERT INTO forum_replies \
                 (txid, output_index, post_txid, parent_reply_txid, media_url, body, created_at, \
                  created_by, pre_edit_txid, admitted_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(&outpoint.txid)
            .bind(output_index)
            .bind(&reply.post_txid)
            .bind(&reply.parent_reply_txid)
            .bind(&reply.media_url)
            .bind(&reply.body)
            .bind(reply.created_at)
            .bind(&reply.created_by)
            .bind(&reply.pre_edit_txid)
            .bind(indexed.admitted_at),
            Record::Reaction(reaction) => sqlx::query(
                "INSERT INTO forum_reactions \
                 (txid, output_index, topic_txid, parent_post_txid, direct_parent_txid, emoji, \
                  created_by, recipient_key, derivation_prefix, derivation_suffix, payout_sats, \
                  admitted_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(&outpoint.txid)
            .bind(output_index)
            .bind(&reaction.topic_txid)
            .bind(&reaction.parent_post_txid)
            .bind(&reaction.direct_parent_txid)
            .bind(&reaction.emoji)
            .bind(&reaction.created_by)
            .bind(&reaction.recipient_key)
            .bind(&reaction.derivation_prefix)
            .bind(&reaction.derivation_suffix)
            .bind(i64::try_from(reaction.payout_sats).unwrap_or(i64::MAX))
            .bind(indexed.admitted_at),
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO forum_outpoints (txid, output_index) VALUES ($1, $2)")
            .bind(&outpoint.txid)
            .bind(output_index)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_insert_error(e, outpoint))?;
        query
            .execute(&mut *tx)
            .await
            .map_err(|e| map_insert_error(e, outpoint))?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(
        &self,
        collection: Collection,
        outpoint: &Outpoint,
    ) -> Result<u64, OverlayError> {
        let output_index = i64::from(outpoint.output_index);
        let sql = format!(
            "DELETE FROM {} WHERE txid = $1 AND output_index = $2",
            table(collection)
        );
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query(&sql)
            .bind(&outpoint.txid)
            .bind(output_index)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if removed > 0 {
            sqlx::query("DELETE FROM forum_outpoints WHERE txid = $1 AND output_index = $2")
                .bind(&outpoint.txid)
                .bind(output_index)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(removed)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> Result<Vec<Outpoint>, OverlayError> {
        if !filter.applies_to(collection) {
            return Err(filter.unsupported(collection));
        }
        let table = table(collection);

        let rows = match filter {
            RecordFilter::All => {
                let sql = format!("SELECT txid, output_index FROM {table} ORDER BY seq ASC");
                sqlx::query_as::<_, (String, i64)>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
            RecordFilter::Outpoint(outpoint) => {
                let sql = format!(
                    "SELECT txid, output_index FROM {table} \
                     WHERE txid = $1 AND output_index = $2 ORDER BY seq ASC"
                );
                sqlx::query_as::<_, (String, i64)>(&sql)
                    .bind(&outpoint.txid)
                    .bind(i64::from(outpoint.output_index))
                    .fetch_all(&self.pool)
                    .await?
            }
            RecordFilter::OwnTxid(value)
            | RecordFilter::TopicTitle(value)
            | RecordFilter::TopicTxid(value)
            | RecordFilter::ParentPostTxid(value)
            | RecordFilter::RecipientKey(value) => {
                let column = filter_column(filter, collection)
                    .ok_or_else(|| filter.unsupported(collection))?;
                let sql = format!(
                    "SELECT txid, output_index FROM {table} WHERE {column} = $1 ORDER BY seq ASC"
                );
                sqlx::query_as::<_, (String, i64)>(&sql)
                    .bind(value)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(to_outpoint).collect()
    }
}
