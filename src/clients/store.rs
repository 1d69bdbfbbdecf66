use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{debug, info};

use crate::{
    clients::KeyValueStore,
    config::Config,
    error::AppError,
    models::item::{FieldDiff, IndexQuery, Item, ScanFilter, item_id},
};

/// Each table is one Redis hash: field = item id, value = item JSON.
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        info!("Connecting to Redis store");

        let client = Client::open(config.redis_url.as_str())
            .map_err(|_| anyhow!("Failed to create redis client"))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|_| anyhow!("Failed to connect to redis client"))?;

        info!("Redis store connection established");

        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }

    fn table_key(table: &str) -> String {
        format!("table:{}", table)
    }

    fn decode(raw: &str) -> Result<Item, AppError> {
        Ok(serde_json::from_str::<Item>(raw)?)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, table: &str, id: &str) -> Result<Option<Item>, AppError> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn.hget(Self::table_key(table), id).await?;

        raw.as_deref().map(Self::decode).transpose()
    }

    async fn put(&self, table: &str, item: Item) -> Result<(), AppError> {
        let id = item_id(&item)
            .ok_or_else(|| AppError::Validation("Item is missing an id".to_string()))?
            .to_string();
        let payload = serde_json::to_string(&item)?;

        let mut conn = self.connection.clone();
        conn.hset::<_, _, _, ()>(Self::table_key(table), &id, payload)
            .await?;

        debug!(table, id = %id, "Item stored");
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        diff: &FieldDiff,
    ) -> Result<Option<Item>, AppError> {
        // Read-modify-write; concurrent updates to one item are last-writer-wins.
        let Some(mut item) = self.get(table, id).await? else {
            return Ok(None);
        };

        diff.apply(&mut item);
        self.put(table, item.clone()).await?;

        debug!(table, id, fields = diff.len(), "Item updated");
        Ok(Some(item))
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), AppError> {
        let mut conn = self.connection.clone();
        conn.hdel::<_, _, ()>(Self::table_key(table), id).await?;

        debug!(table, id, "Item deleted");
        Ok(())
    }

    async fn scan(&self, table: &str, filter: Option<&ScanFilter>) -> Result<Vec<Item>, AppError> {
        let mut conn = self.connection.clone();
        let values: Vec<String> = conn.hvals(Self::table_key(table)).await?;

        let mut items = Vec::with_capacity(values.len());
        for raw in &values {
            let item = Self::decode(raw)?;
            if filter.is_none_or(|f| f.matches(&item)) {
                items.push(item);
            }
        }

        Ok(items)
    }

    async fn query(&self, table: &str, query: &IndexQuery) -> Result<Vec<Item>, AppError> {
        debug!(table, index = %query.index_name, field = %query.condition.field, "Querying index");

        self.scan(table, Some(&query.condition)).await
    }
}
