//! REST implementation of the document store

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::SessionHandle;
use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};
use crate::live::LiveClient;
use crate::store::{CollectionQuery, Document, DocumentStore, LiveQuery};

/// Client for the backend document store
///
/// One-shot reads and mutations go over REST; live queries are delegated
/// to the shared [`LiveClient`] WebSocket connection. Requests carry the
/// project API key and, when a user is signed in, their bearer token.
pub struct StoreClient {
    url: String,
    key: String,
    client: Client,
    session: SessionHandle,
    live: Arc<LiveClient>,
}

impl StoreClient {
    /// Create a new store client
    pub(crate) fn new(
        url: &str,
        key: &str,
        client: Client,
        session: SessionHandle,
        live: Arc<LiveClient>,
    ) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session,
            live,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/store/v1/{}", self.url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/store/v1/{}/{}", self.url, collection, id)
    }

    fn authorize<'a>(&self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let fetch = fetch.api_key(&self.key);
        match self.session.access_token() {
            Some(token) => fetch.bearer_auth(&token),
            None => fetch,
        }
    }

    fn query_params(query: &CollectionQuery) -> HashMap<String, String> {
        let mut params = HashMap::new();
        for filter in &query.filters {
            let value = match &filter.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            params.insert(filter.field.clone(), format!("eq.{}", value));
        }
        if let Some(sort) = &query.sort {
            params.insert(
                "order".to_string(),
                format!("{}.{}", sort.key, sort.direction.as_str()),
            );
        }
        params
    }
}

#[async_trait]
impl DocumentStore for StoreClient {
    async fn fetch(&self, query: &CollectionQuery) -> Result<Vec<Document>, Error> {
        debug!("fetch: {:?}", query);
        let url = self.collection_url(&query.collection);
        let fetch = self
            .authorize(Fetch::get(&self.client, &url))
            .query(Self::query_params(query));

        let rows = fetch.execute::<Vec<Value>>().await?;
        rows.into_iter().map(Document::from_value).collect()
    }

    async fn insert(&self, collection: &str, fields: Value) -> Result<Document, Error> {
        debug!("insert into {}", collection);
        let url = self.collection_url(collection);
        let fetch = self
            .authorize(Fetch::post(&self.client, &url))
            .json(&fields)?;

        let stored = fetch.execute::<Value>().await?;
        Document::from_value(stored)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        debug!("delete {}/{}", collection, id);
        let url = self.document_url(collection, id);
        self.authorize(Fetch::delete(&self.client, &url))
            .execute_empty()
            .await
    }

    async fn subscribe(&self, query: &CollectionQuery) -> Result<LiveQuery, Error> {
        // Forward the signed-in user's token so the live connection is
        // scoped the same way as the REST calls.
        self.live.set_auth(self.session.access_token()).await;
        self.live.subscribe(query).await
    }
}
