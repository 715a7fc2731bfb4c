use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::IgnoredAny;

use crate::appsettings::StoreSettings;
use crate::error::StoreError;
use crate::reminder::{DueReminder, RemindAt, Reminder, ReminderId};

use super::model::{InsertReminderModel, InsertedRepresentation, ReminderStorageModel};
use super::reminder_storage::ReminderStore;

const COLLECTION_PATH: &str = "/rest/v1/Reminder";

/// Reminder collection behind a PostgREST style CRUD endpoint.
pub struct RestReminderStore {
    client: Client,
    endpoint: Url,
    secret_key: String,
}

impl RestReminderStore {
    pub fn new(settings: &StoreSettings) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&format!(
            "{}{}",
            settings.url.trim_end_matches('/'),
            COLLECTION_PATH
        ))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            secret_key: settings.secret_key.clone(),
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.endpoint.clone())
            .header("apikey", &self.secret_key)
            .bearer_auth(&self.secret_key)
            .header("Prefer", "return=representation")
    }

    fn due_filter(cutoff: &RemindAt) -> [(&'static str, String); 1] {
        [("remind_date", format!("lte.{cutoff}"))]
    }

    async fn ensure_success(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status { status, body })
    }

    async fn count_representation(response: Response) -> Result<usize, StoreError> {
        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(0);
        }

        let rows: Vec<IgnoredAny> = serde_json::from_slice(&body)?;
        Ok(rows.len())
    }
}

#[async_trait]
impl ReminderStore for RestReminderStore {
    async fn insert(&self, reminder: &Reminder) -> Result<Option<ReminderId>, StoreError> {
        log::debug!("Sending POST request to create reminder");
        let response = self
            .request(Method::POST)
            .json(&InsertReminderModel::from(reminder))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(error) => {
                log::warn!("Reminder stored but its representation could not be read: {error}");
                return Ok(None);
            }
        };
        if body.is_empty() {
            return Ok(None);
        }

        match serde_json::from_slice::<InsertedRepresentation>(&body) {
            Ok(representation) => Ok(representation.id()),
            Err(error) => {
                log::warn!("Reminder stored but its representation is unexpected: {error}");
                Ok(None)
            }
        }
    }

    async fn list_due(&self, cutoff: &RemindAt) -> Result<Vec<DueReminder>, StoreError> {
        let response = self
            .request(Method::GET)
            .query(&Self::due_filter(cutoff))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let body = response.bytes().await?;
        let rows: Vec<serde_json::Value> = serde_json::from_slice(&body)?;

        let mut due = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::from_value::<ReminderStorageModel>(row.clone()) {
                Ok(model) => due.push(model.into()),
                Err(error) => log::error!("Skipping unreadable reminder row {row}: {error}"),
            }
        }

        Ok(due)
    }

    async fn delete_due(&self, cutoff: &RemindAt) -> Result<usize, StoreError> {
        let response = self
            .request(Method::DELETE)
            .query(&Self::due_filter(cutoff))
            .send()
            .await?;

        Self::count_representation(Self::ensure_success(response).await?).await
    }

    async fn delete_by_ids(&self, ids: &[ReminderId]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let response = self
            .request(Method::DELETE)
            .query(&[("id", format!("in.({ids})"))])
            .send()
            .await?;

        Self::count_representation(Self::ensure_success(response).await?).await
    }
}
