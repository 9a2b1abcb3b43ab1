//! # HTTP Task Service Client
//!
//! `reqwest` implementation of [`TaskService`] against the dashboard REST API.
//!
//! Reads are idempotent and retried on network errors and 5xx responses with
//! exponential backoff. Mutations are sent exactly once: a retried submit or
//! approve could be applied twice by the service.

use super::task_service::{TaskService, UploadedPhoto};
use crate::config::ServiceConfig;
use crate::constants::MAX_RETRY_DELAY;
use crate::error::{PharmadeskError, Result};
use crate::models::{
    ActivityLogEntry, Assignee, ChecklistItem, ChecklistItemUpdate, ChecklistSnapshot,
    NewChecklistItem, PhotoUpload, Task, WorkflowStep,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct SubmitBody {
    checklist: ChecklistSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct RejectBody {
    reason: String,
}

#[derive(Debug, Serialize)]
struct ForwardBody {
    to_user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

/// What a 404 on a given request refers to
struct Target<'a> {
    entity: &'a str,
    id: Uuid,
}

#[derive(Clone)]
pub struct HttpTaskService {
    client: Client,
    config: ServiceConfig,
    base_url: Url,
}

impl std::fmt::Debug for HttpTaskService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTaskService")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("max_retries", &self.config.max_retries)
            .field("auth_enabled", &self.config.bearer_token.is_some())
            .finish()
    }
}

impl HttpTaskService {
    /// Create a client from service configuration
    pub fn new(config: ServiceConfig) -> Result<Self> {
        // A trailing slash keeps any path prefix of the base URL when joining
        let mut raw_base = config.base_url.trim().to_string();
        if !raw_base.ends_with('/') {
            raw_base.push('/');
        }
        let base_url = Url::parse(&raw_base).map_err(|e| {
            PharmadeskError::ConfigurationError(format!("Invalid base URL: {e}"))
        })?;

        let mut client_builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("pharmadesk-core/{}", env!("CARGO_PKG_VERSION")));

        if let Some(token) = config.bearer_token.as_deref().filter(|t| !t.is_empty()) {
            let mut default_headers = reqwest::header::HeaderMap::new();
            default_headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {token}").parse().map_err(|e| {
                    PharmadeskError::ConfigurationError(format!("Invalid bearer token: {e}"))
                })?,
            );
            client_builder = client_builder.default_headers(default_headers);
            debug!("Configured Bearer token authentication");
        }

        let client = client_builder.build().map_err(|e| {
            PharmadeskError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
        })?;

        info!(
            base_url = %base_url,
            timeout_ms = config.timeout_ms,
            max_retries = config.max_retries,
            "Created task service client"
        );

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Get the configured base URL for debugging/logging
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            PharmadeskError::ConfigurationError(format!("Failed to construct URL: {e}"))
        })
    }

    fn task_url(&self, task_id: Uuid, suffix: &str) -> Result<Url> {
        if suffix.is_empty() {
            self.url(&format!("v1/tasks/{task_id}"))
        } else {
            self.url(&format!("v1/tasks/{task_id}/{suffix}"))
        }
    }

    /// GET with retry and exponential backoff
    async fn get_json<T>(&self, url: Url, operation: &str, target: Target<'_>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(url = %url, operation = operation, attempt = attempt, "Fetching from task service");

            let failure = match self.client.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.json::<T>().await.map_err(|e| {
                        error!(operation = operation, error = %e, "Failed to parse response");
                        PharmadeskError::InvalidResponse(format!(
                            "Failed to parse {operation} response: {e}"
                        ))
                    });
                }
                Ok(response) => Self::error_from_response(response, operation, &target).await,
                Err(e) => PharmadeskError::NetworkError(format!("{operation}: {e}")),
            };

            if !failure.is_recoverable() || attempt >= max_attempts {
                if failure.is_recoverable() {
                    error!(
                        operation = operation,
                        attempts = attempt,
                        error = %failure,
                        "Exhausted all retries"
                    );
                }
                return Err(failure);
            }

            let delay = self.backoff_delay(attempt);
            warn!(
                operation = operation,
                error = %failure,
                retry = attempt,
                max_retries = max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Task service read failed, will retry"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Send a mutation exactly once
    async fn send_mutation(
        &self,
        request: RequestBuilder,
        operation: &str,
        target: Target<'_>,
    ) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            error!(operation = operation, error = %e, "Network error sending mutation");
            PharmadeskError::NetworkError(format!("{operation}: {e}"))
        })?;

        if response.status().is_success() {
            debug!(operation = operation, status = %response.status(), "Mutation accepted");
            Ok(response)
        } else {
            Err(Self::error_from_response(response, operation, &target).await)
        }
    }

    async fn error_from_response(
        response: Response,
        operation: &str,
        target: &Target<'_>,
    ) -> PharmadeskError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == StatusCode::NOT_FOUND {
            warn!(operation = operation, entity = target.entity, id = %target.id, "Not found");
            return PharmadeskError::not_found(target.entity, target.id);
        }

        error!(status = %status, error = %error_text, "Failed operation: {}", operation);
        PharmadeskError::service(status.as_u16(), error_text)
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        self.config
            .retry_base_delay()
            .checked_mul(1u32 << exponent)
            .unwrap_or(MAX_RETRY_DELAY)
            .min(MAX_RETRY_DELAY)
    }
}

#[async_trait]
impl TaskService for HttpTaskService {
    async fn get_task(&self, task_id: Uuid) -> Result<Task> {
        let url = self.task_url(task_id, "")?;
        self.get_json(url, "get task", Target { entity: "Task", id: task_id })
            .await
    }

    async fn get_checklist(
        &self,
        task_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<ChecklistItem>> {
        let mut url = self.task_url(task_id, "checklist")?;
        if let Some(date) = date {
            url.query_pairs_mut()
                .append_pair("date", &date.format("%Y-%m-%d").to_string());
        }
        self.get_json(url, "get checklist", Target { entity: "Task", id: task_id })
            .await
    }

    async fn update_checklist_item(
        &self,
        task_id: Uuid,
        item_id: Uuid,
        update: ChecklistItemUpdate,
    ) -> Result<()> {
        let url = self.task_url(task_id, &format!("checklist/{item_id}"))?;
        self.send_mutation(
            self.client.patch(url).json(&update),
            "update checklist item",
            Target {
                entity: "ChecklistItem",
                id: item_id,
            },
        )
        .await?;
        Ok(())
    }

    async fn add_checklist_item(&self, task_id: Uuid, item: NewChecklistItem) -> Result<()> {
        let url = self.task_url(task_id, "checklist")?;
        self.send_mutation(
            self.client.post(url).json(&item),
            "add checklist item",
            Target { entity: "Task", id: task_id },
        )
        .await?;
        Ok(())
    }

    async fn upload_checklist_photo(
        &self,
        task_id: Uuid,
        item_id: Uuid,
        file: PhotoUpload,
    ) -> Result<UploadedPhoto> {
        let url = self.task_url(task_id, &format!("checklist/{item_id}/photos"))?;
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| PharmadeskError::validation(format!("Invalid photo content type: {e}")))?;
        let form = multipart::Form::new().part("photo", part);

        let response = self
            .send_mutation(
                self.client.post(url).multipart(form),
                "upload checklist photo",
                Target {
                    entity: "ChecklistItem",
                    id: item_id,
                },
            )
            .await?;

        response.json::<UploadedPhoto>().await.map_err(|e| {
            PharmadeskError::InvalidResponse(format!("Failed to parse photo upload response: {e}"))
        })
    }

    async fn get_activity_log(&self, task_id: Uuid) -> Result<Vec<ActivityLogEntry>> {
        let url = self.task_url(task_id, "activity")?;
        self.get_json(url, "get activity log", Target { entity: "Task", id: task_id })
            .await
    }

    async fn get_workflow(&self, task_id: Uuid) -> Result<Vec<WorkflowStep>> {
        let url = self.task_url(task_id, "workflow")?;
        self.get_json(url, "get workflow", Target { entity: "Task", id: task_id })
            .await
    }

    async fn get_assignees(&self, task_id: Uuid) -> Result<Vec<Assignee>> {
        let url = self.task_url(task_id, "assignees")?;
        self.get_json(url, "get assignees", Target { entity: "Task", id: task_id })
            .await
    }

    async fn submit_task(
        &self,
        task_id: Uuid,
        checklist: ChecklistSnapshot,
        notes: Option<String>,
    ) -> Result<()> {
        let url = self.task_url(task_id, "submit")?;
        let body = SubmitBody { checklist, notes };
        self.send_mutation(
            self.client.post(url).json(&body),
            "submit task",
            Target { entity: "Task", id: task_id },
        )
        .await?;
        Ok(())
    }

    async fn approve_task(&self, task_id: Uuid) -> Result<()> {
        let url = self.task_url(task_id, "approve")?;
        self.send_mutation(
            self.client.post(url),
            "approve task",
            Target { entity: "Task", id: task_id },
        )
        .await?;
        Ok(())
    }

    async fn reject_task(&self, task_id: Uuid, reason: String) -> Result<()> {
        let url = self.task_url(task_id, "reject")?;
        self.send_mutation(
            self.client.post(url).json(&RejectBody { reason }),
            "reject task",
            Target { entity: "Task", id: task_id },
        )
        .await?;
        Ok(())
    }

    async fn forward_task(
        &self,
        task_id: Uuid,
        to_user_id: Uuid,
        notes: Option<String>,
    ) -> Result<()> {
        let url = self.task_url(task_id, "forward")?;
        self.send_mutation(
            self.client
                .post(url)
                .json(&ForwardBody { to_user_id, notes }),
            "forward task",
            Target { entity: "Task", id: task_id },
        )
        .await?;
        Ok(())
    }
}
