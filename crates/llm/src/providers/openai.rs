//! OpenAI provider implementation.
//!
//! Covers the endpoints the Concierge tools use: chat completions, responses,
//! file upload, fine-tuning jobs and model management.
//! API reference: https://platform.openai.com/docs/api-reference

use crate::client::{ChatRequest, ChatResponse, LlmClient};
use crate::responses::{ResponsesRequest, ResponsesResponse};
use crate::types::{
    CreateFineTuningJob, DeletedModel, FileObject, FineTuningJob, ModelList, ModelObject,
};
use concierge_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Connection settings for [`OpenAiClient`].
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub api_key: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub timeout: Option<Duration>,
}

/// OpenAI HTTP client.
pub struct OpenAiClient {
    /// Base URL, without trailing slash
    base_url: String,

    api_key: String,

    organization: Option<String>,

    project: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client from connection settings.
    pub fn new(settings: OpenAiSettings) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key,
            organization: settings.organization,
            project: settings.project,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach credentials and scoping headers.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder.bearer_auth(&self.api_key);
        if let Some(ref organization) = self.organization {
            builder = builder.header("OpenAI-Organization", organization);
        }
        if let Some(ref project) = self.project {
            builder = builder.header("OpenAI-Project", project);
        }
        builder
    }

    /// Send a request and decode a JSON body, mapping failures to `AppError::Llm`.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> AppResult<T> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send {} request: {}", what, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "OpenAI API error on {} ({}): {}",
                what, status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse {} response: {}", what, e)))
    }

    /// Run one agent turn through the Responses API.
    pub async fn respond(&self, request: &ResponsesRequest) -> AppResult<ResponsesResponse> {
        tracing::info!(model = %request.model, items = request.input.len(), "Sending responses request");
        tracing::debug!("Request: {:?}", request);

        let response: ResponsesResponse = self
            .send(self.client.post(self.url("responses")).json(request), "responses")
            .await?;

        tracing::info!(id = %response.id, items = response.output.len(), "Received response");
        Ok(response)
    }

    /// Upload a file for the given purpose (e.g., "fine-tune").
    pub async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        purpose: &str,
    ) -> AppResult<FileObject> {
        tracing::info!(file_name, size = bytes.len(), purpose, "Uploading file");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/jsonl")
            .map_err(|e| AppError::Llm(format!("Invalid upload content type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", purpose.to_string())
            .part("file", part);

        self.send(self.client.post(self.url("files")).multipart(form), "file upload")
            .await
    }

    /// Start a fine-tuning job on an uploaded training file.
    pub async fn create_fine_tuning_job(
        &self,
        training_file: &str,
        model: &str,
    ) -> AppResult<FineTuningJob> {
        tracing::info!(training_file, model, "Creating fine-tuning job");
        let body = CreateFineTuningJob {
            training_file: training_file.to_string(),
            model: model.to_string(),
        };
        self.send(
            self.client.post(self.url("fine_tuning/jobs")).json(&body),
            "fine-tuning job creation",
        )
        .await
    }

    /// Fetch the current state of a fine-tuning job.
    pub async fn retrieve_fine_tuning_job(&self, job_id: &str) -> AppResult<FineTuningJob> {
        tracing::debug!(job_id, "Retrieving fine-tuning job");
        self.send(
            self.client
                .get(self.url(&format!("fine_tuning/jobs/{}", job_id))),
            "fine-tuning job retrieval",
        )
        .await
    }

    /// List the models visible to this key, organization and project.
    pub async fn list_models(&self) -> AppResult<Vec<ModelObject>> {
        let list: ModelList = self
            .send(self.client.get(self.url("models")), "model list")
            .await?;
        Ok(list.data)
    }

    pub async fn retrieve_model(&self, model_id: &str) -> AppResult<ModelObject> {
        self.send(
            self.client.get(self.url(&format!("models/{}", model_id))),
            "model retrieval",
        )
        .await
    }

    /// Delete a fine-tuned model. The job history stays on the platform.
    pub async fn delete_model(&self, model_id: &str) -> AppResult<DeletedModel> {
        tracing::info!(model_id, "Deleting model");
        self.send(
            self.client
                .delete(self.url(&format!("models/{}", model_id))),
            "model deletion",
        )
        .await
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!(model = %request.model, "Sending chat completion request");
        tracing::debug!("Request: {:?}", request);

        let response: ChatResponse = self
            .send(
                self.client.post(self.url("chat/completions")).json(request),
                "chat completion",
            )
            .await?;

        tracing::debug!(
            "Token usage - Prompt: {}, Completion: {}, Total: {}",
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
            response.usage.total_tokens
        );
        Ok(response)
    }
}
