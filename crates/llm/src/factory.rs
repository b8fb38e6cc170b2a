//! Client factory.
//!
//! Builds an [`OpenAiClient`] from application configuration, resolving the
//! credential and the optional organization/project scoping.

use crate::providers::{OpenAiClient, OpenAiSettings};
use concierge_core::{AppConfig, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a client from configuration.
///
/// # Errors
/// Returns a configuration error if the API key cannot be resolved or the
/// HTTP client cannot be built. No remote call is attempted in that case.
pub fn create_client(config: &AppConfig) -> AppResult<Arc<OpenAiClient>> {
    let api_key = config.require_api_key()?;

    let settings = OpenAiSettings {
        base_url: config.openai.endpoint.clone(),
        api_key,
        organization: config.organization(),
        project: config.project(),
        timeout: config.openai.timeout_secs.map(Duration::from_secs),
    };

    tracing::debug!(
        endpoint = %settings.base_url,
        organization = settings.organization.is_some(),
        project = settings.project.is_some(),
        "Creating OpenAI client"
    );

    Ok(Arc::new(OpenAiClient::new(settings)?))
}
