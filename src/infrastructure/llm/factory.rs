use std::sync::Arc;
use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use tracing::info;

use super::bedrock::{BedrockConverseClient, BedrockInferenceClient};
use crate::config::InferenceConfig;
use crate::domain::{DomainError, InferenceClient};

/// Factory for creating inference clients
#[derive(Debug)]
pub struct InferenceClientFactory;

impl InferenceClientFactory {
    /// Create a Bedrock client from configuration.
    ///
    /// Credentials come from the AWS default provider chain.
    pub async fn create_bedrock(
        config: &InferenceConfig,
    ) -> Result<Arc<dyn InferenceClient>, DomainError> {
        Self::validate(config)?;

        let timeouts = TimeoutConfig::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build();
        let retries = RetryConfig::standard().with_max_attempts(config.max_attempts);

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(timeouts)
            .retry_config(retries);

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let sdk_config = loader.load().await;
        info!(
            model = %config.model_id,
            region = sdk_config.region().map(|r| r.as_ref()),
            "Bedrock client ready"
        );

        let client = BedrockInferenceClient::new(
            BedrockConverseClient::new(&sdk_config),
            config.model_id.clone(),
        )
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);

        Ok(Arc::new(client))
    }

    fn validate(config: &InferenceConfig) -> Result<(), DomainError> {
        if config.model_id.trim().is_empty() {
            return Err(DomainError::configuration("inference.model_id is required"));
        }

        if config.max_tokens <= 0 {
            return Err(DomainError::configuration(
                "inference.max_tokens must be greater than 0",
            ));
        }

        if config.max_attempts == 0 {
            return Err(DomainError::configuration(
                "inference.max_attempts must be greater than 0",
            ));
        }

        Ok(())
    }
}
