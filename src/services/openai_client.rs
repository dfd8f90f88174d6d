use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;

use crate::error::ServiceError;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ServiceError>;
}

pub struct OpenaiClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenaiClient {
    /// Every call is a single request bounded by `timeout`. Retries are left
    /// to the caller.
    pub fn new(
        api_key: String,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        let no_retries = backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Ok(OpenaiClient {
            client: Client::with_config(config)
                .with_http_client(http_client)
                .with_backoff(no_retries),
            model,
            temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenaiClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ServiceError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(from_openai)?
                .into()])
            .max_tokens(max_tokens)
            .temperature(self.temperature)
            .n(1)
            .build()
            .map_err(from_openai)?;

        let response = self.client.chat().create(request).await.map_err(from_openai)?;
        log::debug!("Response: {:?}", response);

        response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::MalformedResponse("No choices in Openai response".into()))?
            .message
            .content
            .ok_or_else(|| ServiceError::MalformedResponse("No content".into()))
    }
}

fn from_openai(e: OpenAIError) -> ServiceError {
    match e {
        OpenAIError::Reqwest(e) => ServiceError::from(e),
        OpenAIError::ApiError(e) if e.r#type.as_deref() == Some("insufficient_quota") => {
            ServiceError::RateLimited(e.message)
        }
        OpenAIError::ApiError(e) => ServiceError::Api(e.message),
        OpenAIError::JSONDeserialize(e) => ServiceError::MalformedResponse(e.to_string()),
        other => ServiceError::Api(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use async_openai::error::ApiError;

    use super::*;

    fn api_error(kind: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: "nope".to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: None,
        })
    }

    #[test]
    fn exhausted_quota_is_rate_limited() {
        assert_eq!(
            from_openai(api_error(Some("insufficient_quota"))),
            ServiceError::RateLimited("nope".to_string())
        );
        assert_eq!(
            from_openai(api_error(Some("invalid_request_error"))),
            ServiceError::Api("nope".to_string())
        );
        assert_eq!(from_openai(api_error(None)), ServiceError::Api("nope".to_string()));
    }

    #[test]
    fn undecodable_response_is_malformed() {
        let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            from_openai(OpenAIError::JSONDeserialize(e)),
            ServiceError::MalformedResponse(_)
        ));
    }

    #[test]
    fn client_builds_without_network() {
        assert!(OpenaiClient::new(
            "sk-test".to_string(),
            "gpt-4o-mini".to_string(),
            0.5,
            Duration::from_secs(60),
        )
        .is_ok());
    }
}
