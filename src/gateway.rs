//! The image request gateway: validate the prompt, render it into the active
//! profile, make one provider call and shape the result.
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::models::GenerationResult;
use crate::openai::{ImageProvider, ImageRequest};
use crate::profile::{OutputFormat, TemplateProfile};

pub struct ImageGateway {
    profile: Arc<TemplateProfile>,
    provider: Arc<dyn ImageProvider>,
    model: String,
}

impl ImageGateway {
    pub fn new(profile: Arc<TemplateProfile>, provider: Arc<dyn ImageProvider>, model: impl Into<String>) -> Self {
        Self { profile, provider, model: model.into() }
    }

    pub fn profile(&self) -> &TemplateProfile {
        &self.profile
    }

    pub async fn generate(&self, raw: &Value) -> Result<GenerationResult, GatewayError> {
        let prompt = validate_prompt(raw)?;
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("generate", %request_id, profile = self.profile.name());

        async move {
            info!("🚀 Generating {} image(s) for theme: {}", self.profile.image_count(), prompt);
            let request = self.build_request(prompt);

            let payloads = self.provider.generate_images(&request).await.map_err(|e| {
                error!("❌ Image generate error: {}", e);
                GatewayError::from(e)
            })?;

            let format = self.profile.output_format();
            let images: Vec<String> = payloads.iter().map(|b64| to_data_uri(format, b64)).collect();
            info!("✅ Generated {} image(s)", images.len());
            Ok::<_, GatewayError>(GenerationResult { images })
        }
        .instrument(span)
        .await
    }

    fn build_request(&self, prompt: &str) -> ImageRequest {
        ImageRequest {
            model: self.model.clone(),
            prompt: self.profile.render(prompt),
            n: self.profile.image_count(),
            size: self.profile.resolution().to_string(),
            output_format: self.profile.output_format(),
            output_compression: self.profile.output_compression(),
            quality: self.profile.quality().as_param().map(String::from),
        }
    }
}

/// `prompt` must be a non-empty string; anything else is rejected before any IO.
pub fn validate_prompt(raw: &Value) -> Result<&str, GatewayError> {
    raw.get("prompt")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .ok_or(GatewayError::InvalidInput)
}

pub fn to_data_uri(format: OutputFormat, b64: &str) -> String {
    format!("data:image/{};base64,{}", format, b64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::ProviderError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubProvider {
        calls: Mutex<Vec<ImageRequest>>,
        fail_with: Option<String>,
        payloads: Vec<String>,
    }

    #[async_trait]
    impl ImageProvider for StubProvider {
        async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<String>, ProviderError> {
            self.calls.lock().unwrap().push(request.clone());
            match &self.fail_with {
                Some(msg) => Err(ProviderError::Http(msg.clone())),
                None => Ok(self.payloads.clone()),
            }
        }
    }

    fn gateway(preset: &str, stub: Arc<StubProvider>) -> ImageGateway {
        let profile = Arc::new(TemplateProfile::preset(preset).unwrap());
        ImageGateway::new(profile, stub, "gpt-image-1")
    }

    #[tokio::test]
    async fn acme_scenario_returns_webp_data_uris_in_order() {
        let stub = Arc::new(StubProvider { payloads: vec!["AAA".into(), "BBB".into()], ..Default::default() });
        let gw = gateway("booth-preview", stub.clone());

        let result = gw.generate(&json!({"prompt": "Acme Robotics"})).await.unwrap();
        assert_eq!(result.images, vec![
            "data:image/webp;base64,AAA".to_string(),
            "data:image/webp;base64,BBB".to_string(),
        ]);

        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let req = &calls[0];
        assert!(req.prompt.contains("Company / theme: Acme Robotics"));
        assert_eq!(req.n, 2);
        assert_eq!(req.size, "1024x1024");
        assert_eq!(req.output_format, OutputFormat::Webp);
        assert_eq!(req.output_compression, Some(100));
        assert_eq!(req.quality.as_deref(), Some("low"));
        assert_eq!(req.model, "gpt-image-1");
    }

    #[tokio::test]
    async fn invalid_inputs_never_reach_the_provider() {
        let stub = Arc::new(StubProvider::default());
        let gw = gateway("booth-preview", stub.clone());

        for raw in [json!({}), json!({"prompt": ""}), json!({"prompt": 42}), json!({"prompt": null}), json!("Acme"), json!({"prompt": ["Acme"]})] {
            let err = gw.generate(&raw).await.unwrap_err();
            assert!(matches!(err, GatewayError::InvalidInput), "{raw}");
        }
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_carries_message() {
        let stub = Arc::new(StubProvider { fail_with: Some("connection reset".into()), ..Default::default() });
        let gw = gateway("booth-single", stub.clone());

        match gw.generate(&json!({"prompt": "Acme"})).await {
            Err(GatewayError::ProviderFailure { message }) => assert_eq!(message, "connection reset"),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(stub.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unspecified_fields_are_left_to_the_provider() {
        let stub = Arc::new(StubProvider { payloads: vec!["X".into()], ..Default::default() });
        let gw = gateway("booth-provider-defaults", stub.clone());

        let result = gw.generate(&json!({"prompt": "  "})).await.unwrap();
        assert_eq!(result.images.len(), 1);

        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls[0].quality, None);
        assert_eq!(calls[0].output_compression, None);
    }

    #[tokio::test]
    async fn empty_provider_response_yields_no_images() {
        let stub = Arc::new(StubProvider::default());
        let gw = gateway("booth-preview", stub);
        let result = gw.generate(&json!({"prompt": "Acme"})).await.unwrap();
        assert!(result.images.is_empty());
    }

    #[test]
    fn data_uri_uses_profile_format() {
        assert_eq!(to_data_uri(OutputFormat::Png, "iVBOR"), "data:image/png;base64,iVBOR");
        assert_eq!(validate_prompt(&json!({"prompt": "x", "extra": 1})).unwrap(), "x");
    }
}
