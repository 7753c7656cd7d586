//! The crisis classifier
//!
//! `CrisisDetector` runs one detection end to end: prompt selection, a single
//! provider request (retried per attempt when resilience is attached),
//! normalization, aggregation, assessment, optional alert dispatch and result
//! assembly. A detector is immutable once built and can be shared across
//! tasks behind an `Arc`.

use std::sync::Arc;

use completion_sdk::config::ConfigProvider;
use completion_sdk::openai::OpenAIClient;
use completion_sdk::{
    ChatCompletionRequest, ChatMessage, CompletionProvider, Resilience, ResilienceConfig,
};
use futures::future::{join_all, try_join_all};
use tracing::{debug, error, info, instrument, warn};

use crate::aggregator::aggregate;
use crate::assessment::{
    AdditiveRiskAssessor, AlertContext, AlertDispatcher, LogAlertDispatcher, RiskAssessor,
};
use crate::config::{AlertFailurePolicy, DetectionConfig};
use crate::error::{DetectionError, Result};
use crate::normalizer::normalize;
use crate::prompts::apply_sensitivity;
use crate::types::{
    CrisisDetectionResult, DetectionOptions, NormalizedDetection, RiskAssessment, Sensitivity,
};

/// Top-level crisis classifier
pub struct CrisisDetector {
    provider: Arc<dyn CompletionProvider>,
    assessor: Arc<dyn RiskAssessor>,
    alerts: Arc<dyn AlertDispatcher>,
    config: DetectionConfig,
    resilience: Option<Resilience>,
}

impl std::fmt::Debug for CrisisDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrisisDetector")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("resilience", &self.resilience)
            .finish_non_exhaustive()
    }
}

impl CrisisDetector {
    /// Detector with the default assessor and dispatcher and no resilience
    pub fn new(provider: Arc<dyn CompletionProvider>, config: DetectionConfig) -> Self {
        Self {
            provider,
            assessor: Arc::new(AdditiveRiskAssessor::default()),
            alerts: Arc::new(LogAlertDispatcher),
            config,
            resilience: None,
        }
    }

    pub fn builder() -> CrisisDetectorBuilder {
        CrisisDetectorBuilder::default()
    }

    /// Assemble a detector from configuration: an OpenAI-compatible provider,
    /// the resilience wrapper and the detection settings.
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let client = OpenAIClient::from_provider(provider)
            .map_err(|e| DetectionError::configuration(e.to_string()))?;
        let resilience = ResilienceConfig::from_provider(provider)
            .map_err(|e| DetectionError::configuration(e.to_string()))?;
        let config = DetectionConfig::from_provider(provider)?;

        Self::builder()
            .provider(Arc::new(client))
            .config(config)
            .resilience(Resilience::new(resilience))
            .build()
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Prompt for one call: a custom prompt is used verbatim, otherwise the
    /// configured template with its sensitivity label swapped
    pub fn prompt_for(&self, sensitivity: Sensitivity, custom_prompt: Option<&str>) -> String {
        match custom_prompt {
            Some(prompt) => prompt.to_string(),
            None => apply_sensitivity(&self.config.prompt_template, self.config.sensitivity, sensitivity),
        }
    }

    /// Classify one text.
    ///
    /// Fails with `DetectionError::Provider` when the provider call fails
    /// (after retries, if resilience is attached) and `DetectionError::Parse`
    /// when the reply holds no usable JSON object. Alert failures only fail
    /// the call under `AlertFailurePolicy::Propagate`.
    #[instrument(
        name = "crisis_detection",
        skip(self, text, options),
        fields(detector = %self.config.name, text_len = text.len())
    )]
    pub async fn detect(&self, text: &str, options: &DetectionOptions) -> Result<CrisisDetectionResult> {
        let sensitivity = options.sensitivity.unwrap_or(self.config.sensitivity);
        let prompt = self.prompt_for(sensitivity, options.custom_prompt.as_deref());

        let request = ChatCompletionRequest::new(
            self.config.model.clone(),
            vec![ChatMessage::system(prompt), ChatMessage::user(text)],
        );

        debug!(sensitivity = %sensitivity, model = %self.config.model, "Requesting classification");

        let response = self.complete(request).await?;
        let normalized = normalize(response.first_content().unwrap_or_default())?;
        let factors = aggregate(&normalized);
        let assessment = self.assessor.assess(&factors);

        if normalized.is_crisis {
            warn!(
                category = normalized.category.as_deref().unwrap_or("unspecified"),
                severity = %normalized.severity,
                risk_level = %assessment.level,
                "Crisis indicators detected"
            );
        } else {
            info!(risk_level = %assessment.level, "Classification complete");
        }

        if let Some(user_id) = options.user_id.as_deref() {
            self.dispatch_alert(&assessment, user_id, options.source.as_deref(), text, &normalized)
                .await?;
        }

        Ok(CrisisDetectionResult::assemble(normalized, factors, &assessment))
    }

    /// Classify many texts concurrently; the first failure fails the batch.
    ///
    /// Results are in input order.
    pub async fn detect_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
        options: &DetectionOptions,
    ) -> Result<Vec<CrisisDetectionResult>> {
        try_join_all(texts.iter().map(|text| self.detect(text.as_ref(), options))).await
    }

    /// Classify many texts concurrently, keeping every outcome in input order
    pub async fn detect_batch_settled<S: AsRef<str>>(
        &self,
        texts: &[S],
        options: &DetectionOptions,
    ) -> Vec<Result<CrisisDetectionResult>> {
        join_all(texts.iter().map(|text| self.detect(text.as_ref(), options))).await
    }

    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<completion_sdk::ChatCompletionResponse> {
        let response = match &self.resilience {
            Some(resilience) => {
                resilience
                    .execute(|| self.provider.complete(request.clone()))
                    .await?
            }
            None => self.provider.complete(request).await?,
        };

        Ok(response)
    }

    async fn dispatch_alert(
        &self,
        assessment: &RiskAssessment,
        user_id: &str,
        source: Option<&str>,
        text: &str,
        normalized: &NormalizedDetection,
    ) -> Result<()> {
        let source = source.unwrap_or(self.config.name.as_str());
        let context = AlertContext {
            text: text.to_string(),
            parsed: normalized.raw.clone(),
            model: self.config.model.clone(),
        };

        match self.alerts.process(assessment, user_id, source, &context).await {
            Ok(()) => Ok(()),
            Err(err) => match self.config.alert_policy {
                AlertFailurePolicy::LogAndContinue => {
                    error!(user_id = %user_id, source = %source, error = %err, "Alert dispatch failed");
                    Ok(())
                }
                AlertFailurePolicy::Propagate => Err(err.into()),
            },
        }
    }
}

/// Builder for `CrisisDetector`
#[derive(Default)]
pub struct CrisisDetectorBuilder {
    provider: Option<Arc<dyn CompletionProvider>>,
    assessor: Option<Arc<dyn RiskAssessor>>,
    alerts: Option<Arc<dyn AlertDispatcher>>,
    config: Option<DetectionConfig>,
    resilience: Option<Resilience>,
}

impl CrisisDetectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the completion provider (required)
    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn assessor(mut self, assessor: Arc<dyn RiskAssessor>) -> Self {
        self.assessor = Some(assessor);
        self
    }

    pub fn alert_dispatcher(mut self, alerts: Arc<dyn AlertDispatcher>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn config(mut self, config: DetectionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Retry provider calls under `resilience`. Fallback replies are never
    /// used for detection; a failed call surfaces as `DetectionError::Provider`.
    pub fn resilience(mut self, resilience: Resilience) -> Self {
        self.resilience = Some(resilience);
        self
    }

    pub fn build(self) -> Result<CrisisDetector> {
        let provider = self
            .provider
            .ok_or_else(|| DetectionError::configuration("a completion provider is required"))?;

        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(CrisisDetector {
            provider,
            assessor: self
                .assessor
                .unwrap_or_else(|| Arc::new(AdditiveRiskAssessor::default())),
            alerts: self.alerts.unwrap_or_else(|| Arc::new(LogAlertDispatcher)),
            config,
            resilience: self.resilience,
        })
    }
}
