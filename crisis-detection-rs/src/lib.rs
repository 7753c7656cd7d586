//! # Crisis Detection
//!
//! Classifies free-form text for mental-health crisis indicators.
//!
//! The AI completion provider does the reading; this crate makes its output
//! safe to act on:
//!
//! - `normalizer` extracts and coerces the provider's reply into a
//!   `NormalizedDetection`, with safe defaults for anything missing
//! - `aggregator` turns it into ordered `RiskFactor`s
//! - `assessment` defines the risk assessor and alert dispatcher
//!   collaborators, with default implementations
//! - `detector` orchestrates one call or a batch, optionally retrying the
//!   provider through the SDK's resilience wrapper
//!
//! ```no_run
//! use std::sync::Arc;
//! use completion_sdk::config::DEFAULT_PROVIDER;
//! use crisis_detection_rs::{CrisisDetector, DetectionOptions};
//!
//! # async fn run() -> crisis_detection_rs::Result<()> {
//! let detector = CrisisDetector::from_provider(&**DEFAULT_PROVIDER)?;
//! let result = detector
//!     .detect("I can't see a way forward anymore", &DetectionOptions::new().with_user_id("u-42"))
//!     .await?;
//! if result.requires_intervention {
//!     // escalate
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod assessment;
pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod normalizer;
pub mod prompts;
pub mod types;

pub use assessment::{
    AdditiveRiskAssessor, AlertContext, AlertDispatcher, LogAlertDispatcher, RiskAssessor,
};
pub use config::{AlertFailurePolicy, DetectionConfig};
pub use detector::{CrisisDetector, CrisisDetectorBuilder};
pub use error::{AlertError, DetectionError, Result};
pub use logging::{init_logging, LoggingConfig};
pub use types::{
    CrisisDetectionResult, DetectionOptions, DetectionSeverity, Indicator, NormalizedDetection,
    RiskAssessment, RiskFactor, RiskLevel, Sensitivity,
};
