//! Rollbar error reporting.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use rf_ingest_core::config::ReportingConfig;

const NOTIFIER_NAME: &str = "rf-tasks";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Posts fatal errors to Rollbar.
pub struct RollbarReporter {
    client: Client,
    token: String,
    environment: String,
    endpoint: String,
}

impl RollbarReporter {
    /// Returns `None` when no token is configured.
    pub fn from_config(config: &ReportingConfig) -> Option<Self> {
        let token = config.rollbar_token.as_deref()?.trim();
        if token.is_empty() {
            return None;
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .ok()?;

        Some(Self {
            client,
            token: token.to_string(),
            environment: config.environment.clone(),
            endpoint: config.endpoint.clone(),
        })
    }

    /// Rollbar item for an error message.
    pub fn payload(&self, message: &str, scene_id: Option<&str>) -> Value {
        json!({
            "access_token": self.token,
            "data": {
                "environment": self.environment,
                "level": "error",
                "language": "rust",
                "timestamp": Utc::now().timestamp(),
                "uuid": Uuid::new_v4().to_string(),
                "body": {
                    "message": { "body": message }
                },
                "custom": { "scene_id": scene_id },
                "notifier": { "name": NOTIFIER_NAME, "version": VERSION },
            }
        })
    }

    pub async fn report(&self, message: &str, scene_id: Option<&str>) -> Result<(), reqwest::Error> {
        self.client
            .post(&self.endpoint)
            .json(&self.payload(message, scene_id))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> ReportingConfig {
        ReportingConfig {
            rollbar_token: token.map(String::from),
            environment: "staging".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_disabled_without_token() {
        assert!(RollbarReporter::from_config(&config(None)).is_none());
        assert!(RollbarReporter::from_config(&config(Some("  "))).is_none());
    }

    #[test]
    fn test_payload() {
        let reporter = RollbarReporter::from_config(&config(Some("post-server-token"))).unwrap();
        let payload = reporter.payload("Failed to ingest scene-1 for user user-1", Some("scene-1"));

        assert_eq!(payload["access_token"], "post-server-token");
        assert_eq!(payload["data"]["environment"], "staging");
        assert_eq!(payload["data"]["level"], "error");
        assert_eq!(
            payload["data"]["body"]["message"]["body"],
            "Failed to ingest scene-1 for user user-1"
        );
        assert_eq!(payload["data"]["custom"]["scene_id"], "scene-1");
        assert_eq!(payload["data"]["notifier"]["name"], "rf-tasks");
    }
}
