//! Configuration for the KARA back-office server binary.

use std::{path::PathBuf, time::Duration};

use kara_api::ApiConfig;
use kara_workflows::approval::ApprovalConfig;
use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml` and
/// `KARA_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  /// Domain of the login emails issued to approved members.
  pub member_email_domain:   String,
  pub trigger_timeout_secs:  u64,
  pub approval_timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "127.0.0.1".to_string(),
      port:                  8080,
      store_path:            PathBuf::from("kara.db"),
      member_email_domain:   ApprovalConfig::default().email_domain,
      trigger_timeout_secs:  120,
      approval_timeout_secs: 60,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      approval:         ApprovalConfig {
        email_domain: self.member_email_domain.clone(),
      },
      trigger_timeout:  Duration::from_secs(self.trigger_timeout_secs),
      approval_timeout: Duration::from_secs(self.approval_timeout_secs),
    }
  }
}
