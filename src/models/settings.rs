use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::services::transfer_queue::ExecutionMode;

/// Runtime configuration, loaded read-only from `settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Remote service root, without a trailing slash.
    pub base_url: String,
    /// Session token provided by the external auth flow.
    pub session_token: Option<String>,
    /// Jobs in flight per batch. `1` means strictly sequential.
    pub transfer_concurrency: usize,
    pub request_timeout_secs: u64,
    /// Timeout for a single upload or download body.
    pub transfer_timeout_secs: u64,
    /// Save location for `DirectorySavePrompt::from_settings`.
    pub download_dir: Option<PathBuf>,
    /// Retries per job on transient errors.
    pub max_retries: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: "https://cloud.onlysq.ru".to_string(),
            session_token: None,
            transfer_concurrency: 1,
            request_timeout_secs: 30,
            transfer_timeout_secs: 300,
            download_dir: None,
            max_retries: 2,
        }
    }
}

impl AppSettings {
    pub fn execution_mode(&self) -> ExecutionMode {
        if self.transfer_concurrency > 1 {
            ExecutionMode::Parallel(self.transfer_concurrency)
        } else {
            ExecutionMode::Sequential
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_camel_case_keys() {
        let json = serde_json::to_value(AppSettings::default()).unwrap();
        assert!(json.get("baseUrl").is_some());
        assert!(json.get("transferConcurrency").is_some());
        assert!(json.get("maxRetries").is_some());
        assert!(json.get("base_url").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"sessionToken": "tok", "transferConcurrency": 4}"#).unwrap();
        assert_eq!(settings.session_token.as_deref(), Some("tok"));
        assert_eq!(settings.transfer_concurrency, 4);
        assert_eq!(settings.base_url, "https://cloud.onlysq.ru");
        assert_eq!(settings.max_retries, 2);
    }

    #[test]
    fn default_is_sequential() {
        assert_eq!(AppSettings::default().execution_mode(), ExecutionMode::Sequential);
    }

    #[test]
    fn concurrency_above_one_is_parallel() {
        let settings = AppSettings {
            transfer_concurrency: 3,
            ..AppSettings::default()
        };
        assert_eq!(settings.execution_mode(), ExecutionMode::Parallel(3));
    }

    #[test]
    fn zero_concurrency_is_sequential() {
        let settings = AppSettings {
            transfer_concurrency: 0,
            ..AppSettings::default()
        };
        assert_eq!(settings.execution_mode(), ExecutionMode::Sequential);
    }
}
