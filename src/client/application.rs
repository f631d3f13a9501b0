use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::EagleClient;

/// Version and platform of the running Eagle application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    pub version: String,
    #[serde(default)]
    pub prerelease_version: Option<String>,
    #[serde(default)]
    pub build_version: Option<String>,
    #[serde(default)]
    pub exec_path: Option<String>,
    #[serde(default)]
    pub platform: String,
}

impl EagleClient {
    /// `GET /api/application/info`
    pub async fn application_info(&self) -> Result<ApplicationInfo> {
        self.get("/api/application/info", &[]).await
    }
}
