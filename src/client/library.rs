use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;

use super::{EagleClient, Folder};

/// Overview of the library Eagle currently has open.
///
/// Smart folders, quick access entries and tag groups are application-owned
/// structures and are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryInfo {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub smart_folders: Vec<Value>,
    #[serde(default)]
    pub quick_access: Vec<Value>,
    #[serde(default)]
    pub tags_groups: Vec<Value>,
    #[serde(default)]
    pub modification_time: Option<i64>,
    #[serde(default)]
    pub application_version: Option<String>,
    #[serde(default)]
    pub library: Option<LibraryLocation>,
}

/// Where a library lives on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryLocation {
    pub path: String,
    #[serde(default)]
    pub name: String,
}

impl EagleClient {
    /// `GET /api/library/info`
    pub async fn library_info(&self) -> Result<LibraryInfo> {
        self.get("/api/library/info", &[]).await
    }

    /// `GET /api/library/history` — paths of recently opened libraries.
    pub async fn library_history(&self) -> Result<Vec<String>> {
        self.get("/api/library/history", &[]).await
    }

    /// `POST /api/library/switch`
    pub async fn switch_library(&self, library_path: &Path) -> Result<()> {
        log::info!("Switching to library {}", library_path.display());
        self.post(
            "/api/library/switch",
            &json!({ "libraryPath": library_path.to_string_lossy() }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::start_eagle_mock;
    use super::*;
    use wiremock::{Mock, ResponseTemplate, matchers};

    #[tokio::test]
    async fn library_info() {
        let (_server, client) = start_eagle_mock(vec![
            Mock::given(matchers::method("GET"))
                .and(matchers::path("/api/library/info"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "status": "success",
                    "data": {
                        "folders": [{ "id": "F1", "name": "Inbox", "children": [] }],
                        "smartFolders": [],
                        "quickAccess": [{ "type": "folder", "id": "F1" }],
                        "tagsGroups": [],
                        "modificationTime": 1700000000000i64,
                        "applicationVersion": "4.0.0",
                        "library": { "path": "/Users/me/Photos.library", "name": "Photos" }
                    }
                })))
                .expect(1),
        ])
        .await;

        let info = client.library_info().await.unwrap();
        assert_eq!(info.folders[0].name, "Inbox");
        assert_eq!(info.quick_access.len(), 1);
        assert_eq!(info.library.unwrap().name, "Photos");
    }

    #[tokio::test]
    async fn library_history() {
        let (_server, client) = start_eagle_mock(vec![
            Mock::given(matchers::method("GET"))
                .and(matchers::path("/api/library/history"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "status": "success",
                    "data": ["/a.library", "/b.library"]
                })))
                .expect(1),
        ])
        .await;

        assert_eq!(
            client.library_history().await.unwrap(),
            vec!["/a.library", "/b.library"]
        );
    }

    #[tokio::test]
    async fn switch_library_payload() {
        let (_server, client) = start_eagle_mock(vec![
            Mock::given(matchers::method("POST"))
                .and(matchers::path("/api/library/switch"))
                .and(matchers::body_json(json!({ "libraryPath": "/b.library" })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
                .expect(1),
        ])
        .await;

        client
            .switch_library(Path::new("/b.library"))
            .await
            .unwrap();
    }
}
