use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::EagleClient;

/// A user-defined folder inside the current library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub children: Vec<Folder>,
    #[serde(default)]
    pub modification_time: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_count: Option<u64>,
    #[serde(default)]
    pub descendant_image_count: Option<u64>,
    #[serde(default)]
    pub pinyin: Option<String>,
    #[serde(default)]
    pub extend_tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Folder {
    /// Depth-first search of this folder and its descendants.
    pub fn find<'a>(&'a self, predicate: &impl Fn(&Folder) -> bool) -> Option<&'a Folder> {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(predicate))
    }
}

/// Folder label colors Eagle accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderColor {
    Red,
    Orange,
    Green,
    Yellow,
    Aqua,
    Blue,
    Purple,
    Pink,
}

impl std::str::FromStr for FolderColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "orange" => Ok(Self::Orange),
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "aqua" => Ok(Self::Aqua),
            "blue" => Ok(Self::Blue),
            "purple" => Ok(Self::Purple),
            "pink" => Ok(Self::Pink),
            other => anyhow::bail!("Unknown folder color: {other}"),
        }
    }
}

/// Changes to apply to a folder. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderUpdate {
    pub folder_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_color: Option<FolderColor>,
}

impl FolderUpdate {
    pub fn new(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            ..Default::default()
        }
    }
}

/// Find a folder by name anywhere in a folder forest.
pub fn find_folder_by_name<'a>(folders: &'a [Folder], name: &str) -> Option<&'a Folder> {
    folders
        .iter()
        .find_map(|folder| folder.find(&|f: &Folder| f.name == name))
}

impl EagleClient {
    /// `POST /api/folder/create`
    pub async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<Folder> {
        let mut body = json!({ "folderName": name });
        if let Some(parent) = parent {
            body["parent"] = json!(parent);
        }
        log::info!("Creating folder {name}");
        self.post_for("/api/folder/create", &body).await
    }

    /// `POST /api/folder/rename`
    pub async fn rename_folder(&self, folder_id: &str, new_name: &str) -> Result<Folder> {
        self.post_for(
            "/api/folder/rename",
            &json!({ "folderId": folder_id, "newName": new_name }),
        )
        .await
    }

    /// `POST /api/folder/update`
    pub async fn update_folder(&self, update: &FolderUpdate) -> Result<Folder> {
        self.post_for("/api/folder/update", update).await
    }

    /// `GET /api/folder/list` — top-level folders with their children.
    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        self.get("/api/folder/list", &[]).await
    }

    /// `GET /api/folder/listRecent`
    pub async fn list_recent_folders(&self) -> Result<Vec<Folder>> {
        self.get("/api/folder/listRecent", &[]).await
    }
}
