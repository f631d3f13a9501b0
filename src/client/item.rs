use anyhow::Result;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::Path;

use super::EagleClient;

/// An image or file managed by Eagle.
///
/// Matches both the API's item objects and the `metadata.json` descriptors
/// inside a library folder. Fields this type does not name are kept in
/// [`Item::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub annotation: String,
    #[serde(default)]
    pub modification_time: Option<i64>,
    #[serde(default)]
    pub width: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub last_modified: Option<i64>,
    #[serde(default)]
    pub palettes: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for adding an image from a URL.
///
/// `tags` defaults to empty, `website` and `annotation` to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFromUrl {
    pub url: String,
    pub name: String,
    pub website: String,
    pub tags: Vec<String>,
    pub annotation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

impl AddFromUrl {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = website.into();
        self
    }

    pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    /// Creation time to record, in milliseconds since the epoch.
    pub fn modification_time(mut self, millis: i64) -> Self {
        self.modification_time = Some(millis);
        self
    }

    /// Extra HTTP headers Eagle sends when downloading `url` (e.g. a referer).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }
}

/// Payload for adding a local file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFromPath {
    pub path: String,
    pub name: String,
    pub website: String,
    pub tags: Vec<String>,
    pub annotation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

impl AddFromPath {
    pub fn new(path: &Path, name: impl Into<String>) -> Self {
        Self {
            path: path.to_string_lossy().into_owned(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = website.into();
        self
    }

    pub fn annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    pub fn folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }
}

/// Payload for saving a web page bookmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookmark {
    pub url: String,
    pub name: String,
    /// Thumbnail as a `data:` URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

impl AddBookmark {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach a thumbnail image, encoded as a base64 data URL.
    pub fn thumbnail(mut self, bytes: &[u8], mime_type: &str) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.base64 = Some(format!("data:{mime_type};base64,{encoded}"));
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn modification_time(mut self, millis: i64) -> Self {
        self.modification_time = Some(millis);
        self
    }

    pub fn folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }
}

/// Query for `GET /api/item/list`.
///
/// Unset fields are left out of the query string and Eagle applies its own
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Sort key such as `CREATEDATE`, `-FILESIZE`, `NAME` or `RESOLUTION`.
    pub order_by: Option<String>,
    pub keyword: Option<String>,
    pub ext: Option<String>,
    pub tags: Vec<String>,
    pub folders: Vec<String>,
}

impl ItemListQuery {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset", offset.to_string()));
        }
        if let Some(ref order_by) = self.order_by {
            query.push(("orderBy", order_by.clone()));
        }
        if let Some(ref keyword) = self.keyword {
            query.push(("keyword", keyword.clone()));
        }
        if let Some(ref ext) = self.ext {
            query.push(("ext", ext.clone()));
        }
        if !self.tags.is_empty() {
            query.push(("tags", self.tags.join(",")));
        }
        if !self.folders.is_empty() {
            query.push(("folders", self.folders.join(",")));
        }
        query
    }
}

/// Fields to change on an existing item. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Rating from 0 to 5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star: Option<u8>,
}

impl ItemUpdate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Keep the items whose name starts with `prefix`. An empty prefix keeps all.
pub(crate) fn filter_by_prefix(items: Vec<Item>, prefix: &str) -> Vec<Item> {
    if prefix.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| item.name.starts_with(prefix))
        .collect()
}

/// The new item's id, when Eagle reports one.
fn created_id(data: Option<Value>) -> Option<String> {
    match data {
        Some(Value::String(id)) => Some(id),
        Some(Value::Object(map)) => map.get("id").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

impl EagleClient {
    /// `POST /api/item/addFromURL`
    ///
    /// Returns the new item's id when Eagle includes it in the answer.
    pub async fn add_from_url(&self, item: &AddFromUrl) -> Result<Option<String>> {
        log::info!("Adding {} from {}", item.name, item.url);
        let data = self.post("/api/item/addFromURL", item).await?;
        Ok(created_id(data))
    }

    /// `POST /api/item/addFromURLs`
    pub async fn add_from_urls(&self, items: &[AddFromUrl], folder_id: Option<&str>) -> Result<()> {
        let mut body = json!({ "items": items });
        if let Some(folder_id) = folder_id {
            body["folderId"] = json!(folder_id);
        }
        self.post("/api/item/addFromURLs", &body).await?;
        Ok(())
    }

    /// `POST /api/item/addFromPath`
    pub async fn add_from_path(&self, item: &AddFromPath) -> Result<Option<String>> {
        log::info!("Adding {} from {}", item.name, item.path);
        let data = self.post("/api/item/addFromPath", item).await?;
        Ok(created_id(data))
    }

    /// `POST /api/item/addFromPaths`
    pub async fn add_from_paths(&self, items: &[AddFromPath], folder_id: Option<&str>) -> Result<()> {
        let mut body = json!({ "items": items });
        if let Some(folder_id) = folder_id {
            body["folderId"] = json!(folder_id);
        }
        self.post("/api/item/addFromPaths", &body).await?;
        Ok(())
    }

    /// `POST /api/item/addBookmark`
    pub async fn add_bookmark(&self, bookmark: &AddBookmark) -> Result<Option<String>> {
        let data = self.post("/api/item/addBookmark", bookmark).await?;
        Ok(created_id(data))
    }

    /// `GET /api/item/info`
    pub async fn item_info(&self, id: &str) -> Result<Item> {
        self.get("/api/item/info", &[("id", id.to_string())]).await
    }

    /// `GET /api/item/thumbnail` — local path of the item's thumbnail.
    pub async fn item_thumbnail(&self, id: &str) -> Result<String> {
        self.get("/api/item/thumbnail", &[("id", id.to_string())]).await
    }

    /// `GET /api/item/list`
    pub async fn list_items(&self, query: &ItemListQuery) -> Result<Vec<Item>> {
        self.get("/api/item/list", &query.to_query()).await
    }

    /// List up to `limit` items and keep those whose name starts with `prefix`.
    ///
    /// The filter runs client side, after the limit is applied by Eagle.
    pub async fn list_items_with_prefix(&self, limit: usize, prefix: &str) -> Result<Vec<Item>> {
        let items = self.list_items(&ItemListQuery::with_limit(limit)).await?;
        Ok(filter_by_prefix(items, prefix))
    }

    /// `POST /api/item/moveToTrash`
    pub async fn move_to_trash(&self, item_ids: &[String]) -> Result<()> {
        self.post("/api/item/moveToTrash", &json!({ "itemIds": item_ids })).await?;
        Ok(())
    }

    /// `POST /api/item/refreshPalette`
    pub async fn refresh_palette(&self, id: &str) -> Result<()> {
        self.post("/api/item/refreshPalette", &json!({ "id": id })).await?;
        Ok(())
    }

    /// `POST /api/item/refreshThumbnail`
    pub async fn refresh_thumbnail(&self, id: &str) -> Result<()> {
        self.post("/api/item/refreshThumbnail", &json!({ "id": id })).await?;
        Ok(())
    }

    /// `POST /api/item/update`
    pub async fn update_item(&self, update: &ItemUpdate) -> Result<Item> {
        self.post_for("/api/item/update", update).await
    }

    /// Replace the tags of an item.
    pub async fn set_tags(&self, id: &str, tags: &[String]) -> Result<Item> {
        let update = ItemUpdate {
            tags: Some(tags.to_vec()),
            ..ItemUpdate::new(id)
        };
        self.update_item(&update).await
    }
}
