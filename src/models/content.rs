//! Published content: blogs, news posts and notifications

use serde::{Deserialize, Serialize};

use super::common::default_true;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subtitle: String,
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_true")]
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brief: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub live_link: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub is_trending: bool,
    #[serde(default = "default_true")]
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default)]
    pub read: bool,
    pub created_at: String,
    pub updated_at: String,
}
