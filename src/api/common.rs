//! Query-string types shared by the list endpoints

use serde::Deserialize;

use crate::services::{clamp_limit, Page, DEFAULT_LIMIT};

/// `?limit=&startAfter=`
///
/// `limit` stays a string so that junk values fall back to the default
/// instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub limit: Option<String>,
    pub start_after: Option<String>,
}

impl ListParams {
    pub fn limit_or(&self, default: usize) -> usize {
        clamp_limit(self.limit.as_deref(), default)
    }

    pub fn page(&self) -> Page {
        Page::new(self.limit_or(DEFAULT_LIMIT))
            .after(self.start_after.clone().filter(|id| !id.is_empty()))
    }
}

/// `?status=&limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusParams {
    pub status: Option<String>,
    pub limit: Option<String>,
}

impl StatusParams {
    pub fn limit(&self) -> usize {
        clamp_limit(self.limit.as_deref(), DEFAULT_LIMIT)
    }
}
