//! The response/error envelopes shared by every handler (§6).

use serde::Serialize;
use utoipa::ToSchema;

/// §6 "successful resource reads return `{data, links, meta}`".
#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseEnvelope<T: Serialize> {
    pub data: T,
    pub links: Links,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T: Serialize> ResponseEnvelope<T> {
    pub fn single(data: T, self_link: impl Into<String>) -> Self {
        Self {
            data,
            links: Links {
                self_link: self_link.into(),
                next: None,
                prev: None,
            },
            meta: None,
        }
    }

    pub fn paged(data: T, links: Links, meta: Meta) -> Self {
        Self {
            data,
            links,
            meta: Some(meta),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_records: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[derive(Debug, serde::Deserialize, ToSchema)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}
