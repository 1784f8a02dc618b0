//! 书籍 DTO
//!
//! 定义书籍检索与缓存相关的请求和响应数据结构。

use serde::{Deserialize, Serialize};

use crate::models::book::{BookRecord, SimilarQuery};

/// `GET /books?search=` 查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// 带可选 limit 的查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LimitParams {
    pub limit: Option<u32>,
}

/// 缓存中的书籍
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedBooksResponse {
    pub cached_books: Vec<BookRecord>,
}

/// 相似书籍请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimilarBooksRequest {
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub language: String,
    pub limit: Option<u32>,
}

impl SimilarBooksRequest {
    pub fn into_query(self, default_limit: u32) -> SimilarQuery {
        SimilarQuery {
            authors: self.authors,
            categories: self.categories,
            language: self.language.trim().to_string(),
            limit: self.limit.unwrap_or(default_limit),
        }
    }
}

/// 相似书籍响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarBooksResponse {
    pub similar_books: Vec<BookRecord>,
}

/// 只有一条消息的响应
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
