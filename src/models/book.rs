//! 书籍模型
//!
//! `BookRecord` 只由 `BookSource` 产生，缓存和服务层不会修改它。

use serde::{Deserialize, Serialize};

/// 没有封面时使用的占位图
pub const PLACEHOLDER_COVER: &str = "https://via.placeholder.com/200x300.png?text=No+Cover";

/// 书籍记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    /// 提供方的书籍 ID
    pub id: String,
    /// 标题
    pub title: String,
    /// 作者列表
    pub authors: Vec<String>,
    /// 出版社
    pub publisher: String,
    /// 出版日期（已格式化）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// 简介
    pub description: String,
    /// 页数
    pub page_count: u32,
    /// 分类
    pub categories: Vec<String>,
    /// 封面地址
    #[serde(rename = "image_url")]
    pub image_url: String,
    /// 语言代码
    pub language: String,
    /// 通过类型查询得到时记录的类型
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl BookRecord {
    /// 创建只有 ID 和标题的记录，其余字段为空
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            publisher: String::new(),
            published_date: None,
            description: String::new(),
            page_count: 0,
            categories: Vec::new(),
            image_url: PLACEHOLDER_COVER.to_string(),
            language: String::new(),
            genre: None,
        }
    }

    /// 设置类型
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }
}

/// 相似书籍查询
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarQuery {
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub language: String,
    pub limit: u32,
}

impl SimilarQuery {
    /// 拼接成 `inauthor:.. subject:..` 形式的检索式
    pub fn to_search_terms(&self) -> String {
        let authors = self
            .authors
            .iter()
            .map(|a| format!("inauthor:{}", a.trim()));
        let subjects = self
            .categories
            .iter()
            .map(|c| format!("subject:{}", c.trim()));
        authors.chain(subjects).collect::<Vec<_>>().join(" ")
    }
}

/// 规范化类型名称：去掉首尾空白并转小写
pub fn normalize_genre(genre: &str) -> String {
    genre.trim().to_lowercase()
}
