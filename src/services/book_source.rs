//! 书籍数据源
//!
//! `BookSource` 是外部书籍检索服务的抽象，`GoogleBooksSource` 基于
//! Google Books volumes 接口实现。

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::config::BooksConfig;
use crate::error::{AppError, Result};
use crate::models::book::{BookRecord, PLACEHOLDER_COVER, SimilarQuery};

/// Google Books 单次请求的最大条数
pub const MAX_RESULTS_PER_REQUEST: u32 = 40;

const VOLUME_FIELDS: &str = "items(id,volumeInfo/title,volumeInfo/authors,volumeInfo/publisher,\
volumeInfo/publishedDate,volumeInfo/description,volumeInfo/pageCount,volumeInfo/categories,\
volumeInfo/imageLinks/thumbnail,volumeInfo/language)";

/// 外部书籍数据源
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookSource: Send + Sync {
    /// 按类型获取最多 `limit` 本书，从第 `offset` 条开始
    async fn by_genre(&self, genre: &str, limit: u32, offset: u32) -> Result<Vec<BookRecord>>;

    /// 按标题、作者或 ISBN 检索，最多 `limit` 条
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<BookRecord>>;

    /// 检索与给定作者、分类、语言相似的书
    async fn similar(&self, query: &SimilarQuery) -> Result<Vec<BookRecord>>;
}

/// 长度为 10 或 13 的纯数字视为 ISBN
pub fn is_isbn(query: &str) -> bool {
    (query.len() == 10 || query.len() == 13) && query.chars().all(|c| c.is_ascii_digit())
}

/// `2004-05-01` 转为 `May 01, 2004`，其他格式原样保留
pub fn format_published_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date.format("%B %d, %Y").to_string()),
        Err(_) => Some(raw.to_string()),
    }
}

#[derive(Debug, Deserialize, Default)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(default)]
    id: String,
    #[serde(default, rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct VolumeInfo {
    title: String,
    authors: Vec<String>,
    publisher: String,
    published_date: Option<String>,
    description: String,
    page_count: u32,
    categories: Vec<String>,
    image_links: Option<ImageLinks>,
    language: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl From<Volume> for BookRecord {
    fn from(volume: Volume) -> Self {
        let info = volume.volume_info;
        BookRecord {
            id: volume.id,
            title: info.title,
            authors: info.authors,
            publisher: info.publisher,
            published_date: info
                .published_date
                .as_deref()
                .and_then(format_published_date),
            description: info.description,
            page_count: info.page_count,
            categories: info.categories,
            image_url: info
                .image_links
                .and_then(|links| links.thumbnail)
                .unwrap_or_else(|| PLACEHOLDER_COVER.to_string()),
            language: info.language,
            genre: None,
        }
    }
}

/// Google Books 客户端
pub struct GoogleBooksSource {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl GoogleBooksSource {
    pub fn new(api_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn fetch(&self, mut params: Vec<(&'static str, String)>) -> Result<Vec<BookRecord>> {
        params.push(("fields", VOLUME_FIELDS.to_string()));
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, "Google Books request failed: {}", error_text);
            return Err(AppError::Upstream(format!(
                "Google Books responded with {}",
                status
            )));
        }

        let volumes: VolumesResponse = response.json().await?;
        debug!("Google Books returned {} volumes", volumes.items.len());
        Ok(volumes.items.into_iter().map(BookRecord::from).collect())
    }
}

#[async_trait]
impl BookSource for GoogleBooksSource {
    async fn by_genre(&self, genre: &str, limit: u32, offset: u32) -> Result<Vec<BookRecord>> {
        let limit = limit.min(MAX_RESULTS_PER_REQUEST);
        let mut books = self
            .fetch(vec![
                ("q", format!("subject:{}", genre)),
                ("maxResults", limit.to_string()),
                ("startIndex", offset.to_string()),
            ])
            .await?;

        books.truncate(limit as usize);
        for book in &mut books {
            book.genre = Some(genre.to_string());
        }
        Ok(books)
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<BookRecord>> {
        let limit = limit.min(MAX_RESULTS_PER_REQUEST);
        let params = if is_isbn(query) {
            vec![("q", format!("isbn:{}", query))]
        } else {
            vec![("q", query.to_string()), ("maxResults", limit.to_string())]
        };

        let mut books = self.fetch(params).await?;
        books.truncate(limit as usize);
        Ok(books)
    }

    async fn similar(&self, query: &SimilarQuery) -> Result<Vec<BookRecord>> {
        let limit = query.limit.min(MAX_RESULTS_PER_REQUEST);
        let mut books = self
            .fetch(vec![
                ("q", query.to_search_terms()),
                ("langRestrict", query.language.clone()),
                ("maxResults", limit.to_string()),
                ("orderBy", "relevance".to_string()),
            ])
            .await?;

        books.truncate(limit as usize);
        Ok(books)
    }
}

/// 根据配置创建书籍数据源
pub fn create_book_source(config: &BooksConfig) -> Result<Box<dyn BookSource>> {
    let source = GoogleBooksSource::new(
        &config.api_url,
        config.api_key.clone(),
        Duration::from_secs(config.timeout_secs),
    )?;
    Ok(Box::new(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0123456789", true)]
    #[case("9780143127741", true)]
    #[case("012345678", false)]
    #[case("97801431277X1", false)]
    #[case("dune", false)]
    fn test_is_isbn(#[case] query: &str, #[case] expected: bool) {
        assert_eq!(is_isbn(query), expected);
    }

    #[rstest]
    #[case("2004-05-01", Some("May 01, 2004"))]
    #[case("2004", Some("2004"))]
    #[case("2004-05", Some("2004-05"))]
    #[case("  ", None)]
    fn test_format_published_date(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(format_published_date(raw).as_deref(), expected);
    }

    #[test]
    fn test_volume_mapping_defaults() {
        let json = serde_json::json!({
            "items": [
                {
                    "id": "vol1",
                    "volumeInfo": {
                        "title": "The Hobbit",
                        "authors": ["J.R.R. Tolkien"],
                        "pageCount": 310,
                        "publishedDate": "1937-09-21",
                        "imageLinks": { "thumbnail": "http://covers/hobbit.jpg" }
                    }
                },
                { "id": "vol2" }
            ]
        });

        let response: VolumesResponse = serde_json::from_value(json).unwrap();
        let books: Vec<BookRecord> = response.items.into_iter().map(BookRecord::from).collect();

        assert_eq!(books[0].title, "The Hobbit");
        assert_eq!(books[0].page_count, 310);
        assert_eq!(books[0].published_date.as_deref(), Some("September 21, 1937"));
        assert_eq!(books[0].image_url, "http://covers/hobbit.jpg");
        assert_eq!(books[1].image_url, PLACEHOLDER_COVER);
        assert!(books[1].authors.is_empty());
    }

    #[test]
    fn test_missing_items_is_empty() {
        let response: VolumesResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
    }
}
