//! 类型缓存
//!
//! 按书籍类型预先缓存一小批书，读取时不再访问外部数据源。
//!
//! 一次填充是全有或全无的：所有类型都取回后才统一提交，任何一个类型失败都不会
//! 改动已有条目。每个条目以 `Arc<Vec<_>>` 整体替换，读者看到的要么是旧列表，
//! 要么是完整的新列表。

use dashmap::DashMap;
use futures_util::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::book::{BookRecord, SimilarQuery, normalize_genre};
use crate::services::book_source::{BookSource, MAX_RESULTS_PER_REQUEST};

/// 实时检索返回的最大条数
pub const SEARCH_RESULT_LIMIT: u32 = 5;

/// 一次填充的结果
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationReport {
    /// 已填充的类型
    pub genres: Vec<String>,
    /// 缓存的书籍总数
    pub total_books: usize,
    /// 每个类型的上限
    pub limit: u32,
}

/// 类型缓存
pub struct GenreCache {
    source: Arc<dyn BookSource>,
    entries: DashMap<String, Arc<Vec<BookRecord>>>,
    /// 每个类型下一次填充的起始位置；同时用于串行化填充
    offsets: Mutex<HashMap<String, u32>>,
}

impl GenreCache {
    pub fn new(source: Arc<dyn BookSource>) -> Self {
        Self {
            source,
            entries: DashMap::new(),
            offsets: Mutex::new(HashMap::new()),
        }
    }

    /// 为每个类型取回最多 `limit` 本书并替换缓存条目
    pub async fn populate_all(&self, genres: &[String], limit: u32) -> Result<PopulationReport> {
        if limit == 0 || limit > MAX_RESULTS_PER_REQUEST {
            return Err(AppError::MalformedRequest(format!(
                "limit must be within 1..={}, got {}",
                MAX_RESULTS_PER_REQUEST, limit
            )));
        }

        let mut genres: Vec<String> = genres
            .iter()
            .map(|g| normalize_genre(g))
            .filter(|g| !g.is_empty())
            .collect();
        genres.sort();
        genres.dedup();

        let mut offsets = self.offsets.lock().await;

        let fetches = genres.iter().map(|genre| {
            let offset = offsets.get(genre).copied().unwrap_or(0);
            let source = Arc::clone(&self.source);
            async move {
                let mut books = source.by_genre(genre, limit, offset).await.map_err(|e| {
                    warn!(genre = %genre, "Failed to fetch books for cache: {}", e);
                    e
                })?;
                books.truncate(limit as usize);
                Ok::<_, AppError>((genre.clone(), books))
            }
        });
        let fetched = try_join_all(fetches).await?;

        let mut total_books = 0;
        for (genre, books) in fetched {
            let offset = offsets.entry(genre.clone()).or_insert(0);
            if books.is_empty() {
                // 数据源已翻到底：保留上一轮的条目，下次从头开始
                debug!(genre = %genre, "No books returned, resetting offset");
                *offset = 0;
                let entry = self.entries.entry(genre).or_default();
                total_books += entry.len();
                continue;
            }

            *offset += limit;
            total_books += books.len();
            self.entries.insert(genre, Arc::new(books));
        }

        info!(
            genres = genres.len(),
            total_books, limit, "Genre cache populated"
        );

        Ok(PopulationReport {
            genres,
            total_books,
            limit,
        })
    }

    /// 读取缓存中的类型列表，不访问数据源
    pub fn lookup(&self, genre: &str) -> Result<Arc<Vec<BookRecord>>> {
        let key = normalize_genre(genre);
        self.entries
            .get(&key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AppError::GenreNotCached(genre.trim().to_string()))
    }

    /// 绕过缓存实时检索，最多 5 条
    pub async fn search_fresh(&self, query: &str) -> Result<Vec<BookRecord>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::MalformedRequest(
                "search query cannot be empty".to_string(),
            ));
        }

        let mut books = self.source.search(query, SEARCH_RESULT_LIMIT).await?;
        books.truncate(SEARCH_RESULT_LIMIT as usize);
        Ok(books)
    }

    /// 绕过缓存按类型实时查询，最多 `limit` 条
    pub async fn lookup_by_genre_live(&self, genre: &str, limit: u32) -> Result<Vec<BookRecord>> {
        let genre = normalize_genre(genre);
        if genre.is_empty() {
            return Err(AppError::MalformedRequest(
                "genre cannot be empty".to_string(),
            ));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut books = self.source.by_genre(&genre, limit, 0).await?;
        books.truncate(limit as usize);
        Ok(books)
    }

    /// 实时检索相似书籍
    pub async fn similar_live(&self, query: &SimilarQuery) -> Result<Vec<BookRecord>> {
        if query.authors.is_empty() || query.categories.is_empty() || query.language.is_empty() {
            return Err(AppError::MalformedRequest(
                "authors, categories and language are all required to fetch similar books"
                    .to_string(),
            ));
        }

        let mut books = self.source.similar(query).await?;
        books.truncate(query.limit as usize);
        Ok(books)
    }

    /// 已缓存的类型（排序后）
    pub fn cached_genres(&self) -> Vec<String> {
        let mut genres: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        genres.sort();
        genres
    }
}
