//! Book Routes
//!
//! 书籍搜索、分类缓存与相似推荐路由。

use crate::api::handlers::book_handler::*;
use axum::{Router, routing::get};

use crate::api::app_state::AppState;

/// 创建书籍路由器
pub fn create_book_router() -> Router<AppState> {
    Router::new()
        .route("/books", get(search_books))
        .route("/books/cache", get(populate_cache))
        .route("/books/cache/:genre", get(get_cached_books))
        .route(
            "/books/similar",
            get(get_similar_genre_books).post(get_similar_books),
        )
        .route("/books/:genre", get(get_books_by_genre))
}
