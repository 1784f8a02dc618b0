use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::book_dto::*, extract::AppJson},
    error::AppError,
    models::book::BookRecord,
    security::validation::{RequestValidator, validators},
    services::book_source::MAX_RESULTS_PER_REQUEST,
};

/// 健康检查中书籍数据源的名称
pub const BOOK_SOURCE: &str = "book_source";

pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = RequestValidator::sanitize_string(params.search.as_deref().unwrap_or_default());
    validators::validate_search_query(&query)?;
    debug!("Searching books: {}", query);

    let result = state.genre_cache.search_fresh(&query).await;
    state
        .observability
        .observe_upstream(BOOK_SOURCE, &result)
        .await;

    Ok(Json(result?))
}

pub async fn get_books_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(live_genre_books(&state, &genre, params).await?))
}

/// `/books/similar` 与 `/books/:genre` 共用路径；GET 仍按类型 "similar" 实时查询
pub async fn get_similar_genre_books(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(live_genre_books(&state, "similar", params).await?))
}

async fn live_genre_books(
    state: &AppState,
    genre: &str,
    params: LimitParams,
) -> Result<Vec<BookRecord>, AppError> {
    let limit = params.limit.unwrap_or(state.books.default_limit);
    validators::validate_limit(limit, MAX_RESULTS_PER_REQUEST)?;
    debug!("Fetching {} live books for genre: {}", limit, genre);

    let result = state.genre_cache.lookup_by_genre_live(genre, limit).await;
    state
        .observability
        .observe_upstream(BOOK_SOURCE, &result)
        .await;

    result
}

pub async fn populate_cache(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(state.books.cache_limit);
    validators::validate_limit(limit, MAX_RESULTS_PER_REQUEST)?;

    let result = state
        .genre_cache
        .populate_all(&state.books.genres, limit)
        .await;
    state
        .observability
        .observe_upstream(BOOK_SOURCE, &result)
        .await;
    let report = result?;
    state.observability.metrics.record_cache_population();

    Ok(Json(MessageResponse::new(format!(
        "Cache has been successfully set up with {} books in every genre.",
        report.limit
    ))))
}

pub async fn get_cached_books(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lookup = state.genre_cache.lookup(&genre);
    state
        .observability
        .metrics
        .record_cache_lookup(lookup.is_ok());

    let books = lookup?;
    Ok(Json(CachedBooksResponse {
        cached_books: books.as_ref().clone(),
    }))
}

pub async fn get_similar_books(
    State(state): State<AppState>,
    AppJson(request): AppJson<SimilarBooksRequest>,
) -> Result<impl IntoResponse, AppError> {
    let query = request.into_query(state.books.default_limit);
    validators::validate_limit(query.limit, MAX_RESULTS_PER_REQUEST)?;
    debug!("Fetching similar books: {}", query.to_search_terms());

    let result = state.genre_cache.similar_live(&query).await;
    state
        .observability
        .observe_upstream(BOOK_SOURCE, &result)
        .await;

    Ok(Json(SimilarBooksResponse {
        similar_books: result?,
    }))
}
