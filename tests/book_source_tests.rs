// Integration tests for the outbound HTTP clients
//
// Tests cover:
// - Google Books query construction and volume mapping
// - Upstream failures surfacing as Upstream errors
// - HTTP mail gateway payload and authentication

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfquest::error::AppError;
use shelfquest::models::account::EmailMessage;
use shelfquest::models::book::{PLACEHOLDER_COVER, SimilarQuery};
use shelfquest::services::book_source::{BookSource, GoogleBooksSource};
use shelfquest::services::notification::{HttpMailGateway, NotificationGateway};

fn volumes(count: usize) -> serde_json::Value {
    let items: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "id": format!("vol{}", i),
                "volumeInfo": {
                    "title": format!("Volume {}", i),
                    "authors": ["Ursula K. Le Guin"],
                    "publishedDate": "1968-11-01",
                    "categories": ["Fiction"],
                    "language": "en"
                }
            })
        })
        .collect();
    json!({ "items": items })
}

fn source_for(server: &MockServer, api_key: Option<&str>) -> GoogleBooksSource {
    GoogleBooksSource::new(
        &format!("{}/volumes", server.uri()),
        api_key.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_by_genre_queries_subject_with_offset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/volumes"))
        .and(query_param("q", "subject:fantasy"))
        .and(query_param("maxResults", "3"))
        .and(query_param("startIndex", "6"))
        .and(query_param("key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(3)))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server, Some("secret"));
    let books = source.by_genre("fantasy", 3, 6).await.unwrap();

    assert_eq!(books.len(), 3);
    assert_eq!(books[0].id, "vol0");
    assert_eq!(books[0].genre.as_deref(), Some("fantasy"));
    assert_eq!(books[0].published_date.as_deref(), Some("November 01, 1968"));
    assert_eq!(books[0].image_url, PLACEHOLDER_COVER);
}

#[tokio::test]
async fn test_search_by_isbn_uses_isbn_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "isbn:9780441013593"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(1)))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server, None);
    let books = source.search("9780441013593", 5).await.unwrap();
    assert_eq!(books.len(), 1);
}

#[tokio::test]
async fn test_search_truncates_to_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "earthsea"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(8)))
        .mount(&server)
        .await;

    let source = source_for(&server, None);
    let books = source.search("earthsea", 5).await.unwrap();
    assert_eq!(books.len(), 5);
}

#[tokio::test]
async fn test_similar_restricts_language() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("langRestrict", "en"))
        .and(query_param("orderBy", "relevance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volumes(2)))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server, None);
    let query = SimilarQuery {
        authors: vec!["Ursula K. Le Guin".into()],
        categories: vec!["Fiction".into()],
        language: "en".into(),
        limit: 7,
    };
    assert_eq!(source.similar(&query).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_response_yields_no_books() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let source = source_for(&server, None);
    assert!(source.by_genre("poetry", 5, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_status_is_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let source = source_for(&server, None);
    let err = source.by_genre("fantasy", 5, 0).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(msg) if msg.contains("503")));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(volumes(1))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let source = GoogleBooksSource::new(
        &format!("{}/volumes", server.uri()),
        None,
        Duration::from_millis(50),
    )
    .unwrap();
    let err = source.search("dune", 5).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));
}

#[tokio::test]
async fn test_mail_gateway_posts_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("Authorization", "Bearer mail-key"))
        .and(body_json(json!({
            "from": "no-reply@shelfquest.app",
            "to": "alice@example.com",
            "subject": "Verify your ShelfQuest email.",
            "text": "123456"
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpMailGateway::new(
        &format!("{}/send", server.uri()),
        Some("mail-key".into()),
        "no-reply@shelfquest.app",
        Duration::from_secs(5),
    )
    .unwrap();
    let message = EmailMessage {
        to: "alice@example.com".into(),
        subject: "Verify your ShelfQuest email.".into(),
        body: "123456".into(),
    };

    gateway.send(&message).await.unwrap();
}

#[tokio::test]
async fn test_mail_gateway_rejection_is_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = HttpMailGateway::new(
        &server.uri(),
        None,
        "no-reply@shelfquest.app",
        Duration::from_secs(5),
    )
    .unwrap();
    let message = EmailMessage {
        to: "bob@example.com".into(),
        subject: "subject".into(),
        body: "body".into(),
    };

    let err = gateway.send(&message).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));
}
