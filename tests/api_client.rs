//! Integration tests for the PokeAPI client against a mock server
//!
//! Verifies URL construction, decoding, error mapping and that repeated
//! requests are answered from the response cache.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use pokedex::cache::ResponseCache;
use pokedex::data::{ApiError, PokeApiClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const PIKACHU_JSON: &str = r#"{
    "name": "pikachu",
    "base_experience": 112,
    "height": 4,
    "weight": 60,
    "stats": [{"base_stat": 35, "stat": {"name": "hp"}}],
    "types": [{"slot": 1, "type": {"name": "electric"}}]
}"#;

fn client_for(server: &MockServer) -> (PokeApiClient, Arc<ResponseCache>) {
    let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
    let client = PokeApiClient::with_base_url(Arc::clone(&cache), server.base_url());
    (client, cache)
}

#[tokio::test]
async fn test_pokemon_is_fetched_once_then_served_from_cache() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon/pikachu");
            then.status(200)
                .header("content-type", "application/json")
                .body(PIKACHU_JSON);
        })
        .await;
    let (client, cache) = client_for(&server);

    let first = client.pokemon("pikachu").await.unwrap();
    let second = client.pokemon("pikachu").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.base_experience, 112);
    assert_eq!(first.types[0].kind.name, "electric");
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&server.url("/pokemon/pikachu")).is_some());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_location_pages_follow_cursor_urls() {
    let server = MockServer::start_async().await;
    let page_two_url = server.url("/location-area-page-two");
    let first_body = format!(
        r#"{{"count": 3, "next": "{}", "previous": null,
            "results": [{{"name": "canalave-city-area", "url": "u1"}}, {{"name": "eterna-city-area", "url": "u2"}}]}}"#,
        page_two_url
    );
    let first = server
        .mock_async(|when, then| {
            when.method(GET).path("/location-area/");
            then.status(200).body(first_body);
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/location-area-page-two");
            then.status(200).body(
                r#"{"count": 3, "next": null, "previous": "ignored",
                    "results": [{"name": "pastoria-city-area", "url": "u3"}]}"#,
            );
        })
        .await;
    let (client, _cache) = client_for(&server);

    let page = client.location_areas(None).await.unwrap();
    assert_eq!(page.results.len(), 2);
    assert_eq!(page.next.as_deref(), Some(page_two_url.as_str()));

    let page = client.location_areas(page.next.as_deref()).await.unwrap();
    assert_eq!(page.results[0].name, "pastoria-city-area");
    assert!(page.next.is_none());

    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_location_area_lists_encounters() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/location-area/mt-coronet-1f-route-207");
            then.status(200).body(
                r#"{"name": "mt-coronet-1f-route-207", "pokemon_encounters": [
                    {"pokemon": {"name": "geodude", "url": "u"}},
                    {"pokemon": {"name": "zubat", "url": "u"}}]}"#,
            );
        })
        .await;
    let (client, _cache) = client_for(&server);

    let area = client
        .location_area("mt-coronet-1f-route-207")
        .await
        .unwrap();

    let names: Vec<_> = area
        .pokemon_encounters
        .iter()
        .map(|encounter| encounter.pokemon.name.as_str())
        .collect();
    assert_eq!(names, ["geodude", "zubat"]);
}

#[tokio::test]
async fn test_not_found_is_unexpected_status_and_not_cached() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon/missingno");
            then.status(404).body("Not Found");
        })
        .await;
    let (client, cache) = client_for(&server);

    let err = client.pokemon("missingno").await.unwrap_err();

    match &err {
        ApiError::UnexpectedStatus { status, url } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(url, &server.url("/pokemon/missingno"));
        }
        other => panic!("expected unexpected status, got {other:?}"),
    }
    assert!(err.to_string().contains("404"));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error_but_cached() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon/glitch");
            then.status(200).body("<html>oops</html>");
        })
        .await;
    let (client, cache) = client_for(&server);

    let err = client.pokemon("glitch").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
    assert_eq!(
        cache.get(&server.url("/pokemon/glitch")),
        Some(b"<html>oops</html>".to_vec())
    );
}

#[tokio::test]
async fn test_truncated_body_is_read_error_and_not_cached() {
    // Promises more bytes than it sends, then hangs up mid-body
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await.unwrap();
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 1000\r\n\r\n{\"name\":",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });
    let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
    let client = PokeApiClient::with_base_url(Arc::clone(&cache), base_url);

    let err = client.pokemon("pikachu").await.unwrap_err();

    assert!(matches!(err, ApiError::Read(_)), "got {err:?}");
    assert!(cache.is_empty());
}
