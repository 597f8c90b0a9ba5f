//! Backend client tests against a mock HTTP server.

mod common;

use std::time::Duration;

use mtg_inventory::client::{ApiClient, ConnectionStatus};
use mtg_inventory::csv_codec::{self, CardLookup};
use mtg_inventory::collection::Collection;
use mtg_inventory::InventoryError;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a client for `base_url` on the blocking pool and run `f` with it.
/// Blocking clients must be created and dropped off the runtime threads.
async fn with_client<T, F>(base_url: String, f: F) -> T
where
    F: FnOnce(&ApiClient) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let client = ApiClient::new(base_url).unwrap();
        f(&client)
    })
    .await
    .unwrap()
}

/// A client for an address nothing listens on.
fn unreachable_client() -> ApiClient {
    ApiClient::builder()
        .base_url("http://127.0.0.1:9")
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[test]
fn builder_trims_trailing_slash() {
    let client = ApiClient::new("http://cards.local:3000/").unwrap();
    assert_eq!(client.base_url(), "http://cards.local:3000");
    assert_eq!(client.to_string(), "ApiClient(base_url=http://cards.local:3000)");
}

#[test]
fn builder_defaults_to_local_backend() {
    let client = ApiClient::builder().build().unwrap();
    assert_eq!(client.base_url(), "http://localhost:3000");
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_is_connected_on_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let status = with_client(mock_server.uri(), |c| c.status()).await;
    assert_eq!(status, ConnectionStatus::Connected);
}

#[tokio::test]
async fn status_is_disconnected_on_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let status = with_client(mock_server.uri(), |c| c.status()).await;
    assert!(!status.is_connected());
}

#[test]
fn status_is_disconnected_when_unreachable() {
    assert_eq!(unreachable_client().status(), ConnectionStatus::Disconnected);
}

// ---------------------------------------------------------------------------
// Sets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_sets_parses_catalog() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Modern Horizons 3", "code": "MH3", "keyruneCode": "MH3" },
            { "name": "Outlaws of Thunder Junction", "code": "OTJ" }
        ])))
        .mount(&mock_server)
        .await;

    let sets = with_client(mock_server.uri(), |c| c.list_sets()).await.unwrap();

    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].code, "MH3");
    assert_eq!(sets[0].keyrune_code, "MH3");
    assert_eq!(sets[1].keyrune_code, "");
}

#[tokio::test]
async fn set_names_parses_pairs() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/set-names"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "code": "LEA", "name": "Limited Edition Alpha" }
        ])))
        .mount(&mock_server)
        .await;

    let names = with_client(mock_server.uri(), |c| c.set_names()).await.unwrap();
    assert_eq!(names[0].name, "Limited Edition Alpha");
}

#[tokio::test]
async fn load_sets_posts_set_codes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sets"))
        .and(body_json(serde_json::json!({ "setCodes": ["M10"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "code": "M10",
            "name": "Magic 2010",
            "cards": [common::card_json("m1", "M10", "Lightning Bolt")]
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let sets = with_client(mock_server.uri(), |c| c.load_sets(&["M10".to_string()]))
        .await
        .unwrap();
    assert_eq!(sets[0].cards.len(), 1);
    assert_eq!(sets[0].cards[0].name, "Lightning Bolt");
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cards_by_set_codes_parses_cards() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cards/set-code"))
        .and(body_json(serde_json::json!({ "setCodes": ["OTJ", "MH3"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            common::card_json("o1", "OTJ", "Outlaw Stitcher"),
            common::card_json("h1", "MH3", "Flare of Fortitude")
        ])))
        .mount(&mock_server)
        .await;

    let cards = with_client(mock_server.uri(), |c| {
        c.cards_by_set_codes(&["OTJ".to_string(), "MH3".to_string()])
    })
    .await
    .unwrap();

    assert_eq!(cards.len(), 2);
    let card = &cards[0];
    assert_eq!(card.set_code, "OTJ");
    assert_eq!(card.type_line, "Instant");
    assert_eq!(card.colors, vec!["R"]);
    assert_eq!(card.extra.get("layout"), Some(&serde_json::json!("normal")));
    let retail = card.pricing.as_ref().unwrap().retail(false).unwrap();
    assert_eq!(retail.get("tcgplayer"), Some(&Some(0.5)));
    assert_eq!(retail.get("cardkingdom"), Some(&None));
}

#[tokio::test]
async fn cards_by_uuids_posts_uuid_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cards/uuid/"))
        .and(body_json(serde_json::json!({ "uuids": ["u1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            common::card_json("u1", "M10", "Shock")
        ])))
        .mount(&mock_server)
        .await;

    let cards = with_client(mock_server.uri(), |c| {
        CardLookup::cards_by_uuids(c, &["u1".to_string()])
    })
    .await
    .unwrap();
    assert_eq!(cards[0].uuid, "u1");
}

#[test]
fn empty_requests_do_not_hit_the_network() {
    let client = unreachable_client();
    assert!(client.cards_by_uuids(&[]).unwrap().is_empty());
    assert!(client.cards_by_set_codes(&[]).unwrap().is_empty());
    assert!(client.load_sets(&[]).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sets"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let err = with_client(mock_server.uri(), |c| c.list_sets())
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::InvalidResponse(_)));
}

#[tokio::test]
async fn http_error_status_is_http_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cards/set-code"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = with_client(mock_server.uri(), |c| c.cards_by_set_codes(&["M10".to_string()]))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::Http(_)));
}

// ---------------------------------------------------------------------------
// Last-Modified
// ---------------------------------------------------------------------------

#[tokio::test]
async fn last_modified_parses_header() {
    let mock_server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/AllPrintings.json.gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/AllPrintings.json.gz", mock_server.uri());
    let stamp = with_client(mock_server.uri(), move |c| c.last_modified(&url))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stamp.to_rfc3339(), "2015-10-21T07:28:00+00:00");
}

// ---------------------------------------------------------------------------
// Import through the client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn import_resolves_cards_through_backend() {
    common::init_logging();
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cards/uuid/"))
        .and(body_json(serde_json::json!({ "uuids": ["k1", "k2"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            common::card_json("k1", "M10", "Shock"),
            common::card_json("k2", "M10", "Lava Axe")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (summary, collection) = with_client(mock_server.uri(), |c| {
        let mut collection = Collection::new();
        let text = "cardIdentifier,quantity\nk1_M10_foil,2\nk2_M10_normal,1\nk1_M10_normal,1";
        let summary = csv_codec::import_csv(text, c, &mut collection);
        (summary, collection)
    })
    .await;

    let summary = summary.unwrap();
    assert_eq!(summary.entries, 3);
    assert_eq!(summary.total_quantity, 4);
    assert_eq!(collection.len(), 3);
}
