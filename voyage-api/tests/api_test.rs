use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use voyage_api::middleware::auth::SessionClaims;
use voyage_api::middleware::JwtSessionVerifier;
use voyage_api::{app, AppState, Providers};
use voyage_core::providers::{
    ChatAssistant, ChatReply, ChatRequest, FlightSearch, Geocoder, HotelSearch, SpeechSynthesizer, Transcriber,
    Transcription, TranscriptionMetadata, Translation, Translator,
};
use voyage_core::search::{
    Coordinates, FlightOffer, FlightQuery, HotelDetails, HotelDetailsQuery, HotelOffer, HotelQuery,
};
use voyage_core::CoreResult;
use voyage_store::app_config::CollectionIds;
use voyage_store::{DocumentRepositories, JsonFieldMode, MemoryDocumentStore, TracingEventSink};

const SECRET: &str = "integration-secret";
const FAKE_MP3: &[u8] = b"ID3\x04\x00fake-mpeg-frames";

// ============================================================================
// Stub providers
// ============================================================================

struct StubProviders;

#[async_trait]
impl ChatAssistant for StubProviders {
    async fn reply(&self, request: &ChatRequest) -> CoreResult<ChatReply> {
        let trip_plan = request
            .message
            .to_lowercase()
            .contains("goa")
            .then(|| json!({"destination": "Goa", "days": [{"day": 1, "activities": ["Baga beach"]}]}));
        Ok(ChatReply {
            reply: format!("({} turns) You said: {}", request.history.len(), request.message),
            trip_plan,
        })
    }
}

#[async_trait]
impl Translator for StubProviders {
    async fn translate(&self, text: &str, target: &str, source: Option<&str>) -> CoreResult<Translation> {
        Ok(Translation {
            translated_text: format!("[{}] {}", target, text),
            source_language: source.unwrap_or("hi").to_string(),
            target_language: target.to_string(),
            confidence: if source.is_some() { 1.0 } else { 0.92 },
        })
    }
}

#[async_trait]
impl FlightSearch for StubProviders {
    async fn search_flights(&self, query: &FlightQuery) -> CoreResult<Vec<FlightOffer>> {
        Ok(vec![FlightOffer {
            airline: "IndiGo".to_string(),
            airline_logo: None,
            flight_numbers: vec!["6E 2134".to_string()],
            departure_airport: query.origin.clone(),
            arrival_airport: query.destination.clone(),
            departure_time: format!("{} 06:10", query.outbound_date),
            arrival_time: format!("{} 08:25", query.outbound_date),
            duration_minutes: Some(135),
            stops: 0,
            price: Some(5421.0),
            currency: query.currency.clone(),
            booking_token: Some("WyJDalJJ".to_string()),
        }])
    }
}

#[async_trait]
impl HotelSearch for StubProviders {
    async fn search_hotels(&self, query: &HotelQuery) -> CoreResult<Vec<HotelOffer>> {
        Ok(vec![HotelOffer {
            name: format!("Seaside Inn, {}", query.location),
            property_token: Some("ChgIkL6".to_string()),
            rate_per_night: Some(4200.0),
            total_rate: Some(8400.0),
            currency: query.currency.clone(),
            rating: Some(4.2),
            reviews: Some(880),
            hotel_class: Some("3-star hotel".to_string()),
            thumbnail: None,
            amenities: vec!["Pool".to_string()],
            coordinates: None,
        }])
    }

    async fn hotel_details(&self, query: &HotelDetailsQuery) -> CoreResult<HotelDetails> {
        Ok(HotelDetails {
            name: "Seaside Inn".to_string(),
            address: None,
            phone: None,
            description: None,
            link: None,
            rating: Some(4.2),
            reviews: None,
            rate_per_night: Some(4200.0),
            total_rate: None,
            currency: query.currency.clone(),
            amenities: Vec::new(),
            images: Vec::new(),
            prices: Vec::new(),
            coordinates: None,
        })
    }
}

#[async_trait]
impl Geocoder for StubProviders {
    async fn geocode(&self, address: &str) -> CoreResult<Option<Coordinates>> {
        Ok(Some(Coordinates {
            latitude: 15.5439,
            longitude: 73.7553,
            formatted_address: Some(address.to_string()),
        }))
    }
}

#[async_trait]
impl SpeechSynthesizer for StubProviders {
    async fn synthesize(&self, _text: &str, _voice_id: Option<&str>) -> CoreResult<Vec<u8>> {
        Ok(FAKE_MP3.to_vec())
    }
}

#[async_trait]
impl Transcriber for StubProviders {
    async fn transcribe(&self, audio: &[u8], language: Option<&str>) -> CoreResult<Transcription> {
        Ok(Transcription {
            text: " Plan three days in Goa ".to_string(),
            metadata: TranscriptionMetadata {
                language: language.unwrap_or("en").to_string(),
                duration: audio.len() as f64 / 1000.0,
                segments: 1,
                confidence: 0.9,
            },
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn test_app() -> Router {
    let repos = Arc::new(DocumentRepositories::new(
        Arc::new(MemoryDocumentStore::new()),
        CollectionIds::default(),
        JsonFieldMode::default(),
    ));
    let stub = Arc::new(StubProviders);
    let providers = Providers {
        chat: stub.clone(),
        translator: stub.clone(),
        flights: stub.clone(),
        hotels: stub.clone(),
        geocoder: stub.clone(),
        speech: stub.clone(),
        transcriber: stub,
    };
    let state = AppState::new(
        repos,
        Arc::new(TracingEventSink),
        Arc::new(JwtSessionVerifier::new(SECRET)),
        providers,
    );
    app(state)
}

fn token(sub: &str) -> String {
    let claims = SessionClaims {
        sub: sub.to_string(),
        name: Some("Asha Verma".to_string()),
        email: Some(format!("{}@example.com", sub)),
        role: Some("user".to_string()),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-Appwrite-JWT", token);
    }
    builder.body(Body::empty()).unwrap()
}

/// (field name, file name, bytes)
fn multipart_request(uri: &str, fields: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let boundary = "voyage-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    for (name, filename, data) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        let disposition = match filename {
            Some(file) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: audio/webm\r\n\r\n",
                name, file
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn hotel_booking() -> Value {
    json!({
        "type": "hotel",
        "fare_total": 12500,
        "currency": "INR",
        "contact_info": {"name": "Asha Verma", "phone": "+91 98000 00000"},
        "details": {"hotel": "Seaside Inn", "check_in": "2025-03-14", "nights": 2},
        "provider": "serpapi"
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_user_endpoints_require_a_session() {
    let app = test_app();

    for uri in ["/api/save-booking", "/api/save-payment", "/api/save-trip-plan"] {
        let (status, body) = send(&app, json_request("POST", uri, None, json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert!(body["error"].is_string());
    }
    for uri in ["/api/my-bookings", "/api/my-saved-plans", "/api/notifications"] {
        let (status, _) = send(&app, get_request(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let (status, _) = send(
        &app,
        json_request("POST", "/api/save-booking", Some("not.a.jwt"), hotel_booking()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_save_booking_then_pay() {
    let app = test_app();
    let session = token("user_01");

    let (status, body) = send(
        &app,
        json_request("POST", "/api/save-booking", Some(&session), hotel_booking()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["payment_status"], "pending");
    let booking_id = body["booking_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/save-payment",
            Some(&session),
            json!({"booking_id": booking_id, "method": "upi", "status": "paid", "transaction_id": "UPI-88123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "paid");
    assert_eq!(body["booking_payment_status"], "confirmed");
    assert!(body["payment_id"].is_string());

    let (status, body) = send(&app, get_request("/api/my-bookings", Some(&session))).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["id"], booking_id.as_str());
    assert_eq!(bookings[0]["type"], "hotel");
    assert_eq!(bookings[0]["payment_status"], "confirmed");
    assert_eq!(bookings[0]["details"]["nights"], 2);

    let (status, body) = send(&app, get_request("/api/notifications", Some(&session))).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&"booking_created"));
    assert!(kinds.contains(&"payment_paid"));
}

#[tokio::test]
async fn test_booking_validation_errors() {
    let app = test_app();
    let session = token("user_01");

    let (status, body) = send(
        &app,
        json_request("POST", "/api/save-booking", Some(&session), json!({"type": "hotel", "currency": "INR"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("fare_total"));

    let mut booking = hotel_booking();
    booking["type"] = json!("cruise");
    let (status, _) = send(&app, json_request("POST", "/api/save-booking", Some(&session), booking)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri("/api/save-booking")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", session))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_payment_needs_an_owned_booking() {
    let app = test_app();
    let owner = token("user_01");
    let stranger = token("user_02");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/save-payment",
            Some(&owner),
            json!({"booking_id": "no-such-booking", "method": "card", "amount": 100}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, body) = send(
        &app,
        json_request("POST", "/api/save-booking", Some(&owner), hotel_booking()),
    )
    .await;
    let booking_id = body["booking_id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/save-payment",
            Some(&stranger),
            json!({"booking_id": booking_id, "method": "card", "status": "paid"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, get_request("/api/my-bookings", Some(&owner))).await;
    assert_eq!(body["bookings"][0]["payment_status"], "pending");
}

#[tokio::test]
async fn test_trip_plan_round_trip() {
    let app = test_app();
    let session = token("user_01");
    let plan = json!({
        "destination": "Jaipur",
        "days": [
            {"day": 1, "title": "Pink City", "activities": ["Hawa Mahal", "City Palace"]},
            {"day": 2, "title": "Forts", "activities": ["Amber Fort"]}
        ]
    });

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/save-trip-plan",
            Some(&session),
            json!({"title": "Jaipur weekend", "trip_plan": plan, "metadata": {"source": "chat-voice"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let plan_id = body["plan_id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        json_request("POST", "/api/save-trip-plan", Some(&session), json!({"title": "empty"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get_request("/api/my-saved-plans", Some(&session))).await;
    assert_eq!(status, StatusCode::OK);
    let plans = body["plans"].as_array().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0]["id"], plan_id.as_str());
    assert_eq!(plans[0]["title"], "Jaipur weekend");
    assert_eq!(plans[0]["trip_plan"], plan);

    let (_, body) = send(&app, get_request("/api/my-saved-plans", Some(&token("user_02")))).await;
    assert_eq!(body["plans"], json!([]));
}

#[tokio::test]
async fn test_chat_text() {
    let app = test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/chat-text",
            None,
            json!({
                "message": "Plan 3 days in Goa",
                "history": [{"role": "user", "content": "Hi"}, {"role": "assistant", "content": "Hello!"}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "(2 turns) You said: Plan 3 days in Goa");
    assert_eq!(body["trip_plan"]["destination"], "Goa");
    assert_eq!(body["language"], "en");

    let (status, body) = send(&app, json_request("POST", "/api/chat-text", None, json!({"message": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "'message' is required");
}

#[tokio::test]
async fn test_chat_voice_speaks_reply() {
    let app = test_app();
    let req = multipart_request(
        "/api/chat-voice",
        &[
            ("audio", Some("clip.webm"), b"\x1aE\xdf\xa3webm-audio"),
            ("language", None, b"en"),
            ("history", None, br#"[{"role": "user", "content": "Hi"}]"#),
            ("speak", None, b"true"),
        ],
    );

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcript"], "Plan three days in Goa");
    assert_eq!(body["reply"], "(1 turns) You said: Plan three days in Goa");
    assert_eq!(body["trip_plan"]["destination"], "Goa");
    assert_eq!(body["transcription"]["language"], "en");
    assert_eq!(body["audio_base64"], STANDARD.encode(FAKE_MP3));

    let req = multipart_request("/api/chat-voice", &[("language", None, b"en")]);
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_speech_endpoints() {
    let app = test_app();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/text-to-speech", None, json!({"text": "Welcome to Goa"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], FAKE_MP3);

    let (status, _) = send(&app, json_request("POST", "/api/text-to-speech", None, json!({"text": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = multipart_request("/api/speech-to-text", &[("audio", Some("clip.webm"), b"0123456789")]);
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], " Plan three days in Goa ");
    assert_eq!(body["metadata"]["segments"], 1);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/translate",
            None,
            json!({"text": "नमस्ते, आप कैसे हैं?", "target_language": "en"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source_language"], "hi");
    assert_eq!(body["target_language"], "en");

    let (status, _) = send(&app, json_request("POST", "/api/translate", None, json!({"text": "hello"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_endpoints() {
    let app = test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/flights/search",
            None,
            json!({"origin": "del", "destination": "bom", "outbound_date": "2025-03-14"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flights"][0]["departure_airport"], "DEL");
    assert_eq!(body["flights"][0]["currency"], "INR");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/flights/search",
            None,
            json!({"origin": "DEL", "destination": "DEL", "outbound_date": "2025-03-14"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/hotel-search",
            None,
            json!({"location": "Goa", "check_in": "2025-03-14", "check_out": "2025-03-16"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hotels"][0]["name"], "Seaside Inn, Goa");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/hotel-details",
            None,
            json!({
                "property_token": "ChgIkL6",
                "location": "Calangute, Goa",
                "check_in": "2025-03-14",
                "check_out": "2025-03-16"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hotel"]["name"], "Seaside Inn");
    assert_eq!(body["coordinates"]["formatted_address"], "Calangute, Goa");
}
