use heritage_search::capture::{ImageFile, VoicePayload};
use heritage_search::config::ApiSettings;
use heritage_search::network::HttpClient;
use heritage_search::notify::{Notice, NoticeLevel, Notifier};
use heritage_search::orchestrator::{Phase, SearchOrchestrator, View};
use heritage_search::search::{FallbackGenerator, SearchClient, SearchQuery, SearchType};
use heritage_search::CaptureError;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct Notices(Mutex<Vec<Notice>>);

impl Notifier for Notices {
    fn notify(&self, notice: Notice) {
        self.0.lock().unwrap().push(notice);
    }
}

fn orchestrator_for(base_url: &str) -> (SearchOrchestrator, Arc<Notices>) {
    let api = ApiSettings {
        base_url: base_url.to_string(),
        ..ApiSettings::default()
    };
    let client = SearchClient::new(HttpClient::new().unwrap(), &api)
        .unwrap()
        .with_fallback(FallbackGenerator::with_seed(2024));
    let notices = Arc::new(Notices::default());
    (
        SearchOrchestrator::new(Arc::new(client), notices.clone()),
        notices,
    )
}

#[tokio::test]
async fn bihu_search_with_backend_down_uses_fallback() {
    let (orchestrator, notices) = orchestrator_for("http://127.0.0.1:9");
    assert!(matches!(orchestrator.view(), View::Gallery { .. }));

    let response = assert_ok!(orchestrator.search_text("Bihu").await);

    assert_eq!(response.results.len(), 5);
    assert_eq!(response.query, "Bihu");
    assert_eq!(response.search_type, SearchType::Text);
    assert_eq!(response.search_time, Some(0.35));

    let state = orchestrator.state();
    assert_eq!(state.phase(), Phase::Displayed);
    assert!(state.has_searched_once);
    assert!(matches!(orchestrator.view(), View::Results { .. }));
    // Fallback is silent to the user
    assert!(notices.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn six_megabyte_jpeg_is_rejected_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/imageSearch"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (orchestrator, notices) = orchestrator_for(&server.uri());
    let photo = ImageFile::new("rongali.jpg", "image/jpeg", vec![0xff; 6 * 1024 * 1024]);

    let err = assert_err!(orchestrator.search_image(photo).await);

    assert!(matches!(err, CaptureError::ImageTooLarge { .. }));
    let state = orchestrator.state();
    assert!(!state.is_searching);
    assert!(!state.has_searched_once);
    assert_eq!(state.phase(), Phase::Idle);

    let notices = notices.0.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn live_results_flow_through_to_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/textSearch"))
        .and(query_param("q", "Sattriya"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": "s1", "title": "Sattriya Nritya", "description": "Classical dance of Assam",
                 "sourceUrl": "https://heritage.example/sattriya", "category": "Art",
                 "tags": ["dance", "monastery"]}
            ],
            "totalResults": 31,
            "searchTime": 0.04,
            "query": "Sattriya",
            "searchType": "text"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/voiceSearch"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Speech service unavailable",
            "code": "STT_DOWN"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, notices) = orchestrator_for(&server.uri());

    let text = assert_ok!(orchestrator.search_text(" Sattriya ").await);
    assert_eq!(text.total_results, 31);
    assert!(!text.is_fallback());

    let voice = assert_ok!(
        orchestrator
            .submit(Ok(SearchQuery::Voice(VoicePayload::new(vec![0; 32], "audio/wav"))))
            .await
    );
    assert!(voice.is_fallback());
    assert_eq!(voice.search_type, SearchType::Voice);
    assert_eq!(voice.query, "voice query example");

    let state = orchestrator.state();
    assert_eq!(state.last_response.unwrap().search_type, SearchType::Voice);
    assert_eq!(
        notices.0.lock().unwrap().as_slice(),
        &[Notice::success("Voice search processed successfully")]
    );
}
