//! End-to-end flow: key entry, inventory bootstrap over HTTP, one protocol
//! turn against a mock generation endpoint, and recovery after a failed turn.

mod common;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use synapse::core::credentials::ApiKey;
use synapse::core::gateway::GenerationClient;
use synapse::core::inventory::InventoryLoader;
use synapse::core::session::{Session, Speaker};

async fn serve_inventories(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/Lab_equipments.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Equipment_Name": "PCR Thermocycler",
            "Available": "Yes"
        }])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lab_out.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Equipment_Name": "Electron Microscope",
            "Location": "Building 4"
        }])))
        .mount(server)
        .await;
}

async fn bootstrap(server: &MockServer) -> Session {
    let mut session = Session::new();
    session.submit_key("AIzaSyD12345abcdef").unwrap();
    let data = InventoryLoader::new()
        .load(
            &format!("{}/Lab_equipments.json", server.uri()),
            &format!("{}/lab_out.json", server.uri()),
        )
        .await
        .unwrap();
    session.data_loaded(data);
    session
}

#[tokio::test]
async fn full_protocol_turn() {
    let server = MockServer::start().await;
    serve_inventories(&server).await;

    // The outgoing prompt must embed both inventories and the description
    Mock::given(method("POST"))
        .and(path(common::generate_path()))
        .and(body_string_contains("Run a PCR"))
        .and(body_string_contains("PCR Thermocycler"))
        .and(body_string_contains("Electron Microscope"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            common::candidate_response("## Protocol\n1. Prepare the master mix.", "STOP"),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = bootstrap(&server).await;
    assert!(session.is_ready());
    let greeting_len = session.transcript().len();

    let prompt = session.begin_turn("Run a PCR").unwrap();
    assert!(session.is_in_flight());
    assert!(!session.can_send());

    let client = GenerationClient::new(
        &common::generation_config(&server),
        ApiKey::parse("AIzaSyD12345abcdef").unwrap(),
    );
    let outcome = client.generate(&prompt).await;
    session.finish_turn(outcome);

    // One user entry and one assistant entry were appended
    let transcript = session.transcript();
    assert_eq!(transcript.len(), greeting_len + 2);
    assert_eq!(transcript[greeting_len].speaker, Speaker::User);
    assert_eq!(transcript[greeting_len].text, "Run a PCR");
    assert_eq!(transcript[greeting_len + 1].speaker, Speaker::Synapse);
    assert!(transcript[greeting_len + 1].text.contains("master mix"));

    // Interaction is re-enabled for the next turn
    assert!(session.can_send());
}

#[tokio::test]
async fn failed_turn_leaves_session_usable() {
    let server = MockServer::start().await;
    serve_inventories(&server).await;
    Mock::given(method("POST"))
        .and(path(common::generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [],
            "promptFeedback": { "blockReason": "OTHER" }
        })))
        .mount(&server)
        .await;

    let mut session = bootstrap(&server).await;
    let prompt = session.begin_turn("something odd").unwrap();
    let client = GenerationClient::new(
        &common::generation_config(&server),
        ApiKey::parse("AIzaSyD12345abcdef").unwrap(),
    );
    session.finish_turn(client.generate(&prompt).await);

    let last = session.transcript().last().unwrap();
    assert_eq!(last.speaker, Speaker::System);
    assert!(last.text.starts_with("Error:"));
    // A block is not a credential problem: the session stays ready
    assert!(session.can_send());
}

#[tokio::test]
async fn each_turn_rebuilds_the_full_prompt() {
    let server = MockServer::start().await;
    serve_inventories(&server).await;
    Mock::given(method("POST"))
        .and(path(common::generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            common::candidate_response("Protocol text", "STOP"),
        ))
        .mount(&server)
        .await;

    let mut session = bootstrap(&server).await;
    let client = GenerationClient::new(
        &common::generation_config(&server),
        ApiKey::parse("AIzaSyD12345abcdef").unwrap(),
    );

    let first = session.begin_turn("first experiment").unwrap();
    session.finish_turn(client.generate(&first).await);
    let second = session.begin_turn("second experiment").unwrap();

    // Prior turns do not leak into the next prompt
    assert!(second.contains("second experiment"));
    assert!(!second.contains("first experiment"));
    assert!(second.contains("PCR Thermocycler"));
}
