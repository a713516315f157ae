//! HTTP API tests against a live server.
//!
//! Each test starts the router on a free port over an in-memory store (or
//! no store at all) and talks to it with reqwest.

use std::sync::Arc;

use ceap_backend::config::Config;
use ceap_backend::server::run_server_with_store;
use ceap_core::store::memory::InMemoryStore;
use ceap_core::store::DocumentStore;
use serde_json::Value;

const NOT_SAVED: &str = "DB non configurato: richiesta ricevuta ma non salvata.";

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/api/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Starts a server and returns its base url.
async fn start_server(store: Option<Arc<dyn DocumentStore>>) -> String {
    let port = find_free_port();
    let mut config = Config::default();
    config.server.bind = format!("127.0.0.1:{}", port);

    tokio::spawn(async move {
        let _ = run_server_with_store(&config, store).await;
    });
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}", port)
}

fn lead_form() -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("company", "ACME Srl")
        .text("name", "Mario Rossi")
        .text("email", "mario@acme.it")
        .text(
            "items_json",
            r#"[{"code": "LM358", "quantity": 100}, {"code": "BSS138"}]"#,
        )
}

// ─── Root and health ────────────────────────────────────────────────

#[tokio::test]
async fn test_root_banner() {
    let base = start_server(None).await;
    let body: Value = reqwest::get(format!("{}/", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "CEAP Componenti Backend Running");
}

#[tokio::test]
async fn test_health_reports_store_availability() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    let base = start_server(Some(store.clone())).await;

    let body: Value = reqwest::get(format!("{}/api/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store_available"], true);

    store.set_reachable(false);
    let body: Value = reqwest::get(format!("{}/api/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store_available"], false);
}

#[tokio::test]
async fn test_diagnostics_without_store() {
    let base = start_server(None).await;
    let resp = reqwest::get(format!("{}/test", base)).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["backend"], "✅ Running");
    assert_eq!(body["database"], "❌ Not Available");
    assert_eq!(body["database_url"], "❌ Not Set");
    assert_eq!(body["database_name"], "❌ Not Set");
}

#[tokio::test]
async fn test_diagnostics_lists_collections() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    let base = start_server(Some(store.clone())).await;

    let client = reqwest::Client::new();
    client
        .post(format!("{}/api/leads", base))
        .multipart(lead_form())
        .send()
        .await
        .unwrap();

    let body: Value = reqwest::get(format!("{}/test", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["database"], "✅ Connected & Working");
    assert_eq!(body["connection_status"], "Connected");
    let collections = body["collections"].as_array().unwrap();
    assert!(collections.iter().any(|c| c == "lead"));
}

// ─── Submissions ────────────────────────────────────────────────────

#[tokio::test]
async fn test_lead_saved() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    let base = start_server(Some(store.clone())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/leads", base))
        .multipart(lead_form())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert!(body["id"].is_string());
    assert!(body.get("warning").is_none());

    let docs = store.documents("lead");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["company"], "ACME Srl");
    assert_eq!(docs[0]["source"], "webform");
    assert_eq!(docs[0]["items"].as_array().unwrap().len(), 2);
    assert!(docs[0].contains_key("created_at"));
    assert!(docs[0].contains_key("updated_at"));
}

#[tokio::test]
async fn test_lead_without_store_is_accepted_with_warning() {
    let base = start_server(None).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/leads", base))
        .multipart(lead_form())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert!(body["id"].is_null());
    assert_eq!(body["warning"], NOT_SAVED);
}

#[tokio::test]
async fn test_lead_with_unreachable_store_is_accepted_with_warning() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    store.set_reachable(false);
    let base = start_server(Some(store.clone())).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/api/leads", base))
        .multipart(lead_form())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
    assert!(body["id"].is_null());
    assert_eq!(body["warning"], NOT_SAVED);
    assert!(store.documents("lead").is_empty());
}

#[tokio::test]
async fn test_lead_write_failure_is_server_error() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    store.set_fail_writes(true);
    let base = start_server(Some(store)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/leads", base))
        .multipart(lead_form())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "write_failed");
    assert_eq!(
        body["error"]["message"],
        "Errore nel salvataggio della richiesta"
    );
}

#[tokio::test]
async fn test_lead_invalid_email_rejected() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    let base = start_server(Some(store.clone())).await;

    let form = reqwest::multipart::Form::new()
        .text("company", "ACME Srl")
        .text("name", "Mario Rossi")
        .text("email", "not-an-email");
    let resp = reqwest::Client::new()
        .post(format!("{}/api/leads", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(store.documents("lead").is_empty());
}

#[tokio::test]
async fn test_lead_malformed_items_rejected() {
    let base = start_server(None).await;

    let form = reqwest::multipart::Form::new()
        .text("company", "ACME Srl")
        .text("name", "Mario Rossi")
        .text("email", "mario@acme.it")
        .text("items_json", "{not json");
    let resp = reqwest::Client::new()
        .post(format!("{}/api/leads", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("items_json"));
}

#[tokio::test]
async fn test_contact_with_attachment() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    let base = start_server(Some(store.clone())).await;

    let payload = b"%PDF-1.4 fake drawing".to_vec();
    let part = reqwest::multipart::Part::bytes(payload.clone())
        .file_name("bom.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("company", "ACME Srl")
        .text("name", "Mario Rossi")
        .text("email", "mario@acme.it")
        .text("message", "Vi allego la distinta.")
        .part("file", part);

    let resp = reqwest::Client::new()
        .post(format!("{}/api/contact", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["id"].is_string());

    let docs = store.documents("contactmessage");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["topic"], "Generale");
    let attachment = &docs[0]["attachment"];
    assert_eq!(attachment["filename"], "bom.pdf");
    assert_eq!(attachment["bucket"], "contacts");
    assert_eq!(attachment["size"], payload.len() as u64);

    // attachments are embedded, never written as separate file documents
    assert!(store.documents("file").is_empty());
}

#[tokio::test]
async fn test_contact_write_failure_detail() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    store.set_fail_writes(true);
    let base = start_server(Some(store)).await;

    let form = reqwest::multipart::Form::new()
        .text("company", "ACME Srl")
        .text("name", "Mario Rossi")
        .text("email", "mario@acme.it")
        .text("message", "Ciao");
    let resp = reqwest::Client::new()
        .post(format!("{}/api/contact", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"]["message"],
        "Errore nel salvataggio del messaggio"
    );
}

#[tokio::test]
async fn test_chatbot_lead_saved() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    let base = start_server(Some(store.clone())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/chatbot/lead", base))
        .json(&serde_json::json!({
            "name": "Giulia",
            "message": "Cerco 500 pezzi di BSS138",
            "items": [{"code": "BSS138", "quantity": 500}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["id"].is_string());

    let docs = store.documents("lead");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["channel"], "chatbot");
}

#[tokio::test]
async fn test_chatbot_lead_without_store() {
    let base = start_server(None).await;

    let body: Value = reqwest::Client::new()
        .post(format!("{}/api/chatbot/lead", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
    assert!(body["id"].is_null());
    assert_eq!(body["warning"], NOT_SAVED);
}

#[tokio::test]
async fn test_chatbot_lead_write_failure_is_server_error() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    store.set_fail_writes(true);
    let base = start_server(Some(store)).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/chatbot/lead", base))
        .json(&serde_json::json!({"name": "Giulia"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "write_failed");
    assert_eq!(
        body["error"]["message"],
        "Errore nel salvataggio della richiesta"
    );
}

#[tokio::test]
async fn test_form_endpoints_reject_non_multipart_body() {
    let base = start_server(None).await;
    let client = reqwest::Client::new();

    for path in ["/api/leads", "/api/contact"] {
        let resp = client
            .post(format!("{}{}", base, path))
            .json(&serde_json::json!({"company": "ACME Srl"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 422, "{}", path);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn test_chatbot_lead_malformed_json_rejected() {
    let base = start_server(None).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/chatbot/lead", base))
        .header("content-type", "application/json")
        .body("{\"items\": 5}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}

// ─── Catalog and FAQ ────────────────────────────────────────────────

#[tokio::test]
async fn test_components_fallback_respects_limit() {
    let base = start_server(None).await;

    let body: Value = reqwest::get(format!("{}/api/components?limit=2", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["code"], "BSS138");
    assert_eq!(items[1]["code"], "LM358");
}

#[tokio::test]
async fn test_components_fallback_when_store_empty() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    let base = start_server(Some(store)).await;

    let body: Value = reqwest::get(format!("{}/api/components", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_components_from_store_publish_id() {
    let store = Arc::new(InMemoryStore::new("ceap"));
    let mut doc = serde_json::Map::new();
    doc.insert("code".into(), "IRLZ44N".into());
    doc.insert("type".into(), "MOSFET".into());
    doc.insert("mount".into(), "PTH".into());
    store.insert("componentitem", doc).await.unwrap();
    let mut other = serde_json::Map::new();
    other.insert("code".into(), "NE555".into());
    other.insert("type".into(), "IC".into());
    store.insert("componentitem", other).await.unwrap();

    let base = start_server(Some(store)).await;

    let body: Value = reqwest::get(format!("{}/api/components?type=MOSFET", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["code"], "IRLZ44N");
    assert!(items[0]["id"].is_string());
    assert!(items[0].get("_id").is_none());
}

#[tokio::test]
async fn test_faq() {
    let base = start_server(None).await;

    let body: Value = reqwest::get(format!("{}/api/faq", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert!(items.iter().all(|i| i["q"].is_string() && i["a"].is_string()));
}
