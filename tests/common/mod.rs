//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::process::{Command, Output};
use std::rc::Rc;

use polish_config::SettingsStore;
use polish_dom::{Document, NodeId};
use polish_engine::{CandidatePreview, PreviewEvent, PreviewOutcome, PreviewPresenter};
use polish_providers::OpenAiChatTransport;
use polish_types::{ApiKey, Selector, Settings};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const TEST_KEY: &str = "sk-integration-test";

/// Start a mock server that simulates the chat-completions API
pub async fn start_openai_mock() -> MockServer {
    MockServer::start().await
}

/// Mount a chat-completions response with one choice per entry
pub async fn mount_choices(server: &MockServer, contents: &[&str]) {
    let choices: Vec<_> = contents
        .iter()
        .enumerate()
        .map(|(index, content)| {
            json!({
                "index": index,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            })
        })
        .collect();
    let body = json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_234_567_890,
        "model": "gpt-4o-mini",
        "choices": choices,
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    });

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount an OpenAI-style error body
pub async fn mount_error(server: &MockServer, status: u16, message: &str) {
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "error": { "message": message, "type": "invalid_request_error" }
        })))
        .mount(server)
        .await;
}

/// Plain-HTTP transport pointed at the mock server
pub fn transport_for(server: &MockServer) -> OpenAiChatTransport {
    OpenAiChatTransport::with_client(reqwest::Client::new(), format!("{}{CHAT_PATH}", server.uri()))
}

/// In-memory settings holding a well-formed key
pub fn store_with_key() -> SettingsStore {
    let mut settings = Settings::default();
    settings.credentials.api_key = Some(ApiKey::new(TEST_KEY));
    SettingsStore::in_memory(settings)
}

pub fn selector(source: &str) -> Selector {
    Selector::parse(source).expect("valid test selector")
}

/// Parse `html` as a page served from `host`
pub fn page(host: &str, html: &str) -> Rc<RefCell<Document>> {
    let mut doc = Document::from_html(html);
    doc.set_hostname(host);
    Rc::new(RefCell::new(doc))
}

pub fn find(doc: &Rc<RefCell<Document>>, source: &str) -> NodeId {
    let doc = doc.borrow();
    doc.query(doc.body(), &selector(source))
        .unwrap_or_else(|| panic!("no element matches {source}"))
}

/// Presenter that replays a fixed event list and cancels when it runs out
pub struct ScriptedPresenter {
    events: Vec<PreviewEvent>,
    seen: RefCell<Vec<Vec<String>>>,
}

impl ScriptedPresenter {
    pub fn new(events: Vec<PreviewEvent>) -> Self {
        Self {
            events,
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Candidate lists shown so far, one entry per preview
    pub fn seen(&self) -> Vec<Vec<String>> {
        self.seen.borrow().clone()
    }
}

impl PreviewPresenter for ScriptedPresenter {
    async fn present(&self, mut preview: CandidatePreview) -> PreviewOutcome {
        let mut shown = Vec::with_capacity(preview.len());
        let mut walker = preview.clone();
        for _ in 0..preview.len() {
            shown.push(walker.current().to_string());
            walker.handle(PreviewEvent::Next);
        }
        self.seen.borrow_mut().push(shown);

        for event in &self.events {
            if let Some(outcome) = preview.handle(*event) {
                return outcome;
            }
        }
        PreviewOutcome::Cancelled
    }
}

/// Run the `polish` binary with `home` as its home directory
pub fn polish(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_polish"))
        .args(args)
        .env("HOME", home)
        .env_remove("POLISH_API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("polish binary runs")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
