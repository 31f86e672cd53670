//! Full cycles against a mock chat-completions server

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use polish_config::{SettingsPatch, SettingsStore};
use polish_dom::{Boundary, Document, Range, Rect};
use polish_engine::{CycleError, CycleOutcome, Enhancer, PreviewEvent};
use polish_providers::{EnhancementClient, OpenAiChatTransport};
use polish_types::{AuthError, Objective, SettingKey};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    CHAT_PATH, ScriptedPresenter, TEST_KEY, find, mount_choices, mount_error, page,
    start_openai_mock, store_with_key, transport_for,
};

type TestEnhancer = Enhancer<OpenAiChatTransport, ScriptedPresenter>;

fn enhancer(
    server: &MockServer,
    store: &SettingsStore,
    doc: Rc<RefCell<Document>>,
    events: Vec<PreviewEvent>,
) -> TestEnhancer {
    Enhancer::new(
        doc,
        EnhancementClient::new(transport_for(server)),
        ScriptedPresenter::new(events),
        store.watch(),
    )
    .expect("affordance mounts")
}

/// Select `[start, end)` of the first text node under `selector`.
fn select_text(enhancer: &TestEnhancer, selector: &str, start: usize, end: usize) {
    let element = find(enhancer.document(), selector);
    {
        let mut doc = enhancer.document().borrow_mut();
        let text = doc.children(element)[0];
        doc.set_selection(Range::new(Boundary::new(text, start), Boundary::new(text, end)));
        doc.set_selection_rect(Some(Rect::new(10.0, 10.0, 120.0, 14.0)));
    }
    assert!(enhancer.selection_changed(), "selection in {selector} should qualify");
}

fn inner_text(enhancer: &TestEnhancer, selector: &str) -> String {
    let node = find(enhancer.document(), selector);
    enhancer.document().borrow().inner_text(node)
}

#[tokio::test]
async fn slack_grammar_fix_applies_chosen_candidate() {
    let server = start_openai_mock().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", format!("Bearer {TEST_KEY}").as_str()))
        .and(body_partial_json(json!({ "n": 2, "temperature": 0.7 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "\"I saw him yesterday.\"" } },
                { "message": { "role": "assistant", "content": "```\nI did see him yesterday.\n```" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_key();
    store
        .set(&SettingsPatch::new().with(SettingKey::OutputCount, "2"))
        .unwrap();
    let doc = page(
        "app.slack.com",
        r#"<div class="ql-editor" contenteditable="true"><p>hey</p><p id="line">i seen him yesterday</p></div>"#,
    );
    let enhancer = enhancer(
        &server,
        &store,
        doc,
        vec![PreviewEvent::Next, PreviewEvent::Accept],
    );
    select_text(&enhancer, "#line", 0, 20);

    let outcome = enhancer.enhance(Objective::Grammar).await;
    assert!(outcome.is_applied(), "{outcome:?}");
    assert_eq!(
        enhancer.presenter().seen(),
        vec![vec![
            "I saw him yesterday.".to_string(),
            "I did see him yesterday.".to_string()
        ]]
    );
    assert_eq!(
        inner_text(&enhancer, ".ql-editor"),
        "hey\nI did see him yesterday."
    );
}

#[tokio::test]
async fn teams_partial_selection_keeps_surrounding_text() {
    let server = start_openai_mock().await;
    mount_choices(&server, &["sentence"]).await;

    let store = store_with_key();
    let doc = page(
        "teams.microsoft.com",
        r#"<div data-tid="message-pane"><div role="textbox" contenteditable="true"><div>please fix</div><div id="line">this sentense now</div></div></div>"#,
    );
    let enhancer = enhancer(&server, &store, doc, vec![PreviewEvent::Accept]);
    select_text(&enhancer, "#line", 5, 13);

    let outcome = enhancer.enhance(Objective::Grammar).await;
    assert!(outcome.is_applied(), "{outcome:?}");
    assert_eq!(
        inner_text(&enhancer, "[role=\"textbox\"]"),
        "please fix\nthis sentence now"
    );
}

#[tokio::test]
async fn gmail_multiline_candidate_is_written_with_breaks() {
    let server = start_openai_mock().await;
    mount_choices(&server, &["Hi team,\n\nPlease review the document."]).await;

    let store = store_with_key();
    let doc = page(
        "mail.google.com",
        r#"<div class="AO"><div id="body" role="textbox" contenteditable="true">hi team pls review the doc</div></div>"#,
    );
    let enhancer = enhancer(&server, &store, doc, vec![PreviewEvent::Accept]);
    select_text(&enhancer, "#body", 0, 26);

    assert!(enhancer.enhance(Objective::Clarity).await.is_applied());
    assert_eq!(
        inner_text(&enhancer, "#body"),
        "Hi team,\n\nPlease review the document."
    );
}

#[tokio::test]
async fn configured_platform_with_plain_field() {
    let server = start_openai_mock().await;
    mount_choices(&server, &["Ship it on Friday."]).await;

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        r#"
[[platforms]]
name = "intranet"
hosts = ["chat.example.com"]
selector = "textarea.composer"
content_model = "plain"
"#,
    )
    .unwrap();
    let store = SettingsStore::open_with_key_override(&config, Some(TEST_KEY.to_string())).unwrap();

    let doc = page("chat.example.com", r#"<textarea class="composer"></textarea>"#);
    let field = find(&doc, "textarea");
    {
        let mut doc = doc.borrow_mut();
        doc.set_field_value(field, "  we ship friday i think  ").unwrap();
        doc.set_field_selection(field, 0, 26).unwrap();
        doc.focus(field);
    }
    let enhancer = enhancer(&server, &store, doc, vec![PreviewEvent::Accept]);
    assert!(enhancer.selection_changed());

    assert!(enhancer.enhance(Objective::Concise).await.is_applied());
    let doc = enhancer.document().borrow();
    let state = doc.field(field).unwrap();
    assert_eq!(state.value, "  Ship it on Friday.  ");
    assert_eq!(state.selection_start, state.selection_end);
}

#[tokio::test]
async fn provider_error_surfaces_as_notice_and_leaves_text() {
    let server = start_openai_mock().await;
    mount_error(&server, 500, "The server had an error").await;

    let store = store_with_key();
    let doc = page(
        "app.slack.com",
        r#"<div class="ql-editor" contenteditable="true"><p id="line">keep me</p></div>"#,
    );
    let enhancer = enhancer(&server, &store, doc, vec![PreviewEvent::Accept]);
    select_text(&enhancer, "#line", 0, 7);

    let outcome = enhancer.enhance(Objective::Clarity).await;
    assert!(matches!(outcome, CycleOutcome::Failed(CycleError::Provider(_))));
    let notices = enhancer.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].starts_with("Failed to enhance text:"));
    assert!(notices[0].contains("The server had an error"));
    assert_eq!(inner_text(&enhancer, ".ql-editor"), "keep me");
}

#[tokio::test]
async fn rejected_key_is_reported_as_auth_failure() {
    let server = start_openai_mock().await;
    mount_error(&server, 401, "Incorrect API key provided").await;

    let store = store_with_key();
    let doc = page(
        "app.slack.com",
        r#"<div class="ql-editor" contenteditable="true"><p id="line">hello</p></div>"#,
    );
    let enhancer = enhancer(&server, &store, doc, vec![PreviewEvent::Accept]);
    select_text(&enhancer, "#line", 0, 5);

    assert_eq!(
        enhancer.enhance(Objective::Grammar).await,
        CycleOutcome::Failed(CycleError::Auth(AuthError::Rejected { status: 401 }))
    );
}

#[tokio::test]
async fn cancelled_preview_makes_no_change() {
    let server = start_openai_mock().await;
    mount_choices(&server, &["Hello there."]).await;

    let store = store_with_key();
    let doc = page(
        "app.slack.com",
        r#"<div class="ql-editor" contenteditable="true"><p id="line">hullo</p></div>"#,
    );
    let enhancer = enhancer(&server, &store, doc, vec![PreviewEvent::BackdropClick]);
    select_text(&enhancer, "#line", 0, 5);

    assert_eq!(
        enhancer.enhance(Objective::Grammar).await,
        CycleOutcome::Cancelled
    );
    assert_eq!(inner_text(&enhancer, ".ql-editor"), "hullo");
    assert!(enhancer.notices().is_empty());
}
