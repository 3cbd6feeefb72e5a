//! Shared test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use coach_relay::api::ApiServerBuilder;
use coach_relay::{
    ChatModel, CoachRelay, CompletionRequest, Error, Persona, Result, SpeechSynthesizer,
};
use tower::ServiceExt;

/// Completion model that records every request and answers from a script
pub struct ScriptedModel {
    pub reply: std::result::Result<String, String>,
    pub seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.seen.lock().expect("lock poisoned").push(request.clone());
        self.reply.clone().map_err(Error::Llm)
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }
}

/// Synthesizer returning fixed bytes or a fixed failure
pub struct ScriptedSpeech(pub std::result::Result<Vec<u8>, String>);

#[async_trait]
impl SpeechSynthesizer for ScriptedSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        self.0.clone().map_err(Error::Tts)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Fake MP3 payload: an ID3 tag header
pub const FAKE_MP3: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00";

/// Relay with the embedded persona and the given collaborators
pub fn relay(
    model: Arc<ScriptedModel>,
    speech: Option<ScriptedSpeech>,
) -> CoachRelay {
    CoachRelay::new(
        Persona::embedded().expect("embedded persona"),
        model,
        speech.map(|s| Arc::new(s) as Arc<dyn SpeechSynthesizer>),
    )
}

/// Full application router around a relay
pub fn app(relay: CoachRelay) -> Router {
    ApiServerBuilder::new(relay, 0).build().router()
}

/// Send a JSON POST through the router
pub async fn post_json(app: Router, uri: &str, body: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request"),
    )
    .await
    .expect("router is infallible")
}

/// Send a GET through the router
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request"),
    )
    .await
    .expect("router is infallible")
}

/// Collect a response body as JSON
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&body).expect("JSON body")
}

/// Collect a response body as text
pub async fn text_body(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(body.to_vec()).expect("UTF-8 body")
}
