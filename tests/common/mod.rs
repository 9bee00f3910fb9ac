#![allow(dead_code)]

use mediagen::{HeyGenClient, PollConfig, Poller, StabilityClient};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

/// Replies with each template in turn, repeating the last one once the script runs out.
pub struct ScriptedResponder {
    script: Vec<ResponseTemplate>,
    calls: AtomicUsize,
}

impl ScriptedResponder {
    pub fn new(script: Vec<ResponseTemplate>) -> Self {
        assert!(!script.is_empty());
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn json(bodies: Vec<Value>) -> Self {
        Self::new(
            bodies
                .into_iter()
                .map(|body| ResponseTemplate::new(200).set_body_json(body))
                .collect(),
        )
    }
}

impl Respond for ScriptedResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let count = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = count.min(self.script.len() - 1);
        self.script[index].clone()
    }
}

pub fn heygen_client(server: &MockServer) -> HeyGenClient {
    HeyGenClient::new_with_url("test_api_key".to_string(), &server.uri()).unwrap()
}

pub fn stability_client(server: &MockServer) -> StabilityClient {
    StabilityClient::new_with_url("test_api_key".to_string(), &server.uri()).unwrap()
}

pub fn fast_poller() -> Poller {
    Poller::new(PollConfig {
        interval: Duration::from_millis(25),
        max_wait: Duration::from_secs(5),
    })
}
