#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};
use taskdesk::api::{Method, Reply, Request, Transport, TransportError};
use tokio::sync::Notify;

/// Answers from a route table and records every request. A request can be
/// held back until the test releases it.
#[derive(Default)]
pub struct FakeTransport {
    requests: Mutex<Vec<Request>>,
    routes: Mutex<HashMap<(Method, String), Result<Reply, String>>>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl FakeTransport {
    pub fn route(&self, method: Method, path: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Ok(reply));
    }

    pub fn fail(&self, method: Method, path: &str, err: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Err(err.to_string()));
    }

    /// Holds the next request until the returned handle is notified.
    pub fn hold_next(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.requests()
            .into_iter()
            .map(|request| (request.method, request.path))
            .collect()
    }

    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: Request) -> Result<Reply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let hold = self.hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        let route = self
            .routes
            .lock()
            .unwrap()
            .get(&(request.method, request.path.clone()))
            .cloned();

        match route {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(err)) => Err(TransportError::Other(err)),
            None => Ok(match (request.method, request.path.as_str()) {
                (Method::Get, _) => Reply::new(200, json!([])),
                (Method::Post, "/todos") => Reply::new(201, Value::Null),
                _ => Reply::new(200, Value::Null),
            }),
        }
    }
}
