// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-memory apiextensions server for driving a real kube Client in tests.

use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::client::Body;
use kube::Client;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

const CRD_PATH: &str = "/apis/apiextensions.k8s.io/v1/customresourcedefinitions";

/// When written definitions report `Established=True`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Establish {
    /// Right away on create and update
    OnCreate,
    /// After the given number of GETs following the last write
    AfterGets(usize),
    Never,
    /// `NamesAccepted=False`, never established
    NameConflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub name: String,
}

struct State {
    objects: BTreeMap<String, Value>,
    establish: Establish,
    gets_since_write: HashMap<String, usize>,
    failures: HashMap<(String, String), VecDeque<(u16, String)>>,
    persistent_failures: HashMap<(String, String), (u16, String)>,
    concurrent_writes: Vec<(String, usize, Value)>,
    race_on_create: Option<Value>,
    requests: Vec<RecordedRequest>,
    resource_version: u64,
}

/// A mock API server holding CustomResourceDefinitions.
///
/// Writes honour resourceVersion the way the real server does, so stale
/// updates get a 409 Conflict.
#[derive(Clone)]
pub struct MockApiServer {
    state: Arc<Mutex<State>>,
}

impl MockApiServer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                objects: BTreeMap::new(),
                establish: Establish::OnCreate,
                gets_since_write: HashMap::new(),
                failures: HashMap::new(),
                persistent_failures: HashMap::new(),
                concurrent_writes: Vec::new(),
                race_on_create: None,
                requests: Vec::new(),
                resource_version: 0,
            })),
        }
    }

    /// Seed an existing definition, reported as established
    pub fn with_crd(self, crd: CustomResourceDefinition) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let value = serde_json::to_value(&crd).unwrap();
            state.store(value, Establish::OnCreate);
        }
        self
    }

    pub fn with_establish(self, establish: Establish) -> Self {
        self.state.lock().unwrap().establish = establish;
        self
    }

    /// Fail the next `method` request for `name` with the given status.
    /// Repeated calls queue up in order.
    pub fn fail_on(self, method: &str, name: &str, code: u16, reason: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry((method.to_string(), name.to_string()))
            .or_default()
            .push_back((code, reason.to_string()));
        self
    }

    /// Fail every `method` request for `name` once the queued failures are used up
    pub fn fail_always(self, method: &str, name: &str, code: u16, reason: &str) -> Self {
        self.state.lock().unwrap().persistent_failures.insert(
            (method.to_string(), name.to_string()),
            (code, reason.to_string()),
        );
        self
    }

    /// Simulate another caller writing `crd` right before the GET that
    /// follows `after_gets` earlier GETs of the same name
    pub fn concurrent_write(self, crd: CustomResourceDefinition, after_gets: usize) -> Self {
        let value = serde_json::to_value(&crd).unwrap();
        let name = value["metadata"]["name"].as_str().unwrap_or_default().to_string();
        self.state
            .lock()
            .unwrap()
            .concurrent_writes
            .push((name, after_gets, value));
        self
    }

    /// Simulate another caller creating `crd` just before our create lands
    pub fn race_on_create(self, crd: CustomResourceDefinition) -> Self {
        self.state.lock().unwrap().race_on_create = Some(serde_json::to_value(&crd).unwrap());
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    pub fn object(&self, name: &str) -> Option<CustomResourceDefinition> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(name)
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    fn handle(&self, method: &str, path: &str, body: &[u8]) -> (u16, String) {
        let mut state = self.state.lock().unwrap();

        let posted: Option<Value> = serde_json::from_slice(body).ok();
        let name = match path.strip_prefix(CRD_PATH) {
            Some(rest) if !rest.trim_start_matches('/').is_empty() => {
                rest.trim_start_matches('/').to_string()
            }
            Some(_) => posted
                .as_ref()
                .and_then(|v| v["metadata"]["name"].as_str())
                .unwrap_or_default()
                .to_string(),
            None => return (404, status_json(404, "NotFound", "unknown path")),
        };

        state.requests.push(RecordedRequest {
            method: method.to_string(),
            name: name.clone(),
        });

        let key = (method.to_string(), name.clone());
        let failure = state
            .failures
            .get_mut(&key)
            .and_then(|queue| queue.pop_front())
            .or_else(|| state.persistent_failures.get(&key).cloned());
        if let Some((code, reason)) = failure {
            let message = format!("injected {}", reason);
            return (code, status_json(code, &reason, &message));
        }

        if method == "GET" {
            let earlier_gets = state
                .requests
                .iter()
                .filter(|r| r.method == "GET" && r.name == name)
                .count()
                - 1;
            let due: Vec<Value> = {
                let writes = std::mem::take(&mut state.concurrent_writes);
                let (due, pending): (Vec<_>, Vec<_>) = writes
                    .into_iter()
                    .partition(|(n, after, _)| *n == name && *after == earlier_gets);
                state.concurrent_writes = pending;
                due.into_iter().map(|(_, _, value)| value).collect()
            };
            for value in due {
                state.store(value, Establish::OnCreate);
            }
        }

        match method {
            "GET" => state.get(&name),
            "POST" => state.create(&name, posted),
            "PUT" => state.replace(&name, posted),
            "DELETE" => match state.objects.remove(&name) {
                Some(obj) => (200, obj.to_string()),
                None => not_found(&name),
            },
            _ => (405, status_json(405, "MethodNotAllowed", "method not allowed")),
        }
    }
}

impl State {
    fn next_resource_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn store(&mut self, mut obj: Value, establish: Establish) -> Value {
        let name = obj["metadata"]["name"].as_str().unwrap_or_default().to_string();
        obj["metadata"]["resourceVersion"] = json!(self.next_resource_version());
        obj["metadata"]["uid"] = json!(format!("uid-{}", name));
        let status = status_for(&obj, establish == Establish::OnCreate, establish);
        obj["status"] = status;
        self.gets_since_write.insert(name.clone(), 0);
        self.objects.insert(name, obj.clone());
        obj
    }

    fn get(&mut self, name: &str) -> (u16, String) {
        let gets = {
            let counter = self.gets_since_write.entry(name.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };
        let establish = self.establish;
        let Some(obj) = self.objects.get_mut(name) else {
            return not_found(name);
        };
        if let Establish::AfterGets(n) = establish {
            if gets >= n {
                let status = status_for(obj, true, establish);
                obj["status"] = status;
            }
        }
        (200, obj.to_string())
    }

    fn create(&mut self, name: &str, posted: Option<Value>) -> (u16, String) {
        if let Some(other) = self.race_on_create.take() {
            self.store(other, Establish::OnCreate);
        }
        if self.objects.contains_key(name) {
            return (
                409,
                status_json(409, "AlreadyExists", &format!("customresourcedefinitions \"{}\" already exists", name)),
            );
        }
        let Some(obj) = posted else {
            return (400, status_json(400, "BadRequest", "missing body"));
        };
        let establish = self.establish;
        (201, self.store(obj, establish).to_string())
    }

    fn replace(&mut self, name: &str, posted: Option<Value>) -> (u16, String) {
        let Some(existing) = self.objects.get(name) else {
            return not_found(name);
        };
        let Some(obj) = posted else {
            return (400, status_json(400, "BadRequest", "missing body"));
        };
        if obj["metadata"]["resourceVersion"] != existing["metadata"]["resourceVersion"] {
            return (
                409,
                status_json(409, "Conflict", "the object has been modified; please apply your changes to the latest version and try again"),
            );
        }
        let establish = self.establish;
        (200, self.store(obj, establish).to_string())
    }
}

fn status_for(obj: &Value, established: bool, establish: Establish) -> Value {
    let names_accepted = if establish == Establish::NameConflict {
        json!({"type": "NamesAccepted", "status": "False", "reason": "ShortNamesConflict", "message": "\"cnp\" is already in use"})
    } else {
        json!({"type": "NamesAccepted", "status": "True", "reason": "NoConflicts", "message": "no conflicts found"})
    };
    let established = if established && establish != Establish::NameConflict {
        json!({"type": "Established", "status": "True", "reason": "InitialNamesAccepted", "message": "the initial names have been accepted"})
    } else {
        json!({"type": "Established", "status": "False", "reason": "Installing", "message": "the initial names are being installed"})
    };

    json!({
        "conditions": [names_accepted, established],
        "acceptedNames": obj["spec"]["names"].clone(),
        "storedVersions": ["v2"],
    })
}

fn not_found(name: &str) -> (u16, String) {
    (
        404,
        status_json(
            404,
            "NotFound",
            &format!("customresourcedefinitions.apiextensions.k8s.io \"{}\" not found", name),
        ),
    )
}

/// A Kubernetes `Status` failure body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

impl Default for MockApiServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();

        Box::pin(async move {
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let body = req.into_body().collect().await?.to_bytes();

            let (status, body) = server.handle(&method, &path, &body);

            let response = Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))?;
            Ok::<_, tower::BoxError>(response)
        })
    }
}
