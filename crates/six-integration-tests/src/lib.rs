//! Shared harness for end-to-end contact sync tests.
//!
//! [`FakeServer`] stands in for both the Supabase RPC host and the graph
//! backend, recording every request it sees. [`CountingProvider`] is a
//! device address book that counts prompts and reads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde_json::{json, Value};

use six_backend::{BackendConfig, SixBackend};
use six_contacts::{
    ContactField, ContactProvider, ContactSync, ContactSyncConfig, PermissionStatus, RawContact,
    Session, SignedInUser,
};

pub const USER_ID: &str = "user-me";
pub const ACCESS_TOKEN: &str = "access-token";
pub const ANON_KEY: &str = "anon-key";

/// A request captured by [`FakeServer`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub body: Value,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct ServerState {
    /// Registered users by last-10 identifier.
    users: HashMap<String, String>,
    rpc_delay: Duration,
    rpc_calls: Mutex<Vec<Recorded>>,
    connects: Mutex<Vec<Value>>,
}

/// In-process stand-in for the matching RPC and the connect endpoint.
pub struct FakeServer {
    pub base_url: String,
    state: Arc<ServerState>,
}

impl FakeServer {
    /// Start a server on an ephemeral port knowing `users` as
    /// `(last10, user_id)` pairs.
    pub async fn start(users: &[(&str, &str)]) -> Self {
        Self::start_with_delay(users, Duration::ZERO).await
    }

    /// Like [`FakeServer::start`], holding each RPC response for `rpc_delay`.
    pub async fn start_with_delay(users: &[(&str, &str)], rpc_delay: Duration) -> Self {
        let state = Arc::new(ServerState {
            users: users
                .iter()
                .map(|(phone, id)| (phone.to_string(), id.to_string()))
                .collect(),
            rpc_delay,
            ..ServerState::default()
        });

        let router = Router::new()
            .route("/rest/v1/rpc/match_contacts_by_last10", post(match_contacts))
            .route("/users/connect", post(connect))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake server");
        let addr = listener.local_addr().expect("fake server address");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Fake server stopped");
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn config(&self) -> BackendConfig {
        BackendConfig::new(&self.base_url, ANON_KEY, &self.base_url)
    }

    pub fn rpc_calls(&self) -> Vec<Recorded> {
        self.state.rpc_calls.lock().expect("rpc log").clone()
    }

    pub fn connects(&self) -> Vec<Value> {
        self.state.connects.lock().expect("connect log").clone()
    }
}

async fn match_contacts(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    state.rpc_calls.lock().expect("rpc log").push(Recorded {
        body: body.clone(),
        apikey: header("apikey"),
        authorization: header("authorization"),
    });

    if !state.rpc_delay.is_zero() {
        tokio::time::sleep(state.rpc_delay).await;
    }

    let matches: Vec<Value> = body["contact_last10s"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(|phone| {
            state.users.get(phone).map(|id| {
                json!({"contact_user_id": id, "name": null, "phone": phone})
            })
        })
        .collect();
    Json(Value::Array(matches))
}

async fn connect(State(state): State<Arc<ServerState>>, Json(body): Json<Value>) -> Json<Value> {
    state.connects.lock().expect("connect log").push(body);
    Json(json!({"success": true}))
}

/// Device address book that counts how often it is consulted.
pub struct CountingProvider {
    contacts: Vec<RawContact>,
    status: Mutex<PermissionStatus>,
    answer: PermissionStatus,
    read_delay: Duration,
    pub checks: AtomicUsize,
    pub prompts: AtomicUsize,
    pub reads: AtomicUsize,
}

impl CountingProvider {
    /// Starts `undetermined`; a prompt answers with `answer`.
    pub fn new(contacts: Vec<RawContact>, answer: PermissionStatus) -> Self {
        Self {
            contacts,
            status: Mutex::new(PermissionStatus::Undetermined),
            answer,
            read_delay: Duration::ZERO,
            checks: AtomicUsize::new(0),
            prompts: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContactProvider for CountingProvider {
    async fn permission_status(&self) -> anyhow::Result<PermissionStatus> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(*self.status.lock().expect("status"))
    }

    async fn request_permission(&self) -> anyhow::Result<PermissionStatus> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        let mut status = self.status.lock().expect("status");
        *status = self.answer;
        Ok(*status)
    }

    async fn enumerate_contacts(&self, _fields: &[ContactField]) -> anyhow::Result<Vec<RawContact>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
        Ok(self.contacts.clone())
    }
}

/// Two contacts sharing one number, three distinct numbers in total, one
/// of them too short to use.
pub fn address_book() -> Vec<RawContact> {
    vec![
        RawContact::named("Ada").with_phone("+1 (555) 123-4567"),
        RawContact::named("Grace")
            .with_phone("555.123.4567")
            .with_phone("555-999-0000"),
        RawContact::named("Short").with_phone("911"),
    ]
}

/// Wire a coordinator to `provider` and the fake server, signed in as [`USER_ID`].
pub fn coordinator(provider: Arc<CountingProvider>, server: &FakeServer) -> ContactSync {
    six_logging::try_init();

    let session = Session::signed_in(SignedInUser::new(USER_ID, ACCESS_TOKEN));
    let backend = SixBackend::new(server.config(), session.clone()).expect("http client");
    ContactSync::new(
        provider,
        Arc::new(backend),
        session,
        ContactSyncConfig::default(),
    )
}
