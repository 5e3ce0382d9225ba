//! Contact matching and connection client.
//!
//! A sync is a two-step exchange:
//!
//! 1. `rpc/match_contacts_by_last10` resolves phone identifiers to
//!    registered users.
//! 2. `users/connect` is called once per matched user other than the
//!    requester. Individual failures are logged and skipped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use six_contacts::{NormalizedPhoneSet, Session, SignedInUser, SyncBackend, SyncReport};

use crate::config::BackendConfig;
use crate::error::{Error, Result};

const MATCH_FUNCTION: &str = "match_contacts_by_last10";
const CONNECT_PATH: &str = "users/connect";

/// A registered user matched from the requester's contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedUser {
    #[serde(default)]
    pub contact_user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
struct MatchRequest<'a> {
    contact_last10s: &'a [String],
    requesting_user: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectRequest<'a> {
    user_id1: &'a str,
    user_id2: &'a str,
}

/// HTTP client for the Six matching and graph endpoints.
#[derive(Debug, Clone)]
pub struct SixBackend {
    http: reqwest::Client,
    config: BackendConfig,
    session: Session,
}

impl SixBackend {
    /// Create a client. Each call reads the signed-in user from `session`.
    pub fn new(config: BackendConfig, session: Session) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            session,
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Resolve phone identifiers to registered users.
    pub async fn match_contacts(
        &self,
        user: &SignedInUser,
        phones: &NormalizedPhoneSet,
    ) -> Result<Vec<MatchedUser>> {
        let response = self
            .http
            .post(self.config.rpc_url(MATCH_FUNCTION))
            .header("apikey", &self.config.supabase_anon_key)
            .bearer_auth(&user.access_token)
            .json(&MatchRequest {
                contact_last10s: phones.as_slice(),
                requesting_user: &user.id,
            })
            .send()
            .await?;

        let response = check_status(MATCH_FUNCTION, response).await?;
        let matches: Vec<MatchedUser> = response.json().await?;
        debug!(submitted = phones.len(), matched = matches.len(), "Matched contacts");
        Ok(matches)
    }

    /// Create a connection between two users in the graph backend.
    pub async fn add_connection(&self, user_id: &str, contact_user_id: &str) -> Result<()> {
        let response = self
            .http
            .post(self.config.backend_endpoint(CONNECT_PATH))
            .json(&ConnectRequest {
                user_id1: user_id,
                user_id2: contact_user_id,
            })
            .send()
            .await?;

        check_status(CONNECT_PATH, response).await?;
        Ok(())
    }

    /// Match `phones` and connect the requester to every matched user.
    pub async fn sync(&self, phones: &NormalizedPhoneSet) -> Result<SyncReport> {
        let user = self.session.user().ok_or(Error::NoSession)?;

        let matches = self.match_contacts(&user, phones).await?;
        if matches.is_empty() {
            return Err(Error::NoMatches);
        }

        let mut report = SyncReport {
            submitted: phones.len(),
            matched: matches.len(),
            ..SyncReport::default()
        };

        let targets = matches
            .iter()
            .filter_map(|m| m.contact_user_id.as_deref())
            .filter(|id| *id != user.id);

        for target in targets {
            match self.add_connection(&user.id, target).await {
                Ok(()) => report.connected += 1,
                Err(e) => {
                    warn!(user = %user.id, contact = %target, error = %e, "Failed to add connection");
                    report.failed += 1;
                }
            }
        }

        if report.connected == 0 {
            return Err(Error::NoConnections {
                attempted: report.failed,
            });
        }

        info!(
            matched = report.matched,
            connected = report.connected,
            failed = report.failed,
            "Connected matched contacts"
        );
        Ok(report)
    }
}

#[async_trait]
impl SyncBackend for SixBackend {
    async fn sync_contacts(&self, phones: &NormalizedPhoneSet) -> anyhow::Result<SyncReport> {
        Ok(self.sync(phones).await?)
    }
}

async fn check_status(endpoint: &'static str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(endpoint, status = status.as_u16(), %body, "Backend request rejected");
    Err(Error::Status {
        endpoint,
        status: status.as_u16(),
        body,
    })
}
