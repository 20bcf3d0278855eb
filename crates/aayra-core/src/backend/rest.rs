//! PostgREST client for the managed backend.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{Backend, NotificationEvent};
use crate::error::{BackendError, Result};
use crate::reminder::{PendingReview, ReminderPreference, StudyDay};
use crate::stats::CompletedSession;
use crate::storage::{BackendConfig, UserSession};

pub struct RestBackend {
    base: Url,
    anon_key: String,
    session: UserSession,
    http_client: Client,
}

impl RestBackend {
    pub fn new(base_url: &str, anon_key: &str, session: UserSession) -> Result<Self, BackendError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            anon_key: anon_key.to_string(),
            session,
            http_client: Client::new(),
        })
    }

    pub fn from_config(config: &BackendConfig, session: UserSession) -> Result<Self, BackendError> {
        match (config.url.as_deref(), config.anon_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Self::new(url, key, session)
            }
            _ => Err(BackendError::NotConfigured),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.session.user_id
    }

    fn table_url(&self, table: &str, query: &[(&str, String)]) -> Result<Url, BackendError> {
        let mut url = self.base.join(&format!("rest/v1/{table}"))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.session.access_token)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<Response, BackendError> {
        let resp = self
            .authorized(request)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let url = self.table_url(table, query)?;
        let resp = self.send(table, self.http_client.get(url)).await?;
        let body = resp.text().await.map_err(|source| BackendError::Request {
            endpoint: table.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| BackendError::Decode {
            endpoint: table.to_string(),
            message: e.to_string(),
        })
    }
}

// ── Row shapes ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SessionRow {
    sessionid: String,
    #[serde(default)]
    sessionname: Option<String>,
    #[serde(default)]
    subjectname: Option<String>,
    #[serde(default)]
    topicname: Option<String>,
    #[serde(default)]
    completedat: Option<String>,
    #[serde(default)]
    createdat: Option<String>,
}

impl From<SessionRow> for CompletedSession {
    fn from(row: SessionRow) -> Self {
        CompletedSession {
            session_id: row.sessionid,
            session_name: row.sessionname,
            subject: row.subjectname,
            topic: row.topicname,
            completed_at: row.completedat.as_deref().and_then(parse_timestamp),
            created_at: row.createdat.as_deref().and_then(parse_timestamp),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionRef {
    #[serde(default)]
    sessionname: Option<String>,
    #[serde(default)]
    subjectname: Option<String>,
    #[serde(default)]
    topicname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    entryid: String,
    #[serde(default)]
    sessionid: Option<String>,
    #[serde(default)]
    currentreviewduedate: Option<String>,
    #[serde(default)]
    studysessions: Option<SessionRef>,
}

impl From<ReviewRow> for PendingReview {
    fn from(row: ReviewRow) -> Self {
        let session = row.studysessions;
        PendingReview {
            entry_id: row.entryid,
            session_id: row.sessionid,
            session_name: session.as_ref().and_then(|s| s.sessionname.clone()),
            subject: session.as_ref().and_then(|s| s.subjectname.clone()),
            topic: session.as_ref().and_then(|s| s.topicname.clone()),
            due_date: row.currentreviewduedate.as_deref().and_then(parse_date),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserRow {
    #[serde(default)]
    preferredstudyweekdays: Option<serde_json::Value>,
    #[serde(default)]
    preferredstudystarttime: Option<String>,
}

/// Weekdays arrive as a JSON array, a JSON-encoded array string, or a
/// comma-separated string depending on how the profile was written.
fn weekday_names(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('[') {
                serde_json::from_str::<Vec<String>>(trimmed).unwrap_or_default()
            } else {
                trimmed
                    .split(',')
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .collect()
            }
        }
        _ => Vec::new(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    // Postgres `timestamptz` text form, and bare `timestamp` read as UTC.
    DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z")
        .map(|at| at.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|at| at.and_utc())
        })
        .ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

#[async_trait]
impl Backend for RestBackend {
    async fn fetch_completed_sessions(&self, user_id: &str) -> Result<Vec<CompletedSession>> {
        let rows: Vec<SessionRow> = self
            .get_rows(
                "studysessions",
                &[
                    ("select", "*".to_string()),
                    ("userid", format!("eq.{user_id}")),
                    ("status", "eq.completed".to_string()),
                ],
            )
            .await?;
        tracing::debug!(count = rows.len(), "fetched completed sessions");
        Ok(rows.into_iter().map(CompletedSession::from).collect())
    }

    async fn fetch_pending_reviews(
        &self,
        user_id: &str,
        due_by: NaiveDate,
    ) -> Result<Vec<PendingReview>> {
        let rows: Vec<ReviewRow> = self
            .get_rows(
                "reviewcycleentries",
                &[
                    (
                        "select",
                        "*,studysessions(sessionname,subjectname,topicname)".to_string(),
                    ),
                    ("userid", format!("eq.{user_id}")),
                    ("status", "eq.pending".to_string()),
                    ("currentreviewduedate", format!("lte.{due_by}")),
                    ("order", "currentreviewduedate.asc".to_string()),
                ],
            )
            .await?;
        tracing::debug!(count = rows.len(), "fetched pending reviews");
        Ok(rows.into_iter().map(PendingReview::from).collect())
    }

    async fn load_preference(&self, user_id: &str) -> Result<Option<ReminderPreference>> {
        let rows: Vec<UserRow> = self
            .get_rows(
                "users",
                &[
                    (
                        "select",
                        "preferredstudyweekdays,preferredstudystarttime".to_string(),
                    ),
                    ("id", format!("eq.{user_id}")),
                ],
            )
            .await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let (Some(days), Some(start)) = (row.preferredstudyweekdays, row.preferredstudystarttime)
        else {
            return Ok(None);
        };
        let names = weekday_names(&days);
        if names.is_empty() || start.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(ReminderPreference::parse(&names, &start)?))
    }

    async fn save_preference(&self, user_id: &str, preference: &ReminderPreference) -> Result<()> {
        let url = self.table_url("users", &[("id", format!("eq.{user_id}"))])?;
        let days: Vec<&str> = preference.weekdays.iter().map(StudyDay::name).collect();
        let body = json!({
            "preferredstudyweekdays": days.join(","),
            "preferredstudystarttime": preference.start_time.format("%H:%M").to_string(),
        });
        self.send(
            "users",
            self.http_client
                .patch(url)
                .header("Prefer", "return=minimal")
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn append_event(&self, event: &NotificationEvent) -> Result<()> {
        let url = self.table_url("notification_events", &[])?;
        self.send(
            "notification_events",
            self.http_client
                .post(url)
                .header("Prefer", "return=minimal")
                .json(event),
        )
        .await?;
        Ok(())
    }
}
