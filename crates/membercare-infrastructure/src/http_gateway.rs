//! HTTP implementation of the record and auth gateways.
//!
//! One `reqwest::Client` per app, one attempt per call, a fixed timeout from
//! [`ApiConfig`]. Error bodies are mined for a user-facing message; anything
//! unusable falls back to a generic notice.

use async_trait::async_trait;
use membercare_core::config::ApiConfig;
use membercare_core::error::{
    GENERIC_REMOTE_MESSAGE, MembercareError, NETWORK_REMOTE_MESSAGE, Result,
};
use membercare_core::gateway::{AuthGateway, Credentials, RecordGateway, UploadForm};
use membercare_core::record::{Record, RecordId};
use membercare_core::resource::Resource;
use membercare_core::session::{Session, SessionContext};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

/// Path of the sign-in endpoint, relative to the base URL.
pub const SIGN_IN_PATH: &str = "auth/login";

/// Longest plain-text error body that is shown to the user verbatim.
const MAX_PLAIN_MESSAGE_LEN: usize = 200;

/// Gateway talking to the Membercare REST API.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl HttpGateway {
    /// Creates a gateway with the configured base URL, timeout, and user agent.
    pub fn new(config: &ApiConfig, session: SessionContext) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MembercareError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds a request, attaching the bearer token.
    ///
    /// For resources that require auth, a missing session fails here, before
    /// anything touches the network.
    async fn request(&self, resource: &Resource, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = if resource.requires_auth {
            Some(self.session.require_token().await?)
        } else {
            self.session.token().await
        };

        let url = self.url(path);
        tracing::debug!("[Gateway] {} {} ({})", method, url, resource.name);

        let request = self.client.request(method, url);
        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Sends the request and returns status plus parsed body (`Null` when empty).
    async fn execute(&self, request: RequestBuilder) -> Result<(u16, Value)> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("[Gateway] Request failed: {}", e);
            MembercareError::network(NETWORK_REMOTE_MESSAGE)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::warn!("[Gateway] Failed to read response body: {}", e);
            MembercareError::network(NETWORK_REMOTE_MESSAGE)
        })?;

        if !status.is_success() {
            let message = error_message(&text);
            tracing::warn!("[Gateway] HTTP {}: {}", status.as_u16(), message);
            return Err(MembercareError::remote(status.as_u16(), message));
        }

        if text.trim().is_empty() {
            return Ok((status.as_u16(), Value::Null));
        }

        let body = serde_json::from_str(&text).map_err(|e| {
            tracing::warn!("[Gateway] Unparseable JSON in HTTP {} response: {}", status.as_u16(), e);
            MembercareError::remote(status.as_u16(), GENERIC_REMOTE_MESSAGE)
        })?;
        Ok((status.as_u16(), body))
    }

    /// Normalizes a single-record answer; servers that echo nothing get the sent record back.
    fn single_record(resource: &Resource, status: u16, body: Value, sent: &Record) -> Result<Record> {
        match resource.envelope.normalize_one(body) {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Ok(sent.clone()),
            Err(e) => {
                tracing::warn!("[Gateway] Unexpected {} response shape: {}", resource.name, e);
                Err(MembercareError::remote(status, GENERIC_REMOTE_MESSAGE))
            }
        }
    }
}

#[async_trait]
impl RecordGateway for HttpGateway {
    async fn list(&self, resource: &Resource) -> Result<Vec<Record>> {
        let request = self.request(resource, Method::GET, &resource.path).await?;
        let (status, body) = self.execute(request).await?;

        resource.envelope.normalize_list(body).map_err(|e| {
            tracing::warn!("[Gateway] Unexpected {} list shape: {}", resource.name, e);
            MembercareError::remote(status, GENERIC_REMOTE_MESSAGE)
        })
    }

    async fn create(&self, resource: &Resource, record: &Record) -> Result<Record> {
        let request = self
            .request(resource, Method::POST, &resource.path)
            .await?
            .json(&record.to_body());
        let (status, body) = self.execute(request).await?;
        Self::single_record(resource, status, body, record)
    }

    async fn update(&self, resource: &Resource, id: &RecordId, patch: &Record) -> Result<Record> {
        let request = self
            .request(resource, Method::PUT, &resource.item_path(id.as_str()))
            .await?
            .json(&patch.to_body());
        let (status, body) = self.execute(request).await?;

        let mut updated = Self::single_record(resource, status, body, patch)?;
        if updated.id().is_none() {
            updated.set_id(Some(id.clone()));
        }
        Ok(updated)
    }

    async fn remove(&self, resource: &Resource, id: &RecordId) -> Result<()> {
        let request = self
            .request(resource, Method::DELETE, &resource.item_path(id.as_str()))
            .await?;
        self.execute(request).await?;
        Ok(())
    }

    async fn upload(&self, resource: &Resource, form: UploadForm) -> Result<Record> {
        let request = self.request(resource, Method::POST, &resource.path).await?;

        let mut sent = Record::new();
        let mut multipart = Form::new();
        for (name, value) in form.fields {
            sent.set(name.clone(), value.clone());
            multipart = multipart.text(name, value);
        }

        if let Some(file) = form.file {
            let mime = mime_guess::from_path(&file.file_name).first_or_octet_stream();
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(mime.as_ref())
                .map_err(|e| MembercareError::internal(format!("Invalid upload MIME type: {}", e)))?;
            multipart = multipart.part(file.field, part);
        }

        let (status, body) = self.execute(request.multipart(multipart)).await?;
        Self::single_record(resource, status, body, &sent)
    }
}

#[async_trait]
impl AuthGateway for HttpGateway {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let url = self.url(SIGN_IN_PATH);
        tracing::debug!("[Gateway] POST {} (sign-in)", url);

        let request = self.client.post(url).json(credentials);
        let (status, body) = self.execute(request).await?;
        session_from_body(body).ok_or_else(|| {
            tracing::warn!("[Gateway] Sign-in response did not contain a session");
            MembercareError::remote(status, GENERIC_REMOTE_MESSAGE)
        })
    }
}

/// Accepts `{token, user}` either bare or wrapped in `data`.
fn session_from_body(body: Value) -> Option<Session> {
    let candidate = match body {
        Value::Object(mut map) if !map.contains_key("token") => map.remove("data")?,
        other => other,
    };
    serde_json::from_value::<Session>(candidate)
        .ok()
        .filter(Session::is_usable)
}

/// Picks the user-facing message out of an error body.
///
/// Accepts a bare JSON string, then looks at `message`, `error`, `detail`,
/// and `error.message`, where a list of strings is joined. Short plain-text
/// bodies are used as-is; anything else gets the generic notice.
pub fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return GENERIC_REMOTE_MESSAGE.to_string();
    }

    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        let candidates = [
            Some(&json),
            json.get("message"),
            json.get("error"),
            json.get("detail"),
            json.get("error").and_then(|error| error.get("message")),
        ];
        return candidates
            .into_iter()
            .flatten()
            .filter_map(message_text)
            .find(|message| !message.is_empty())
            .unwrap_or_else(|| GENERIC_REMOTE_MESSAGE.to_string());
    }

    let looks_like_markup = trimmed.starts_with('<');
    if looks_like_markup || trimmed.chars().count() > MAX_PLAIN_MESSAGE_LEN {
        GENERIC_REMOTE_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Text of a string, or of the non-blank strings of a list joined by "; ".
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        _ => None,
    }
}
