use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{CheckInError, SklandError};
use super::sign::{current_timestamp, sign_request};
use super::types::{
    ApiEnvelope, AttendanceRequest, AttendanceResponse, BindingGroup, BindingList, Character,
    CredRequest, GrantCode, GrantEnvelope, GrantRequest, Session,
};

const AUTH_BASE_URL: &str = "https://as.hypergryph.com";
const API_BASE_URL: &str = "https://zonai.skland.com";

const GRANT_PATH: &str = "/user/oauth2/v2/grant";
const CRED_PATH: &str = "/api/v1/user/auth/generate_cred_by_code";
const BINDING_PATH: &str = "/api/v1/game/player/binding";
const ATTENDANCE_PATH: &str = "/api/v1/game/attendance";

/// Application code Skland registers with the Hypergryph account service.
const APP_CODE: &str = "4ca99fa6b56cc2ba";

const USER_AGENT: &str = "Skland/1.0.1 (com.hypergryph.skland; build:100001014; Android 31; ) Okhttp/4.11.0";

/// Session and check-in operations against Skland.
///
/// Implemented by [`SklandClient`] over HTTP and by in-memory fakes in tests.
#[allow(async_fn_in_trait)]
pub trait SklandApi {
    /// Exchanges an account token for a one-shot grant code.
    async fn authenticate(&self, token: &str) -> Result<GrantCode, SklandError>;

    /// Exchanges a grant code for a session credential.
    async fn sign_in(&self, code: &str) -> Result<Session, SklandError>;

    /// Lists the characters bound to the session's account.
    async fn list_bindings(&self, session: &Session) -> Result<Vec<BindingGroup>, SklandError>;

    /// Performs today's check-in for one character. `Ok(None)` means there was
    /// nothing to do.
    async fn check_in(
        &self,
        session: &Session,
        character: &Character,
    ) -> Result<Option<AttendanceResponse>, CheckInError>;
}

pub struct SklandClient {
    client: Client,
    auth_base: String,
    api_base: String,
}

impl SklandClient {
    pub fn new(request_timeout: Duration) -> Result<Self, SklandError> {
        Self::with_base_urls(
            AUTH_BASE_URL.to_string(),
            API_BASE_URL.to_string(),
            request_timeout,
        )
    }

    /// Create a client pointing at custom base URLs (useful for testing).
    pub fn with_base_urls(
        auth_base: String,
        api_base: String,
        request_timeout: Duration,
    ) -> Result<Self, SklandError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SklandError::network("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            auth_base: auth_base.trim_end_matches('/').to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<Response, SklandError> {
        let response = request
            .send()
            .await
            .map_err(|e| SklandError::network(format!("{what} request failed"), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SklandError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> Result<T, SklandError> {
        let envelope = response
            .json::<ApiEnvelope<T>>()
            .await
            .map_err(|e| SklandError::Decode(format!("{what}: {e}")))?;
        if envelope.code != 0 {
            return Err(SklandError::Api {
                code: envelope.code,
                message: envelope.message,
            });
        }
        envelope
            .data
            .ok_or_else(|| SklandError::Decode(format!("{what}: missing data")))
    }
}

impl SklandApi for SklandClient {
    async fn authenticate(&self, token: &str) -> Result<GrantCode, SklandError> {
        let body = GrantRequest {
            app_code: APP_CODE,
            token,
            grant_type: 0,
        };
        let request = self
            .client
            .post(format!("{}{GRANT_PATH}", self.auth_base))
            .json(&body);
        let response = self.send(request, "grant").await?;

        let envelope = response
            .json::<GrantEnvelope>()
            .await
            .map_err(|e| SklandError::Decode(format!("grant: {e}")))?;
        if envelope.status != 0 {
            return Err(SklandError::Api {
                code: envelope.status,
                message: envelope.msg,
            });
        }
        envelope
            .data
            .ok_or_else(|| SklandError::Decode("grant: missing data".into()))
    }

    async fn sign_in(&self, code: &str) -> Result<Session, SklandError> {
        let request = self
            .client
            .post(format!("{}{CRED_PATH}", self.api_base))
            .json(&CredRequest { code, kind: 1 });
        let response = self.send(request, "generate_cred_by_code").await?;
        Self::read_envelope::<Session>(response, "generate_cred_by_code").await
    }

    async fn list_bindings(&self, session: &Session) -> Result<Vec<BindingGroup>, SklandError> {
        let signed = sign_request(&session.sign_token, BINDING_PATH, "", &current_timestamp())?;
        let mut request = self.client.get(format!("{}{BINDING_PATH}", self.api_base));
        for (name, value) in signed.as_pairs(&session.cred) {
            request = request.header(name, value);
        }
        let response = self.send(request, "binding").await?;
        let data = Self::read_envelope::<BindingList>(response, "binding").await?;
        Ok(data.list)
    }

    async fn check_in(
        &self,
        session: &Session,
        character: &Character,
    ) -> Result<Option<AttendanceResponse>, CheckInError> {
        let body = serde_json::to_string(&AttendanceRequest {
            uid: &character.uid,
            game_id: &character.channel_master_id,
        })
        .map_err(|e| CheckInError::Transport(e.to_string()))?;

        let signed = sign_request(
            &session.sign_token,
            ATTENDANCE_PATH,
            &body,
            &current_timestamp(),
        )?;
        let mut request = self
            .client
            .post(format!("{}{ATTENDANCE_PATH}", self.api_base))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        for (name, value) in signed.as_pairs(&session.cred) {
            request = request.header(name, value);
        }

        let response = self.send(request, "attendance").await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let text = response
            .text()
            .await
            .map_err(|e| CheckInError::Transport(e.to_string()))?;
        if text.trim().is_empty() {
            debug!(uid = %character.uid, "attendance returned an empty body");
            return Ok(None);
        }

        let raw: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| CheckInError::Transport(format!("invalid attendance response: {e}")))?;
        let mut parsed: AttendanceResponse = serde_json::from_value(raw.clone())
            .map_err(|e| CheckInError::Transport(format!("invalid attendance response: {e}")))?;
        parsed.raw = raw;
        Ok(Some(parsed))
    }
}
