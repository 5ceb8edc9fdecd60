//! ServerChan (Server酱 Turbo) push.

use reqwest::Client;
use serde::Serialize;

use super::{ChannelKind, NotifyError, read_reply};

pub const DEFAULT_BASE_URL: &str = "https://sctapi.ftqq.com";

#[derive(Debug, Serialize)]
struct Payload<'a> {
    title: &'a str,
    desp: &'a str,
}

pub async fn send(
    client: &Client,
    base_url: &str,
    send_key: &str,
    title: &str,
    body: &str,
) -> Result<(), NotifyError> {
    const KIND: ChannelKind = ChannelKind::ServerChan;

    if !send_key.starts_with("SCT") {
        return Err(NotifyError::InvalidDestination {
            kind: KIND,
            reason: "send key must start with SCT".into(),
        });
    }

    let url = format!("{}/{send_key}.send", base_url.trim_end_matches('/'));
    let response = client
        .post(url)
        .json(&Payload { title, desp: body })
        .send()
        .await
        .map_err(|source| NotifyError::Http { kind: KIND, source })?;

    let reply = read_reply(KIND, response).await?;
    match reply.get("code").and_then(|c| c.as_i64()) {
        Some(0) | None => Ok(()),
        Some(code) => Err(NotifyError::Rejected {
            kind: KIND,
            message: format!(
                "code {code}: {}",
                reply.get("message").and_then(|m| m.as_str()).unwrap_or("")
            ),
        }),
    }
}
