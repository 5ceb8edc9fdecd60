use reqwest::Client;
use serde::Serialize;

use super::{ChannelKind, NotifyError, read_reply};

const GROUP: &str = "Skland";

#[derive(Debug, Serialize)]
struct Payload<'a> {
    title: &'a str,
    body: &'a str,
    group: &'a str,
}

/// Pushes to a Bark device URL (`https://api.day.app/<key>` or a self-hosted server).
pub async fn send(client: &Client, url: &str, title: &str, body: &str) -> Result<(), NotifyError> {
    const KIND: ChannelKind = ChannelKind::Bark;

    let response = client
        .post(url)
        .json(&Payload {
            title,
            body,
            group: GROUP,
        })
        .send()
        .await
        .map_err(|source| NotifyError::Http { kind: KIND, source })?;

    let reply = read_reply(KIND, response).await?;
    match reply.get("code").and_then(|c| c.as_i64()) {
        Some(200) | None => Ok(()),
        Some(code) => Err(NotifyError::Rejected {
            kind: KIND,
            message: format!(
                "code {code}: {}",
                reply.get("message").and_then(|m| m.as_str()).unwrap_or("")
            ),
        }),
    }
}
