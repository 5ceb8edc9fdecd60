//! WeChat Work (企业微信) group robot webhook.

use reqwest::Client;
use serde::Serialize;

use super::{ChannelKind, NotifyError, read_reply};

#[derive(Debug, Serialize)]
struct Payload {
    msgtype: &'static str,
    markdown: Markdown,
}

#[derive(Debug, Serialize)]
struct Markdown {
    content: String,
}

pub async fn send(client: &Client, url: &str, title: &str, body: &str) -> Result<(), NotifyError> {
    const KIND: ChannelKind = ChannelKind::WeChatWork;

    let payload = Payload {
        msgtype: "markdown",
        markdown: Markdown {
            content: format!("## {title}\n{body}"),
        },
    };
    let response = client
        .post(url)
        .json(&payload)
        .send()
        .await
        .map_err(|source| NotifyError::Http { kind: KIND, source })?;

    let reply = read_reply(KIND, response).await?;
    match reply.get("errcode").and_then(|c| c.as_i64()) {
        Some(0) | None => Ok(()),
        Some(code) => Err(NotifyError::Rejected {
            kind: KIND,
            message: format!(
                "errcode {code}: {}",
                reply.get("errmsg").and_then(|m| m.as_str()).unwrap_or("")
            ),
        }),
    }
}
