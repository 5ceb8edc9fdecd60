//! message-pusher webhook (`https://<host>/push/<user>`).

use reqwest::Client;
use serde::Serialize;

use super::{ChannelKind, NotifyError, read_reply};

#[derive(Debug, Serialize)]
struct Payload<'a> {
    title: &'a str,
    description: &'a str,
    content: &'a str,
}

pub async fn send(client: &Client, url: &str, title: &str, body: &str) -> Result<(), NotifyError> {
    const KIND: ChannelKind = ChannelKind::MessagePusher;

    let response = client
        .post(url)
        .json(&Payload {
            title,
            description: body,
            content: body,
        })
        .send()
        .await
        .map_err(|source| NotifyError::Http { kind: KIND, source })?;

    let reply = read_reply(KIND, response).await?;
    if reply.get("success").and_then(|s| s.as_bool()) == Some(false) {
        return Err(NotifyError::Rejected {
            kind: KIND,
            message: reply
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_body_as_description_and_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"title": "t", "description": "b", "content": "b"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        send(&Client::new(), &server.uri(), "t", "b").await.unwrap();
    }

    #[tokio::test]
    async fn unsuccessful_reply_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "invalid token"})),
            )
            .mount(&server)
            .await;

        let err = send(&Client::new(), &server.uri(), "t", "b").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "MessagePusher rejected the message: invalid token"
        );
    }
}
