//! One-shot delivery check for every configured channel.

use tracing::info;

use super::{Channel, ChannelKind, NotificationSender};

pub const SAMPLE_TITLE: &str = "【森空岛每日签到】通知测试";
pub const SAMPLE_BODY: &str = "## 通知测试\n\n这是一条测试消息, 收到说明推送配置正确。";

#[derive(Debug, Default)]
pub struct SelfTestSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<(ChannelKind, Result<(), String>)>,
}

/// Sends the fixed sample message once through each channel and counts the
/// outcomes. Holds no state between calls.
pub async fn run_self_test<N: NotificationSender>(
    sender: &N,
    channels: &[Channel],
) -> SelfTestSummary {
    let mut summary = SelfTestSummary::default();
    for channel in channels {
        let kind = channel.kind();
        let result = sender
            .send(channel, SAMPLE_TITLE, SAMPLE_BODY)
            .await
            .map_err(|e| e.to_string());
        match &result {
            Ok(()) => summary.succeeded += 1,
            Err(_) => summary.failed += 1,
        }
        info!(channel = %kind, ok = result.is_ok(), "self-test delivery");
        summary.results.push((kind, result));
    }
    summary
}
