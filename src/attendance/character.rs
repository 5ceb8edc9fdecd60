//! Per-character check-in loop.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use super::report::Report;
use super::state::{AttemptOutcome, CharacterRun, CheckInState, Transition};
use crate::skland::{AttendanceResponse, CheckInError, Character, Session, SklandApi};

/// Retry policy shared by every character of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Failed attempts allowed before giving up on a character.
    pub max_retries: u32,
    /// Fixed pause between two attempts of the same character.
    pub retry_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(3),
        }
    }
}

impl AttemptOutcome {
    pub fn from_result(result: Result<Option<AttendanceResponse>, CheckInError>) -> Self {
        match result {
            Ok(Some(resp)) if resp.is_success() => AttemptOutcome::Success(resp.awards().to_vec()),
            Ok(Some(resp)) => AttemptOutcome::Failure {
                raw: resp.raw_pretty(),
                message: resp.message,
            },
            Ok(None) | Err(CheckInError::AlreadyCheckedIn) => AttemptOutcome::AlreadyCheckedIn,
            Err(CheckInError::Rejected { message, raw }) => AttemptOutcome::Failure { message, raw },
            Err(CheckInError::Transport(detail)) => AttemptOutcome::NetworkError(detail),
        }
    }
}

/// Report fragment for an attempt outcome and whether it counts as an error.
fn describe(character: &Character, outcome: &AttemptOutcome) -> (String, bool) {
    let label = character.label();
    match outcome {
        AttemptOutcome::Success(awards) if awards.is_empty() => (format!("{label} 签到成功"), false),
        AttemptOutcome::Success(awards) => {
            let items = awards
                .iter()
                .map(|a| format!("「{}」{}个", a.resource.name, a.count))
                .collect::<Vec<_>>()
                .join(",");
            (format!("{label} 签到成功, 获得了{items}"), false)
        }
        AttemptOutcome::AlreadyCheckedIn => (format!("{label} 今天已经签到过了"), false),
        AttemptOutcome::Failure { message, raw } => (
            format!("{label} 签到失败, 错误消息: {message}\n\n```json\n{raw}\n```"),
            true,
        ),
        AttemptOutcome::NetworkError(detail) => {
            (format!("{label} 签到过程中出现未知错误: {detail}"), true)
        }
    }
}

/// Drives one character to a terminal state, writing every outcome into
/// `report`. Never fails: errors end up as report fragments.
pub async fn run_character<A: SklandApi>(
    api: &A,
    session: &Session,
    character: &Character,
    settings: RetrySettings,
    report: &Report,
) -> CheckInState {
    let mut run = CharacterRun::new(settings.max_retries);

    loop {
        run.begin_attempt();
        let outcome = AttemptOutcome::from_result(api.check_in(session, character).await);
        let (text, is_error) = describe(character, &outcome);
        report.add(text, is_error);

        match run.next(&outcome) {
            Transition::Retry { attempt } => {
                debug!(
                    uid = %character.uid,
                    attempt,
                    max = settings.max_retries,
                    delay_ms = settings.retry_delay.as_millis() as u64,
                    "retrying check-in"
                );
                sleep(settings.retry_delay).await;
            }
            Transition::Complete(state) => {
                if state == CheckInState::GaveUp {
                    report.error(format!(
                        "{} 已达到最大重试次数 {}, 跳过",
                        character.label(),
                        settings.max_retries
                    ));
                }
                debug!(uid = %character.uid, state = %state, history = ?run.state_history, "character finished");
                return state;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::report::FragmentLevel;
    use crate::skland::fake::{FakeSkland, rejected, success};

    fn fast(max_retries: u32) -> RetrySettings {
        RetrySettings {
            max_retries,
            retry_delay: Duration::ZERO,
        }
    }

    fn session() -> Session {
        Session {
            cred: "c".into(),
            sign_token: "s".into(),
            user_id: None,
        }
    }

    fn first_character(api: &FakeSkland) -> Character {
        api.characters().remove(0)
    }

    #[tokio::test]
    async fn success_lists_awards() {
        let api = FakeSkland::with_roles(&[("u1", "1")])
            .script("u1", vec![success(&[("龙门币", 100), ("招聘许可", 1)])]);
        let report = Report::new();
        let state =
            run_character(&api, &session(), &first_character(&api), fast(3), &report).await;

        assert_eq!(state, CheckInState::Succeeded);
        assert_eq!(
            report.fragments()[0].text,
            "官服角色 1 签到成功, 获得了「龙门币」100个,「招聘许可」1个"
        );
        assert!(!report.has_error());
    }

    #[tokio::test]
    async fn success_without_awards_omits_clause() {
        let api = FakeSkland::with_roles(&[("u1", "2")]).script("u1", vec![success(&[])]);
        let report = Report::new();
        run_character(&api, &session(), &first_character(&api), fast(3), &report).await;
        assert_eq!(report.fragments()[0].text, "B 服角色 1 签到成功");
    }

    #[tokio::test]
    async fn nothing_to_do_is_informational_and_not_retried() {
        let api = FakeSkland::with_roles(&[("u1", "1")]).script("u1", vec![Ok(None)]);
        let report = Report::new();
        let state =
            run_character(&api, &session(), &first_character(&api), fast(3), &report).await;

        assert_eq!(state, CheckInState::AlreadyDone);
        assert_eq!(api.calls_for("u1"), 1);
        let fragments = report.fragments();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "官服角色 1 今天已经签到过了");
        assert_eq!(fragments[0].level, FragmentLevel::Info);
    }

    #[tokio::test]
    async fn forbidden_is_already_done() {
        let api = FakeSkland::with_roles(&[("u1", "1")])
            .script("u1", vec![Err(CheckInError::AlreadyCheckedIn)]);
        let report = Report::new();
        let state =
            run_character(&api, &session(), &first_character(&api), fast(3), &report).await;

        assert_eq!(state, CheckInState::AlreadyDone);
        assert_eq!(api.calls_for("u1"), 1);
        assert_eq!(report.len(), 1);
        assert!(!report.has_error());
    }

    #[tokio::test]
    async fn structured_failures_exhaust_retries() {
        let api = FakeSkland::with_roles(&[("u1", "1")]).script(
            "u1",
            vec![rejected(1, "busy"), rejected(1, "busy"), rejected(1, "busy")],
        );
        let report = Report::new();
        let state =
            run_character(&api, &session(), &first_character(&api), fast(3), &report).await;

        assert_eq!(state, CheckInState::GaveUp);
        assert_eq!(api.calls_for("u1"), 3);
        let fragments = report.fragments();
        assert_eq!(fragments.len(), 4);
        for f in &fragments[..3] {
            assert!(f.text.starts_with("官服角色 1 签到失败, 错误消息: busy"));
            assert!(f.text.contains("```json"));
            assert!(f.text.contains("\"code\": 1"));
            assert_eq!(f.level, FragmentLevel::Error);
        }
        assert_eq!(fragments[3].text, "官服角色 1 已达到最大重试次数 3, 跳过");
        assert!(report.has_error());
    }

    #[tokio::test]
    async fn transport_errors_exhaust_retries() {
        let reset = || Err(CheckInError::Transport("connection reset".into()));
        let api = FakeSkland::with_roles(&[("u1", "2")])
            .script("u1", vec![reset(), reset(), reset()]);
        let report = Report::new();
        let state =
            run_character(&api, &session(), &first_character(&api), fast(3), &report).await;

        assert_eq!(state, CheckInState::GaveUp);
        assert_eq!(api.calls_for("u1"), 3);
        let texts: Vec<_> = report.fragments().into_iter().map(|f| f.text).collect();
        assert_eq!(
            texts,
            vec![
                "B 服角色 1 签到过程中出现未知错误: connection reset".to_string(),
                "B 服角色 1 签到过程中出现未知错误: connection reset".to_string(),
                "B 服角色 1 签到过程中出现未知错误: connection reset".to_string(),
                "B 服角色 1 已达到最大重试次数 3, 跳过".to_string(),
            ]
        );
        assert!(report.fragments().iter().all(|f| f.level == FragmentLevel::Error));
    }

    #[tokio::test]
    async fn transport_error_then_success() {
        let api = FakeSkland::with_roles(&[("u1", "1")]).script(
            "u1",
            vec![
                Err(CheckInError::Transport("connection reset".into())),
                success(&[("龙门币", 100)]),
            ],
        );
        let report = Report::new();
        let state =
            run_character(&api, &session(), &first_character(&api), fast(3), &report).await;

        assert_eq!(state, CheckInState::Succeeded);
        let texts: Vec<_> = report.fragments().into_iter().map(|f| f.text).collect();
        assert_eq!(
            texts,
            vec![
                "官服角色 1 签到过程中出现未知错误: connection reset".to_string(),
                "官服角色 1 签到成功, 获得了「龙门币」100个".to_string(),
            ]
        );
        assert!(report.has_error());
    }

    #[tokio::test]
    async fn rejected_error_is_a_failure_with_raw_body() {
        let outcome = AttemptOutcome::from_result(Err(CheckInError::Rejected {
            message: "HTTP 500".into(),
            raw: "oops".into(),
        }));
        assert_eq!(
            outcome,
            AttemptOutcome::Failure {
                message: "HTTP 500".into(),
                raw: "oops".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_attempts() {
        let api = FakeSkland::with_roles(&[("u1", "1")])
            .script("u1", vec![rejected(1, "busy"), success(&[])]);
        let report = Report::new();
        let started = tokio::time::Instant::now();
        run_character(
            &api,
            &session(),
            &first_character(&api),
            RetrySettings::default(),
            &report,
        )
        .await;
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
