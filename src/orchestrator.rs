use std::error::Error as StdError;
use std::fmt;
use std::io;

use futures::future::join_all;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::attendance::{CheckInState, FinalReport, Report, RetrySettings, run_character};
use crate::notify::{Channel, DeliverySummary, NotificationSender, REPORT_TITLE, deliver_all};
use crate::skland::error::render_chain;
use crate::skland::{Character, Session, SklandApi, SklandError};

const REPORT_HEADER: &str = "## 明日方舟签到";

/// One configured account and where its report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountJob {
    pub token: String,
    pub channels: Vec<Channel>,
}

impl AccountJob {
    pub fn new(token: String, channels: Vec<Channel>) -> Self {
        Self { token, channels }
    }

    /// Masked token safe for logs. Tokens too short to hide most of
    /// their characters are masked entirely.
    pub fn label(&self) -> String {
        if self.token.chars().count() <= 8 {
            return "****".to_string();
        }
        let prefix: String = self.token.chars().take(4).collect();
        format!("{prefix}****")
    }
}

/// What happened during one account run.
#[derive(Debug)]
pub struct AccountRunSummary {
    pub report: FinalReport,
    pub succeeded: usize,
    pub delivery: DeliverySummary,
}

/// Why a session could not be established, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFailure {
    Timeout(String),
    ConnectTimeout(String),
    Network(String),
    Other(String),
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionFailure::Timeout(d) => write!(f, "森空岛签到发生网络超时错误: {d}"),
            SessionFailure::ConnectTimeout(d) => write!(f, "森空岛签到发生连接超时错误: {d}"),
            SessionFailure::Network(d) => write!(f, "森空岛签到发生网络错误: {d}"),
            SessionFailure::Other(d) => write!(f, "森空岛签到失败: {d}"),
        }
    }
}

/// Classifies a session error by walking its cause chain.
///
/// Best-effort diagnostics only: the transport makes no promise about the
/// shape of its errors.
pub fn classify_session_error(err: &(dyn StdError + 'static)) -> SessionFailure {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(cause) = cur {
        causes.push(cause);
        cur = cause.source();
    }

    for cause in &causes {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            let marker = match io_err.kind() {
                io::ErrorKind::TimedOut => Some("TimedOut"),
                io::ErrorKind::ConnectionAborted => Some("ConnectionAborted"),
                io::ErrorKind::ConnectionReset => Some("ConnectionReset"),
                _ => None,
            };
            if let Some(marker) = marker {
                return SessionFailure::Timeout(format!("{marker} - {io_err}"));
            }
        }
        if let Some(http_err) = cause.downcast_ref::<reqwest::Error>() {
            let failure = timeout_failure(http_err.is_timeout(), http_err.is_connect(), || {
                render_chain(http_err)
            });
            if let Some(failure) = failure {
                return failure;
            }
        }
    }

    for cause in &causes {
        let text = cause.to_string();
        let lower = text.to_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") {
            return SessionFailure::Timeout(text);
        }
    }

    match causes.last() {
        Some(innermost) => SessionFailure::Network(innermost.to_string()),
        None => SessionFailure::Other(err.to_string()),
    }
}

/// Timeout category for a transport error, or `None` when it did not time out.
fn timeout_failure(
    is_timeout: bool,
    is_connect: bool,
    detail: impl FnOnce() -> String,
) -> Option<SessionFailure> {
    match (is_timeout, is_connect) {
        (true, true) => Some(SessionFailure::ConnectTimeout(detail())),
        (true, false) => Some(SessionFailure::Timeout(detail())),
        (false, _) => None,
    }
}

/// Authenticates, signs in and lists the characters of one account.
pub async fn establish_session<A: SklandApi>(
    api: &A,
    token: &str,
) -> Result<(Session, Vec<Character>), SklandError> {
    let grant = api.authenticate(token).await?;
    let session = api.sign_in(&grant.code).await?;
    let groups = api.list_bindings(&session).await?;
    Ok((session, Character::flatten(groups)))
}

/// Runs the daily check-in for accounts and always delivers the report.
pub struct AttendanceOrchestrator<'a, A, N> {
    api: &'a A,
    notifier: &'a N,
    settings: RetrySettings,
}

impl<'a, A: SklandApi, N: NotificationSender> AttendanceOrchestrator<'a, A, N> {
    pub fn new(api: &'a A, notifier: &'a N, settings: RetrySettings) -> Self {
        Self {
            api,
            notifier,
            settings,
        }
    }

    /// Runs one account. Never fails; every problem ends up in the report,
    /// which is delivered to each configured channel exactly once.
    pub async fn run(&self, job: &AccountJob) -> AccountRunSummary {
        let span = info_span!("account", account = %job.label(), run_id = %Uuid::new_v4());
        self.run_inner(job).instrument(span).await
    }

    async fn run_inner(&self, job: &AccountJob) -> AccountRunSummary {
        let report = Report::with_header(REPORT_HEADER);

        let succeeded = match establish_session(self.api, &job.token).await {
            Ok((session, characters)) => {
                info!(characters = characters.len(), "session established");
                self.check_in_all(&session, &characters, &report).await
            }
            Err(e) => {
                error!(error = %render_chain(&e), "session establishment failed");
                report.error(classify_session_error(&e).to_string());
                0
            }
        };

        let report = report.finalize();
        let delivery = deliver_all(self.notifier, &job.channels, REPORT_TITLE, &report.body).await;
        info!(
            succeeded,
            has_error = report.has_error,
            delivered = delivery.delivered.len(),
            failed = delivery.failed.len(),
            "account run finished"
        );

        AccountRunSummary {
            report,
            succeeded,
            delivery,
        }
    }

    async fn check_in_all(
        &self,
        session: &Session,
        characters: &[Character],
        report: &Report,
    ) -> usize {
        let runs = characters
            .iter()
            .map(|character| run_character(self.api, session, character, self.settings, report));
        let states = join_all(runs).await;

        let succeeded = states
            .iter()
            .filter(|s| **s == CheckInState::Succeeded)
            .count();
        if succeeded > 0 {
            report.info(format!("成功签到{succeeded}个角色"));
        }
        succeeded
    }

    /// Runs every account independently and concurrently; results come back
    /// in input order.
    pub async fn run_accounts(&self, jobs: &[AccountJob]) -> Vec<AccountRunSummary> {
        join_all(jobs.iter().map(|job| self.run(job))).await
    }
}
