//! In-memory [`SklandApi`] used by the attendance and orchestrator tests.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;

use serde_json::json;

use super::client::SklandApi;
use super::error::{CheckInError, SklandError};
use super::types::{
    AttendanceResponse, Award, BindingGroup, BoundRole, Character, GrantCode, Session,
};

type Scripted = Result<Option<AttendanceResponse>, CheckInError>;

#[derive(Default)]
pub struct FakeSkland {
    session_error: Mutex<Option<SklandError>>,
    groups: Vec<BindingGroup>,
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSkland {
    /// One binding group holding `(uid, channel_master_id)` roles.
    pub fn with_roles(roles: &[(&str, &str)]) -> Self {
        Self {
            groups: vec![BindingGroup {
                app_code: "arknights".into(),
                app_name: "明日方舟".into(),
                binding_list: roles
                    .iter()
                    .map(|(uid, channel)| BoundRole {
                        uid: uid.to_string(),
                        channel_master_id: channel.to_string(),
                        ..Default::default()
                    })
                    .collect(),
            }],
            ..Default::default()
        }
    }

    pub fn failing_session(err: SklandError) -> Self {
        Self {
            session_error: Mutex::new(Some(err)),
            ..Default::default()
        }
    }

    pub fn script(self, uid: &str, results: Vec<Scripted>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(uid.to_string(), results.into());
        self
    }

    pub fn characters(&self) -> Vec<Character> {
        Character::flatten(self.groups.clone())
    }

    pub fn calls_for(&self, uid: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == uid).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub fn success(awards: &[(&str, u32)]) -> Scripted {
    let awards: Vec<Award> = awards.iter().map(|(n, c)| Award::new(n, *c)).collect();
    let raw = json!({"code": 0, "message": "OK", "data": {"awards": awards}});
    let mut resp: AttendanceResponse = serde_json::from_value(raw.clone()).unwrap();
    resp.raw = raw;
    Ok(Some(resp))
}

pub fn rejected(code: i64, message: &str) -> Scripted {
    let raw = json!({"code": code, "message": message, "data": null});
    let mut resp: AttendanceResponse = serde_json::from_value(raw.clone()).unwrap();
    resp.raw = raw;
    Ok(Some(resp))
}

pub fn timeout_error() -> SklandError {
    SklandError::network(
        "grant request failed",
        io::Error::new(io::ErrorKind::TimedOut, "operation timed out"),
    )
}

impl SklandApi for FakeSkland {
    async fn authenticate(&self, token: &str) -> Result<GrantCode, SklandError> {
        if let Some(err) = self.session_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(GrantCode {
            code: format!("code-for-{token}"),
            uid: None,
        })
    }

    async fn sign_in(&self, code: &str) -> Result<Session, SklandError> {
        Ok(Session {
            cred: format!("cred-{code}"),
            sign_token: "sign".into(),
            user_id: None,
        })
    }

    async fn list_bindings(&self, _session: &Session) -> Result<Vec<BindingGroup>, SklandError> {
        Ok(self.groups.clone())
    }

    async fn check_in(
        &self,
        _session: &Session,
        character: &Character,
    ) -> Result<Option<AttendanceResponse>, CheckInError> {
        self.calls.lock().unwrap().push(character.uid.clone());
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&character.uid)
            .and_then(|queue| queue.pop_front());
        tokio::task::yield_now().await;
        next.unwrap_or_else(|| Err(CheckInError::Transport("script exhausted".into())))
    }
}
