//! Wire types for the Hypergryph account service and the Skland game API.
//!
//! Request bodies are serialized in field declaration order, which matters
//! for signed requests: the signature covers the exact JSON text sent.

use serde::{Deserialize, Serialize};

/// Body of the OAuth grant request that exchanges an account token for a code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest<'a> {
    pub app_code: &'a str,
    pub token: &'a str,
    #[serde(rename = "type")]
    pub grant_type: u8,
}

/// Envelope used by `as.hypergryph.com`: `status == 0` means success.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantEnvelope {
    pub status: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<GrantCode>,
}

/// One-shot authorization code returned by the grant endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GrantCode {
    pub code: String,
    #[serde(default)]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredRequest<'a> {
    pub code: &'a str,
    pub kind: u8,
}

/// Envelope used by `zonai.skland.com`: `code == 0` means success.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Credential pair scoped to one attendance run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub cred: String,
    #[serde(rename = "token")]
    pub sign_token: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BindingList {
    #[serde(default)]
    pub list: Vec<BindingGroup>,
}

/// Characters bound to the account, grouped per game application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingGroup {
    #[serde(default)]
    pub app_code: String,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub binding_list: Vec<BoundRole>,
}

/// A character entry as returned by the binding endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundRole {
    pub uid: String,
    pub channel_master_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub nick_name: String,
}

/// A character selected for check-in, with its 1-based position in the
/// flattened binding list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub uid: String,
    pub channel_master_id: String,
    pub channel_name: String,
    pub nick_name: String,
    pub ordinal: usize,
}

impl Character {
    /// Flattens binding groups into characters, numbering them in order.
    pub fn flatten(groups: Vec<BindingGroup>) -> Vec<Character> {
        groups
            .into_iter()
            .flat_map(|group| group.binding_list)
            .enumerate()
            .map(|(idx, role)| Character {
                uid: role.uid,
                channel_master_id: role.channel_master_id,
                channel_name: role.channel_name,
                nick_name: role.nick_name,
                ordinal: idx + 1,
            })
            .collect()
    }

    /// `官服` for the official server (channel master id 1), `B 服` otherwise.
    pub fn server_label(&self) -> &'static str {
        if self.channel_master_id.trim() == "1" {
            "官服"
        } else {
            "B 服"
        }
    }

    /// Human-readable prefix used in report fragments.
    pub fn label(&self) -> String {
        format!("{}角色 {}", self.server_label(), self.ordinal)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest<'a> {
    pub uid: &'a str,
    pub game_id: &'a str,
}

/// Response of the attendance endpoint.
///
/// `raw` keeps the payload exactly as received so failures can be reported
/// verbatim; it is not part of the wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<AttendanceData>,
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl AttendanceResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0 && self.message == "OK"
    }

    pub fn awards(&self) -> &[Award] {
        self.data.as_ref().map(|d| d.awards.as_slice()).unwrap_or(&[])
    }

    /// Pretty-printed payload for diagnostics.
    pub fn raw_pretty(&self) -> String {
        let rendered = if self.raw.is_null() {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string_pretty(&self.raw)
        };
        rendered.unwrap_or_else(|_| format!("{self:?}"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceData {
    #[serde(default)]
    pub awards: Vec<Award>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub resource: AwardResource,
    pub count: u32,
}

impl Award {
    pub fn new(name: &str, count: u32) -> Self {
        Self {
            resource: AwardResource {
                id: None,
                name: name.to_string(),
            },
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}
