//! Response bodies returned by the gateway. Decode with
//! [ApiResponse::json](crate::transport::ApiResponse::json).

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub key: Map<String, Value>,
    #[serde(default)]
    pub message: Map<String, Value>,
    pub message_timestamp: Value,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConnectionState {
    pub state: String,
    #[serde(default)]
    pub status_reason: Option<i64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GroupParticipant {
    pub id: String,
    #[serde(default)]
    pub admin: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub subject_owner: Option<String>,
    #[serde(default)]
    pub subject_time: Option<i64>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub creation: Option<i64>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub restrict: Option<bool>,
    #[serde(default)]
    pub announce: Option<bool>,
    #[serde(default)]
    pub participants: Vec<GroupParticipant>,
}
