//! Minimal login/directory/dictionary message shapes.
//!
//! Construction of these messages (the "domain-handler primitives") is out
//! of scope (spec.md §1); only the fields the channel lifecycle FSM
//! (spec.md §4.L) and admission policy (spec.md §4.E) need to branch on
//! are modeled here.

use crate::msg::State;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub stream_id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRefresh {
    pub stream_id: i32,
    pub state: State,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryRequest {
    pub stream_id: i32,
}

/// A single advertised service, including the dictionaries it exports
/// (spec.md §4.L "advertises both RWFFld and RWFEnum").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service_id: u16,
    pub service_name: String,
    pub qos: crate::attributes::Qos,
    pub dictionaries_provided: Vec<String>,
    pub open_limit: u32,
}

pub const FIELD_DICT_NAME: &str = "RWFFld";
pub const ENUM_DICT_NAME: &str = "RWFEnum";

impl ServiceInfo {
    pub fn provides_both_dictionaries(&self) -> bool {
        self.dictionaries_provided
            .iter()
            .any(|d| d == FIELD_DICT_NAME)
            && self
                .dictionaries_provided
                .iter()
                .any(|d| d == ENUM_DICT_NAME)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryRefresh {
    pub stream_id: i32,
    pub services: Vec<ServiceInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DictionaryKind {
    Field,
    Enum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryRequest {
    pub stream_id: i32,
    pub kind: DictionaryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryRefresh {
    pub stream_id: i32,
    pub kind: DictionaryKind,
    pub refresh_complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryClose {
    pub stream_id: i32,
}
