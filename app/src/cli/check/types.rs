use serde::{Deserialize, Serialize};

pub use xr_types::IssueCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIssue {
    #[serde(rename = "level")]
    pub kind: IssueKind,
    /// RFC6901 JSON Pointer into the records array
    pub ptr: String,
    #[serde(rename = "message")]
    pub msg: String,
    pub code: IssueCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Tag of the listener the issue belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSummary {
    pub records: usize,
    pub enabled: usize,
    pub forwarding: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub ok: bool,
    pub file: String,
    pub issues: Vec<CheckIssue>,
    pub summary: CheckSummary,
}

pub fn push_err(
    issues: &mut Vec<CheckIssue>,
    code: IssueCode,
    ptr: String,
    msg: String,
    tag: Option<&str>,
) {
    issues.push(CheckIssue {
        kind: IssueKind::Error,
        ptr,
        msg,
        code,
        hint: None,
        tag: tag.map(str::to_owned),
    });
}

pub fn push_warn(
    issues: &mut Vec<CheckIssue>,
    code: IssueCode,
    ptr: String,
    msg: String,
    hint: Option<&str>,
    tag: Option<&str>,
) {
    issues.push(CheckIssue {
        kind: IssueKind::Warning,
        ptr,
        msg,
        code,
        hint: hint.map(str::to_owned),
        tag: tag.map(str::to_owned),
    });
}
