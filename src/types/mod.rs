use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

// ============= Investigation Request =============

/// A multi-field investigation request.
///
/// Every field is optional, but admission requires at least one field to be
/// non-empty after trimming. Field names follow the submission wire format;
/// the short forms `phone` and `id` are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvestigationRequest {
    #[serde(default, alias = "phone", skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

/// Which input field a search query was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestField {
    Phone,
    Id,
    Cve,
    Keyword,
}

impl fmt::Display for RequestField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestField::Phone => "phone",
            RequestField::Id => "id",
            RequestField::Cve => "cve",
            RequestField::Keyword => "keyword",
        };
        f.write_str(name)
    }
}

impl InvestigationRequest {
    /// Convenience constructor for a CVE-only request
    pub fn cve(value: impl Into<String>) -> Self {
        Self {
            cve: Some(value.into()),
            ..Default::default()
        }
    }

    /// Convenience constructor for a keyword-only request
    pub fn keyword(value: impl Into<String>) -> Self {
        Self {
            keyword: Some(value.into()),
            ..Default::default()
        }
    }

    /// Non-empty fields in a fixed order: phone, id, cve, keyword.
    pub fn present_fields(&self) -> Vec<(RequestField, &str)> {
        [
            (RequestField::Phone, self.phone_number.as_deref()),
            (RequestField::Id, self.identifier.as_deref()),
            (RequestField::Cve, self.cve.as_deref()),
            (RequestField::Keyword, self.keyword.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            let value = value?.trim();
            (!value.is_empty()).then_some((field, value))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }

    /// Admission check performed before any task is allocated.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(AppError::InvalidInput(
                "at least one of phone_number, identifier, cve or keyword must be provided"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

// ============= Task Types =============

/// Opaque task identifier. Generated at admission, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for TaskId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(TaskId)
            .map_err(|_| AppError::NotFound(format!("Unknown task_id: {}", s)))
    }
}

/// Externally visible task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Error,
    Cancelled,
}

impl TaskState {
    /// Terminal states are sticky: no mutation is accepted afterwards.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Error | TaskState::Cancelled
        )
    }

    /// Whether `transition` may move from `self` to `next`.
    ///
    /// `completed` is only reachable from `running`. `error` and `cancelled`
    /// end a task from any non-terminal state.
    pub fn can_advance_to(self, next: TaskState) -> bool {
        match (self, next) {
            (TaskState::Pending, TaskState::Running) => true,
            (TaskState::Running, TaskState::Completed) => true,
            (current, TaskState::Error | TaskState::Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Error => "error",
            TaskState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// One timestamped progress entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

/// A normalized unit of investigative output attributable to one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Finding {
    pub website_name: String,
    pub date_found: DateTime<Utc>,
    pub source_link: String,
    pub summary: String,
}

impl Finding {
    /// Build a finding for `link`, naming the source after the link's host.
    pub fn from_link(link: &str, summary: impl Into<String>, found_at: DateTime<Utc>) -> Self {
        Self {
            website_name: source_name(link),
            date_found: found_at,
            source_link: link.to_string(),
            summary: summary.into(),
        }
    }
}

/// Host portion of `link` without a leading `www.`, or `unknown-source`.
pub fn source_name(link: &str) -> String {
    reqwest::Url::parse(link)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown-source".to_string())
}

/// Point-in-time view of a task, as returned to pollers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskStatus {
    pub task_id: TaskId,
    #[serde(rename = "status")]
    pub state: TaskState,
    pub progress_log: Vec<LogEntry>,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskStatus {
    pub fn new(task_id: TaskId) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            state: TaskState::Pending,
            progress_log: Vec::new(),
            findings: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::Configuration(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_only_request_is_empty() {
        let request = InvestigationRequest {
            phone_number: Some("   ".to_string()),
            keyword: Some(String::new()),
            ..Default::default()
        };
        assert!(request.is_empty());
        assert!(matches!(request.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_present_fields_order_and_trim() {
        let request = InvestigationRequest {
            phone_number: Some(" +1 555 0100 ".to_string()),
            identifier: None,
            cve: Some("CVE-2023-0001".to_string()),
            keyword: Some("ransomware".to_string()),
        };
        let fields = request.present_fields();
        assert_eq!(
            fields,
            vec![
                (RequestField::Phone, "+1 555 0100"),
                (RequestField::Cve, "CVE-2023-0001"),
                (RequestField::Keyword, "ransomware"),
            ]
        );
    }

    #[test]
    fn test_request_accepts_short_aliases() {
        let request: InvestigationRequest =
            serde_json::from_value(serde_json::json!({"phone": "555", "id": "abc"})).unwrap();
        assert_eq!(request.phone_number.as_deref(), Some("555"));
        assert_eq!(request.identifier.as_deref(), Some("abc"));
    }

    #[test]
    fn test_state_transitions_are_monotone() {
        assert!(TaskState::Pending.can_advance_to(TaskState::Running));
        assert!(TaskState::Running.can_advance_to(TaskState::Completed));
        assert!(TaskState::Pending.can_advance_to(TaskState::Error));
        assert!(TaskState::Pending.can_advance_to(TaskState::Cancelled));
        assert!(!TaskState::Pending.can_advance_to(TaskState::Completed));
        assert!(!TaskState::Running.can_advance_to(TaskState::Pending));
        assert!(!TaskState::Running.can_advance_to(TaskState::Running));
        assert!(!TaskState::Completed.can_advance_to(TaskState::Error));
        assert!(!TaskState::Cancelled.can_advance_to(TaskState::Completed));
    }

    #[test]
    fn test_source_name_from_link() {
        assert_eq!(source_name("https://www.example.com/a/b"), "example.com");
        assert_eq!(source_name("http://nvd.nist.gov/vuln"), "nvd.nist.gov");
        assert_eq!(source_name("not a url"), "unknown-source");
    }

    #[test]
    fn test_status_serializes_state_as_status() {
        let status = TaskStatus::new(TaskId::new());
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "pending");
        assert!(value.get("error_message").is_none());
    }
}
