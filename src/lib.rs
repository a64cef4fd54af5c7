// lib.rs - WorkNest shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod pagination;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use app::App;
pub use capabilities::{Capabilities, Effect, HttpResponse, HttpResult};
pub use pagination::{Applied, FetchKind, FetchTicket, Page, PageInfo, Paginator, PaginatorConfig};

pub const DEFAULT_API_BASE: &str = "https://api.worknest.app";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const FEED_TIMEOUT: Duration = Duration::from_secs(30);
pub const MUTATION_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_POSTING_TITLE_LENGTH: usize = 80;
pub const MAX_POSTING_DESCRIPTION_LENGTH: usize = 2000;
pub const MIN_HOURLY_WAGE: u32 = 10_030;
pub const MAX_HOURLY_WAGE: u32 = 1_000_000;
pub const MIN_REVIEW_SCORE: u8 = 1;
pub const MAX_REVIEW_SCORE: u8 = 5;
pub const MAX_REVIEW_COMMENT_LENGTH: usize = 500;
pub const DESCRIPTION_PREVIEW_LENGTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    RateLimited,
    Deserialization,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Conflict | Self::RateLimited => {
                ErrorSeverity::Transient
            }

            Self::Deserialization | Self::InvalidState | Self::Internal => ErrorSeverity::Fatal,

            Self::Authentication
            | Self::Authorization
            | Self::Validation
            | Self::NotFound
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Conflict
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub retry_after_ms: Option<u64>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            retry_after_ms: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_retry_after(mut self, ms: u64) -> Self {
        self.retry_after_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Authorization => "You don't have permission to perform this action.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Conflict => {
                "This action conflicts with a recent change. Please refresh and try again.".into()
            }
            ErrorKind::RateLimited => {
                if let Some(retry_after) = self.retry_after_ms {
                    let seconds = retry_after / 1000;
                    format!("Too many requests. Please wait {seconds} seconds and try again.")
                } else {
                    "Too many requests. Please wait a moment and try again.".into()
                }
            }
            ErrorKind::Deserialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::InvalidState => "The app is in an invalid state. Please try again.".into(),
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

pub type AppResult<T> = Result<T, AppError>;

impl From<capabilities::HttpError> for AppError {
    fn from(error: capabilities::HttpError) -> Self {
        let internal = error.to_string();
        match error {
            capabilities::HttpError::Network(_) | capabilities::HttpError::Cancelled => {
                Self::new(ErrorKind::Network, "The request could not reach the server")
                    .with_internal(internal)
            }
            capabilities::HttpError::Timeout { .. } => {
                Self::new(ErrorKind::Timeout, "The request timed out").with_internal(internal)
            }
            capabilities::HttpError::InvalidResponse { .. } => {
                Self::new(ErrorKind::Deserialization, "Received a malformed server response")
                    .with_internal(internal)
            }
            capabilities::HttpError::InvalidUrl { .. }
            | capabilities::HttpError::InvalidHeader { .. }
            | capabilities::HttpError::InvalidRequest { .. } => {
                Self::new(ErrorKind::Internal, "The request could not be constructed")
                    .with_internal(internal)
            }
        }
    }
}

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(UserId);
typed_id!(PostingId);
typed_id!(ApplicationId);
typed_id!(NotificationId);
typed_id!(RequestId);

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[must_use]
pub fn format_wage(hourly_wage: u32) -> String {
    let digits = hourly_wage.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("\u{20a9}{grouped}/hr")
}

#[must_use]
pub fn format_relative_time(timestamp_ms: u64, now_ms: u64) -> String {
    if timestamp_ms > now_ms {
        let future_diff_secs = timestamp_ms.saturating_sub(now_ms) / 1000;
        return if future_diff_secs < 60 {
            "Just now".into()
        } else {
            "Upcoming".into()
        };
    }

    let diff_secs = now_ms.saturating_sub(timestamp_ms) / 1000;

    if diff_secs < 5 {
        return "Just now".into();
    }
    if diff_secs < 60 {
        return format!("{diff_secs}s ago");
    }

    let diff_mins = diff_secs / 60;
    if diff_mins < 60 {
        return format!("{diff_mins}m ago");
    }

    let diff_hours = diff_mins / 60;
    if diff_hours < 24 {
        return format!("{diff_hours}h ago");
    }

    let diff_days = diff_hours / 24;
    if diff_days < 7 {
        return format!("{diff_days}d ago");
    }
    if diff_days < 30 {
        return format!("{}w ago", diff_days / 7);
    }
    if diff_days < 365 {
        return format!("{}mo ago", diff_days / 30);
    }

    format!("{}y ago", diff_days / 365)
}

#[must_use]
pub fn format_career_months(months: u32) -> String {
    if months == 0 {
        return "New to this work".into();
    }
    let years = months / 12;
    let remainder = months % 12;
    match (years, remainder) {
        (0, m) => format!("{m} mo experience"),
        (y, 0) => format!("{y} yr experience"),
        (y, m) => format!("{y} yr {m} mo experience"),
    }
}

#[must_use]
pub fn preview_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}\u{2026}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Seeker,
    Owner,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seeker => "seeker",
            Self::Owner => "owner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Accepted,
    Rejected,
    Canceled,
}

impl ApplicationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Canceled => "canceled",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Canceled => "Canceled",
        }
    }

    /// A decided application can no longer be accepted or rejected.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    #[must_use]
    pub const fn target_status(self) -> ApplicationStatus {
        match self {
            Self::Accept => ApplicationStatus::Accepted,
            Self::Reject => ApplicationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mon => "Monday",
            Self::Tue => "Tuesday",
            Self::Wed => "Wednesday",
            Self::Thu => "Thursday",
            Self::Fri => "Friday",
            Self::Sat => "Saturday",
            Self::Sun => "Sunday",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftTime {
    hour: u8,
    minute: u8,
}

impl ShiftTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, PostingDraftError> {
        if hour > 23 || minute > 59 {
            return Err(PostingDraftError::InvalidShiftTime { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for ShiftTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub posting_id: PostingId,
    pub posting_title: String,
    pub business_name: String,
    pub hourly_wage: u32,
    pub status: ApplicationStatus,
    pub applied_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: ApplicationId,
    pub applicant_id: UserId,
    pub name: String,
    pub status: ApplicationStatus,
    pub applied_at_ms: u64,
    #[serde(default)]
    pub introduction: Option<String>,
    #[serde(default)]
    pub career_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub read: bool,
    pub created_at_ms: u64,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationStatus {
    Pending,
    Completed,
    Expired,
}

impl ReputationStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting review",
            Self::Completed => "Reviewed",
            Self::Expired => "Expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationRequest {
    pub id: RequestId,
    pub counterpart_name: String,
    pub posting_title: String,
    pub role: Role,
    pub status: ReputationStatus,
    pub requested_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Open,
    Closed,
}

impl PostingStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingSummary {
    pub id: PostingId,
    pub title: String,
    pub hourly_wage: u32,
    pub status: PostingStatus,
    #[serde(default)]
    pub applicant_count: u32,
    pub created_at_ms: u64,
}

/// Envelope for non-paginated collection endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PostingDraftError {
    #[error("Give the posting a title")]
    EmptyTitle,
    #[error("The title is too long ({len} of at most {max} characters)")]
    TitleTooLong { len: usize, max: usize },
    #[error("The description is too long ({len} of at most {max} characters)")]
    DescriptionTooLong { len: usize, max: usize },
    #[error("The hourly wage must be at least \u{20a9}{min}")]
    WageBelowMinimum { wage: u32, min: u32 },
    #[error("The hourly wage cannot exceed \u{20a9}{max}")]
    WageAboveMaximum { wage: u32, max: u32 },
    #[error("Pick at least one work day")]
    NoWorkDays,
    #[error("The shift cannot start and end at the same time")]
    EmptyShift,
    #[error("{hour:02}:{minute:02} is not a valid time of day")]
    InvalidShiftTime { hour: u8, minute: u8 },
}

impl From<PostingDraftError> for AppError {
    fn from(error: PostingDraftError) -> Self {
        Self::new(ErrorKind::Validation, error.to_string())
    }
}

/// A job posting as entered in the form, validated before submission.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingDraft {
    pub title: String,
    pub description: String,
    pub hourly_wage: u32,
    pub work_days: Vec<Weekday>,
    pub start_time: ShiftTime,
    pub end_time: ShiftTime,
}

impl PostingDraft {
    pub fn validate(&self) -> Result<(), PostingDraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(PostingDraftError::EmptyTitle);
        }
        let title_len = title.chars().count();
        if title_len > MAX_POSTING_TITLE_LENGTH {
            return Err(PostingDraftError::TitleTooLong {
                len: title_len,
                max: MAX_POSTING_TITLE_LENGTH,
            });
        }
        let description_len = self.description.chars().count();
        if description_len > MAX_POSTING_DESCRIPTION_LENGTH {
            return Err(PostingDraftError::DescriptionTooLong {
                len: description_len,
                max: MAX_POSTING_DESCRIPTION_LENGTH,
            });
        }
        if self.hourly_wage < MIN_HOURLY_WAGE {
            return Err(PostingDraftError::WageBelowMinimum {
                wage: self.hourly_wage,
                min: MIN_HOURLY_WAGE,
            });
        }
        if self.hourly_wage > MAX_HOURLY_WAGE {
            return Err(PostingDraftError::WageAboveMaximum {
                wage: self.hourly_wage,
                max: MAX_HOURLY_WAGE,
            });
        }
        if self.work_days.is_empty() {
            return Err(PostingDraftError::NoWorkDays);
        }
        // Overnight shifts (end before start) are valid.
        if self.start_time == self.end_time {
            return Err(PostingDraftError::EmptyShift);
        }
        Ok(())
    }

    fn request_body(&self) -> CreatePostingRequest<'_> {
        CreatePostingRequest {
            title: self.title.trim(),
            description: &self.description,
            hourly_wage: self.hourly_wage,
            work_days: &self.work_days,
            start_time: self.start_time.to_string(),
            end_time: self.end_time.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostingRequest<'a> {
    title: &'a str,
    description: &'a str,
    hourly_wage: u32,
    work_days: &'a [Weekday],
    start_time: String,
    end_time: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewDraftError {
    #[error("The score must be between {min} and {max}")]
    ScoreOutOfRange { score: u8, min: u8, max: u8 },
    #[error("The comment is too long ({len} of at most {max} characters)")]
    CommentTooLong { len: usize, max: usize },
}

impl From<ReviewDraftError> for AppError {
    fn from(error: ReviewDraftError) -> Self {
        Self::new(ErrorKind::Validation, error.to_string())
    }
}

/// A validated reputation review. Construction is the validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    score: u8,
    comment: String,
}

impl ReviewDraft {
    pub fn new(score: u8, comment: impl Into<String>) -> Result<Self, ReviewDraftError> {
        if !(MIN_REVIEW_SCORE..=MAX_REVIEW_SCORE).contains(&score) {
            return Err(ReviewDraftError::ScoreOutOfRange {
                score,
                min: MIN_REVIEW_SCORE,
                max: MAX_REVIEW_SCORE,
            });
        }
        let comment = comment.into();
        let len = comment.chars().count();
        if len > MAX_REVIEW_COMMENT_LENGTH {
            return Err(ReviewDraftError::CommentTooLong {
                len,
                max: MAX_REVIEW_COMMENT_LENGTH,
            });
        }
        Ok(Self { score, comment })
    }

    #[must_use]
    pub const fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    fn request_body(&self) -> SubmitReviewRequest<'_> {
        SubmitReviewRequest {
            score: self.score,
            comment: &self.comment,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct SubmitReviewRequest<'a> {
    score: u8,
    comment: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct DecisionBody {
    status: ApplicationStatus,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("Application {0} is not in the loaded list")]
    NotFound(ApplicationId),
    #[error("Application {0} already has a decision in flight")]
    AlreadyPending(ApplicationId),
    #[error("Application {0} was already decided")]
    AlreadyDecided(ApplicationId),
}

impl From<DecisionError> for AppError {
    fn from(error: DecisionError) -> Self {
        let kind = match &error {
            DecisionError::NotFound(_) => ErrorKind::NotFound,
            DecisionError::AlreadyPending(_) => ErrorKind::InvalidState,
            DecisionError::AlreadyDecided(_) => ErrorKind::Conflict,
        };
        Self::new(kind, error.to_string())
    }
}

/// An accept/reject applied to the list before the server confirms it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDecision {
    pub decision: Decision,
    pub previous_status: ApplicationStatus,
    pub mutation_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub created_at_ms: u64,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at_ms: get_current_time_ms(),
            duration_ms: kind.default_duration_ms(),
        }
    }

    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > self.duration_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

/// One paginated list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Applications,
    Applicants,
    Notifications,
    Reputation,
}

impl Feed {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Applications => "applications",
            Self::Applicants => "applicants",
            Self::Notifications => "notifications",
            Self::Reputation => "reputation",
        }
    }
}

/// Authenticated session handed over by the shell after login. The token is
/// held behind `SecretString` so accidental Debug output stays redacted.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    jwt: SecretString,
}

impl Session {
    #[must_use]
    pub fn new(user_id: UserId, jwt: String) -> Self {
        Self {
            user_id,
            jwt: SecretString::new(jwt),
        }
    }

    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.jwt.expose_secret())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_base: String,
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }
}

#[derive(Debug)]
pub struct Model {
    pub api: ApiConfig,
    pub session: Option<Session>,
    pub network_online: bool,
    pub role: Role,

    pub applications: Paginator<Application>,
    pub application_filter: Option<ApplicationStatus>,

    pub applicants: Paginator<Applicant>,
    pub selected_posting_id: Option<PostingId>,

    pub notifications: Paginator<NotificationItem>,
    pub reputation: Paginator<ReputationRequest>,

    pub my_postings: Vec<PostingSummary>,
    pub my_postings_loading: bool,

    pub pending_decisions: HashMap<ApplicationId, PendingDecision>,
    pub pending_reviews: HashSet<RequestId>,
    pub posting_in_flight: bool,

    pub active_error: Option<AppError>,
    pub active_toast: Option<ToastMessage>,
    pub view_timestamp_ms: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: None,
            network_online: true,
            role: Role::default(),
            applications: Paginator::default(),
            application_filter: None,
            applicants: Self::applicants_feed(),
            selected_posting_id: None,
            notifications: Paginator::default(),
            reputation: Paginator::default(),
            my_postings: Vec::new(),
            my_postings_loading: false,
            pending_decisions: HashMap::new(),
            pending_reviews: HashSet::new(),
            posting_in_flight: false,
            active_error: None,
            active_toast: None,
            view_timestamp_ms: get_current_time_ms(),
        }
    }
}

impl Model {
    /// Applicants can only be fetched for a selected posting, so the feed
    /// must not auto-start when it is enabled.
    fn applicants_feed() -> Paginator<Applicant> {
        Paginator::new(PaginatorConfig {
            enabled: true,
            auto_load: false,
        })
    }

    pub fn update_timestamp(&mut self) {
        self.view_timestamp_ms = get_current_time_ms();
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.active_toast = Some(ToastMessage::new(message, kind));
    }

    pub fn clear_toast(&mut self) {
        self.active_toast = None;
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Apply an accept/reject to the loaded list, remembering how to undo it.
    pub fn begin_decision(
        &mut self,
        application_id: &ApplicationId,
        decision: Decision,
    ) -> Result<(), DecisionError> {
        if self.pending_decisions.contains_key(application_id) {
            return Err(DecisionError::AlreadyPending(application_id.clone()));
        }
        let item = self
            .applicants
            .items_mut()
            .iter_mut()
            .find(|a| &a.id == application_id)
            .ok_or_else(|| DecisionError::NotFound(application_id.clone()))?;
        if item.status.is_decided() {
            return Err(DecisionError::AlreadyDecided(application_id.clone()));
        }
        let previous_status = item.status;
        item.status = decision.target_status();
        self.pending_decisions.insert(
            application_id.clone(),
            PendingDecision {
                decision,
                previous_status,
                mutation_id: Uuid::new_v4().to_string(),
            },
        );
        Ok(())
    }

    /// The server confirmed the decision; the optimistic state is now real.
    pub fn settle_decision(&mut self, application_id: &ApplicationId) -> Option<PendingDecision> {
        self.pending_decisions.remove(application_id)
    }

    /// The server refused the decision; put the list row back.
    pub fn revert_decision(&mut self, application_id: &ApplicationId) -> Option<PendingDecision> {
        let pending = self.pending_decisions.remove(application_id)?;
        if let Some(item) = self
            .applicants
            .items_mut()
            .iter_mut()
            .find(|a| &a.id == application_id)
        {
            item.status = pending.previous_status;
        }
        Some(pending)
    }

    /// Returns true when the item existed and was unread.
    pub fn mark_notification_read(&mut self, id: &NotificationId) -> bool {
        match self
            .notifications
            .items_mut()
            .iter_mut()
            .find(|n| &n.id == id)
        {
            Some(item) if !item.read => {
                item.read = true;
                true
            }
            _ => false,
        }
    }

    pub fn revert_notification_read(&mut self, id: &NotificationId) {
        if let Some(item) = self
            .notifications
            .items_mut()
            .iter_mut()
            .find(|n| &n.id == id)
        {
            item.read = false;
        }
    }

    #[must_use]
    pub fn unread_notifications(&self) -> usize {
        self.notifications.items().iter().filter(|n| !n.read).count()
    }

    /// Drop everything tied to the signed-in user.
    pub fn clear_user_state(&mut self) {
        self.session = None;
        self.applications = Paginator::default();
        self.application_filter = None;
        self.applicants = Self::applicants_feed();
        self.selected_posting_id = None;
        self.notifications = Paginator::default();
        self.reputation = Paginator::default();
        self.my_postings.clear();
        self.my_postings_loading = false;
        self.pending_decisions.clear();
        self.pending_reviews.clear();
        self.posting_in_flight = false;
        self.active_error = None;
        self.active_toast = None;
        if !self.network_online {
            self.applications.set_enabled(false);
            self.applicants.set_enabled(false);
            self.notifications.set_enabled(false);
            self.reputation.set_enabled(false);
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Noop,

    Started {
        api_base: String,
        page_size: u32,
    },
    SessionRestored {
        jwt: String,
        user_id: String,
    },
    SessionCleared,
    NetworkStatusChanged {
        online: bool,
    },
    RoleSwitched {
        role: Role,
    },

    FeedViewed {
        feed: Feed,
    },
    FeedEndReached {
        feed: Feed,
    },
    FeedRefreshRequested {
        feed: Feed,
    },
    FeedPageFetched {
        feed: Feed,
        ticket: FetchTicket,
        result: Box<HttpResult>,
    },

    PostingSelected {
        posting_id: String,
    },
    ApplicationFilterChanged {
        filter: Option<ApplicationStatus>,
    },

    MyPostingsRequested,
    MyPostingsFetched(Box<HttpResult>),
    PostingSubmitted(Box<PostingDraft>),
    PostingCreateResponse(Box<HttpResult>),

    DecisionRequested {
        application_id: String,
        decision: Decision,
    },
    DecisionResponse {
        application_id: String,
        result: Box<HttpResult>,
    },

    NotificationOpened {
        notification_id: String,
    },
    NotificationReadResponse {
        notification_id: String,
        result: Box<HttpResult>,
    },

    ReviewSubmitted {
        request_id: String,
        score: u8,
        comment: String,
    },
    ReviewResponse {
        request_id: String,
        result: Box<HttpResult>,
    },

    DismissError,
    DismissToast,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Started { .. } => "started",
            Self::SessionRestored { .. } => "session_restored",
            Self::SessionCleared => "session_cleared",
            Self::NetworkStatusChanged { .. } => "network_status_changed",
            Self::RoleSwitched { .. } => "role_switched",
            Self::FeedViewed { .. } => "feed_viewed",
            Self::FeedEndReached { .. } => "feed_end_reached",
            Self::FeedRefreshRequested { .. } => "feed_refresh_requested",
            Self::FeedPageFetched { .. } => "feed_page_fetched",
            Self::PostingSelected { .. } => "posting_selected",
            Self::ApplicationFilterChanged { .. } => "application_filter_changed",
            Self::MyPostingsRequested => "my_postings_requested",
            Self::MyPostingsFetched(_) => "my_postings_fetched",
            Self::PostingSubmitted(_) => "posting_submitted",
            Self::PostingCreateResponse(_) => "posting_create_response",
            Self::DecisionRequested { .. } => "decision_requested",
            Self::DecisionResponse { .. } => "decision_response",
            Self::NotificationOpened { .. } => "notification_opened",
            Self::NotificationReadResponse { .. } => "notification_read_response",
            Self::ReviewSubmitted { .. } => "review_submitted",
            Self::ReviewResponse { .. } => "review_response",
            Self::DismissError => "dismiss_error",
            Self::DismissToast => "dismiss_toast",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RoleSwitched { .. }
                | Self::FeedViewed { .. }
                | Self::FeedEndReached { .. }
                | Self::FeedRefreshRequested { .. }
                | Self::PostingSelected { .. }
                | Self::ApplicationFilterChanged { .. }
                | Self::MyPostingsRequested
                | Self::PostingSubmitted(_)
                | Self::DecisionRequested { .. }
                | Self::NotificationOpened { .. }
                | Self::ReviewSubmitted { .. }
                | Self::DismissError
                | Self::DismissToast
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FeedPane<R> {
    pub rows: Vec<R>,
    pub is_loading: bool,
    pub has_more: bool,
    pub show_empty_state: bool,
    pub total_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApplicationRow {
    pub id: String,
    pub posting_title: String,
    pub business_name: String,
    pub wage_text: String,
    pub status: ApplicationStatus,
    pub status_label: String,
    pub applied_text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApplicantRow {
    pub id: String,
    pub name: String,
    pub status: ApplicationStatus,
    pub status_label: String,
    pub applied_text: String,
    pub introduction_preview: Option<String>,
    pub career_text: Option<String>,
    pub is_deciding: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NotificationRow {
    pub id: String,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub time_text: String,
    pub link: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReputationRow {
    pub id: String,
    pub counterpart_name: String,
    pub posting_title: String,
    pub status: ReputationStatus,
    pub status_label: String,
    pub requested_text: String,
    pub can_review: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PostingRow {
    pub id: String,
    pub title: String,
    pub wage_text: String,
    pub status: PostingStatus,
    pub status_label: String,
    pub applicant_count: u32,
    pub created_text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub is_authenticated: bool,
    pub user_id: Option<String>,
    pub role: Role,
    pub online: bool,
    pub applications: FeedPane<ApplicationRow>,
    pub applicants: FeedPane<ApplicantRow>,
    pub selected_posting_id: Option<String>,
    pub notifications: FeedPane<NotificationRow>,
    pub unread_notifications: usize,
    pub reputation: FeedPane<ReputationRow>,
    pub my_postings: Vec<PostingRow>,
    pub my_postings_loading: bool,
    pub posting_in_flight: bool,
    pub error: Option<UserFacingError>,
    pub toast: Option<ToastView>,
}

pub mod app {
    use super::*;
    use crate::capabilities::RequestBuilder;
    use serde::de::DeserializeOwned;
    use tracing::{debug, warn};
    use url::{form_urlencoded, Url};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn with_auth<'a>(
            builder: RequestBuilder<'a, Event>,
            model: &Model,
        ) -> RequestBuilder<'a, Event> {
            match &model.session {
                Some(session) => builder.header("Authorization", session.bearer()),
                None => builder,
            }
        }

        /// Offline and signed-out states block every mutation up front.
        fn mutation_allowed(model: &mut Model) -> bool {
            if !model.network_online {
                model.show_toast("No internet connection", ToastKind::Warning);
                return false;
            }
            if model.session.is_none() {
                model.set_error(AppError::new(
                    ErrorKind::Authentication,
                    "Sign in to continue",
                ));
                return false;
            }
            true
        }

        fn error_from_response(response: &HttpResponse) -> AppError {
            let mut error = AppError::from_http_status(response.status(), Some(response.body()));
            if let Some(retry) = response
                .header("Retry-After")
                .and_then(|v| v.trim().parse::<u64>().ok())
            {
                error = error.with_retry_after(retry.saturating_mul(1000));
            }
            error
        }

        fn decode_page<T: DeserializeOwned>(result: &HttpResult) -> AppResult<Page<T>> {
            match result {
                Ok(response) if response.is_success() => {
                    response.json::<Page<T>>().map_err(AppError::from)
                }
                Ok(response) => Err(Self::error_from_response(response)),
                Err(error) => Err(AppError::from(error.clone())),
            }
        }

        fn decode_data<T: DeserializeOwned>(result: &HttpResult) -> AppResult<Vec<T>> {
            match result {
                Ok(response) if response.is_success() => response
                    .json::<DataEnvelope<T>>()
                    .map(|envelope| envelope.data)
                    .map_err(AppError::from),
                Ok(response) => Err(Self::error_from_response(response)),
                Err(error) => Err(AppError::from(error.clone())),
            }
        }

        fn check_mutation(result: &HttpResult) -> AppResult<()> {
            match result {
                Ok(response) if response.is_success() => Ok(()),
                Ok(response) => Err(Self::error_from_response(response)),
                Err(error) => Err(AppError::from(error.clone())),
            }
        }

        /// Relative URL for a feed page, without the cursor. `None` when the
        /// feed has no valid target (applicants without a selected posting).
        fn feed_path(model: &Model, feed: Feed) -> Option<String> {
            let size = model.api.page_size;
            match feed {
                Feed::Applications => {
                    let mut path = format!("/api/v1/applications?size={size}");
                    if let Some(status) = model.application_filter {
                        path.push_str("&status=");
                        path.push_str(status.as_str());
                    }
                    Some(path)
                }
                Feed::Applicants => model
                    .selected_posting_id
                    .as_ref()
                    .map(|id| format!("/api/v1/postings/{id}/applicants?size={size}")),
                Feed::Notifications => Some(format!("/api/v1/notifications?size={size}")),
                Feed::Reputation => Some(format!(
                    "/api/v1/reputation/requests?role={}&size={size}",
                    model.role.as_str()
                )),
            }
        }

        fn send_feed_page(feed: Feed, ticket: FetchTicket, model: &mut Model, caps: &Capabilities) {
            let Some(mut path) = Self::feed_path(model, feed) else {
                warn!(feed = feed.name(), "no fetch target for feed, settling empty");
                Self::settle_feed_failure(feed, &ticket, model);
                return;
            };
            if let Some(cursor) = ticket.cursor() {
                let encoded: String = form_urlencoded::byte_serialize(cursor.as_bytes()).collect();
                path.push_str("&cursor=");
                path.push_str(&encoded);
            }
            let url = model.api.endpoint(&path);
            Self::with_auth(caps.http.get(url), model)
                .timeout(FEED_TIMEOUT)
                .send(move |result| Event::FeedPageFetched {
                    feed,
                    ticket,
                    result: Box::new(result),
                });
        }

        /// A fetch the engine began but that cannot be issued must still
        /// complete, or the engine stays loading forever.
        fn settle_feed_failure(feed: Feed, ticket: &FetchTicket, model: &mut Model) {
            let error = AppError::new(ErrorKind::InvalidState, "Feed has no fetch target");
            match feed {
                Feed::Applications => model.applications.apply(ticket, Err(error)),
                Feed::Applicants => model.applicants.apply(ticket, Err(error)),
                Feed::Notifications => model.notifications.apply(ticket, Err(error)),
                Feed::Reputation => model.reputation.apply(ticket, Err(error)),
            };
        }

        fn handle_feed_page(
            feed: Feed,
            ticket: &FetchTicket,
            result: &HttpResult,
            model: &mut Model,
        ) {
            let applied = match feed {
                Feed::Applications => {
                    let outcome = Self::decode_page::<Application>(result);
                    Self::log_feed_outcome(feed, &outcome);
                    model.applications.apply(ticket, outcome)
                }
                Feed::Applicants => {
                    let outcome = Self::decode_page::<Applicant>(result);
                    Self::log_feed_outcome(feed, &outcome);
                    model.applicants.apply(ticket, outcome)
                }
                Feed::Notifications => {
                    let outcome = Self::decode_page::<NotificationItem>(result);
                    Self::log_feed_outcome(feed, &outcome);
                    model.notifications.apply(ticket, outcome)
                }
                Feed::Reputation => {
                    let outcome = Self::decode_page::<ReputationRequest>(result);
                    Self::log_feed_outcome(feed, &outcome);
                    model.reputation.apply(ticket, outcome)
                }
            };
            if applied == Applied::Stale {
                debug!(feed = feed.name(), "discarded stale feed page");
            }
        }

        fn log_feed_outcome<T>(feed: Feed, outcome: &AppResult<Page<T>>) {
            if let Err(error) = outcome {
                warn!(feed = feed.name(), %error, "feed fetch degraded");
            }
        }

        fn send_my_postings(model: &mut Model, caps: &Capabilities) {
            model.my_postings_loading = true;
            let url = model.api.endpoint("/api/v1/postings/mine");
            Self::with_auth(caps.http.get(url), model)
                .timeout(FEED_TIMEOUT)
                .send(|result| Event::MyPostingsFetched(Box::new(result)));
        }

        fn feed_pane<T, R>(pager: &Paginator<T>, to_row: impl Fn(&T) -> R) -> FeedPane<R> {
            FeedPane {
                rows: pager.items().iter().map(to_row).collect(),
                is_loading: pager.is_loading(),
                has_more: pager.has_more(),
                show_empty_state: pager.show_empty_state(),
                total_count: pager.total_count(),
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            model.update_timestamp();

            if event.is_user_initiated() {
                debug!(event = event.name(), "user action");
            } else {
                debug!(event = event.name(), "event");
            }

            match event {
                Event::Noop => {}

                Event::Started {
                    api_base,
                    page_size,
                } => {
                    match Url::parse(&api_base) {
                        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                            model.api.api_base = api_base.trim_end_matches('/').to_owned();
                        }
                        _ => {
                            warn!(api_base, "rejected API base override, keeping default");
                            model.set_error(AppError::new(
                                ErrorKind::Validation,
                                format!("Invalid API base URL: {api_base}"),
                            ));
                        }
                    }
                    model.api.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
                    caps.render.render();
                }

                Event::SessionRestored { jwt, user_id } => {
                    model.session = Some(Session::new(UserId::new(user_id), jwt));
                    model.clear_error();
                    caps.render.render();
                }

                Event::SessionCleared => {
                    model.clear_user_state();
                    caps.render.render();
                }

                Event::NetworkStatusChanged { online } => {
                    model.network_online = online;
                    let mut tickets: Vec<(Feed, FetchTicket)> = Vec::new();
                    if let Some(t) = model.applications.set_enabled(online) {
                        tickets.push((Feed::Applications, t));
                    }
                    if let Some(t) = model.notifications.set_enabled(online) {
                        tickets.push((Feed::Notifications, t));
                    }
                    if let Some(t) = model.reputation.set_enabled(online) {
                        tickets.push((Feed::Reputation, t));
                    }
                    // Applicants never auto-starts, so this returns no ticket.
                    model.applicants.set_enabled(online);
                    if online
                        && model.selected_posting_id.is_some()
                        && !model.applicants.is_started()
                    {
                        if let Some(t) = model.applicants.load_initial() {
                            tickets.push((Feed::Applicants, t));
                        }
                    }
                    for (feed, ticket) in tickets {
                        Self::send_feed_page(feed, ticket, model, caps);
                    }
                    if !online {
                        model.show_toast("You are offline", ToastKind::Warning);
                    }
                    caps.render.render();
                }

                Event::RoleSwitched { role } => {
                    if model.role != role {
                        model.role = role;
                        if let Some(ticket) = model.reputation.sync_deps(&[role.as_str()]) {
                            Self::send_feed_page(Feed::Reputation, ticket, model, caps);
                        }
                    }
                    caps.render.render();
                }

                Event::FeedViewed { feed } => {
                    let ticket = match feed {
                        Feed::Applications => model.applications.activate(),
                        Feed::Applicants => {
                            if model.selected_posting_id.is_some()
                                && !model.applicants.is_started()
                            {
                                model.applicants.load_initial()
                            } else {
                                None
                            }
                        }
                        Feed::Notifications => model.notifications.activate(),
                        Feed::Reputation => model.reputation.activate(),
                    };
                    if let Some(ticket) = ticket {
                        Self::send_feed_page(feed, ticket, model, caps);
                    }
                    caps.render.render();
                }

                Event::FeedEndReached { feed } => {
                    let ticket = match feed {
                        Feed::Applications => model.applications.load_more(),
                        Feed::Applicants => model.applicants.load_more(),
                        Feed::Notifications => model.notifications.load_more(),
                        Feed::Reputation => model.reputation.load_more(),
                    };
                    if let Some(ticket) = ticket {
                        Self::send_feed_page(feed, ticket, model, caps);
                    }
                    caps.render.render();
                }

                Event::FeedRefreshRequested { feed } => {
                    let ticket = match feed {
                        Feed::Applications => model.applications.reset(),
                        Feed::Applicants => {
                            if model.selected_posting_id.is_some() {
                                model.applicants.reset()
                            } else {
                                None
                            }
                        }
                        Feed::Notifications => model.notifications.reset(),
                        Feed::Reputation => model.reputation.reset(),
                    };
                    if let Some(ticket) = ticket {
                        Self::send_feed_page(feed, ticket, model, caps);
                    }
                    caps.render.render();
                }

                Event::FeedPageFetched {
                    feed,
                    ticket,
                    result,
                } => {
                    Self::handle_feed_page(feed, &ticket, result.as_ref(), model);
                    caps.render.render();
                }

                Event::PostingSelected { posting_id } => {
                    let posting_id = PostingId::new(posting_id);
                    model.selected_posting_id = Some(posting_id.clone());
                    let ticket = match model.applicants.sync_deps(&[posting_id.as_str()]) {
                        Some(ticket) => Some(ticket),
                        None if !model.applicants.is_started() => {
                            model.applicants.load_initial()
                        }
                        None => None,
                    };
                    if let Some(ticket) = ticket {
                        Self::send_feed_page(Feed::Applicants, ticket, model, caps);
                    }
                    caps.render.render();
                }

                Event::ApplicationFilterChanged { filter } => {
                    model.application_filter = filter;
                    let key = filter.map_or("all", ApplicationStatus::as_str);
                    if let Some(ticket) = model.applications.sync_deps(&[key]) {
                        Self::send_feed_page(Feed::Applications, ticket, model, caps);
                    }
                    caps.render.render();
                }

                Event::MyPostingsRequested => {
                    if !model.my_postings_loading && model.network_online {
                        Self::send_my_postings(model, caps);
                    }
                    caps.render.render();
                }

                Event::MyPostingsFetched(result) => {
                    model.my_postings_loading = false;
                    match Self::decode_data::<PostingSummary>(result.as_ref()) {
                        Ok(data) => model.my_postings = data,
                        Err(error) => warn!(%error, "failed to load own postings"),
                    }
                    caps.render.render();
                }

                Event::PostingSubmitted(draft) => {
                    if Self::mutation_allowed(model) {
                        match draft.validate() {
                            Ok(()) if !model.posting_in_flight => {
                                model.posting_in_flight = true;
                                let url = model.api.endpoint("/api/v1/postings");
                                Self::with_auth(caps.http.post(url), model)
                                    .json(&draft.request_body())
                                    .timeout(MUTATION_TIMEOUT)
                                    .send(|result| Event::PostingCreateResponse(Box::new(result)));
                            }
                            Ok(()) => {
                                debug!("posting submission already in flight");
                            }
                            Err(error) => {
                                model.set_error(AppError::from(error));
                            }
                        }
                    }
                    caps.render.render();
                }

                Event::PostingCreateResponse(result) => {
                    model.posting_in_flight = false;
                    match Self::check_mutation(result.as_ref()) {
                        Ok(()) => {
                            model.show_toast("Posting published", ToastKind::Success);
                            if !model.my_postings_loading && model.network_online {
                                Self::send_my_postings(model, caps);
                            }
                        }
                        Err(error) => {
                            warn!(%error, "posting creation failed");
                            model.set_error(error);
                        }
                    }
                    caps.render.render();
                }

                Event::DecisionRequested {
                    application_id,
                    decision,
                } => {
                    if Self::mutation_allowed(model) {
                        let application_id = ApplicationId::new(application_id);
                        match model.begin_decision(&application_id, decision) {
                            Ok(()) => {
                                let url = model.api.endpoint(&format!(
                                    "/api/v1/applications/{application_id}/status"
                                ));
                                let body = DecisionBody {
                                    status: decision.target_status(),
                                };
                                let id_for_event = application_id.as_str().to_owned();
                                Self::with_auth(caps.http.patch(url), model)
                                    .json(&body)
                                    .timeout(MUTATION_TIMEOUT)
                                    .send(move |result| Event::DecisionResponse {
                                        application_id: id_for_event,
                                        result: Box::new(result),
                                    });
                            }
                            Err(DecisionError::AlreadyPending(id)) => {
                                debug!(application = %id, "decision already in flight");
                            }
                            Err(error) => {
                                model.show_toast(error.to_string(), ToastKind::Warning);
                            }
                        }
                    }
                    caps.render.render();
                }

                Event::DecisionResponse {
                    application_id,
                    result,
                } => {
                    let application_id = ApplicationId::new(application_id);
                    match Self::check_mutation(result.as_ref()) {
                        Ok(()) => {
                            if let Some(pending) = model.settle_decision(&application_id) {
                                let message = match pending.decision {
                                    Decision::Accept => "Applicant accepted",
                                    Decision::Reject => "Applicant rejected",
                                };
                                model.show_toast(message, ToastKind::Success);
                            }
                        }
                        Err(error) if error.kind == ErrorKind::Conflict => {
                            model.revert_decision(&application_id);
                            model.show_toast(
                                "This application changed elsewhere. Refreshing.",
                                ToastKind::Warning,
                            );
                            if let Some(ticket) = model.applicants.reset() {
                                Self::send_feed_page(Feed::Applicants, ticket, model, caps);
                            }
                        }
                        Err(error) => {
                            model.revert_decision(&application_id);
                            warn!(application = %application_id, %error, "decision failed");
                            model.set_error(error);
                        }
                    }
                    caps.render.render();
                }

                Event::NotificationOpened { notification_id } => {
                    let notification_id = NotificationId::new(notification_id);
                    if !model.network_online {
                        debug!(notification = %notification_id, "offline, skipping mark-read");
                    } else if model.mark_notification_read(&notification_id) {
                        let url = model.api.endpoint(&format!(
                            "/api/v1/notifications/{notification_id}/read"
                        ));
                        let id_for_event = notification_id.as_str().to_owned();
                        Self::with_auth(caps.http.post(url), model)
                            .timeout(MUTATION_TIMEOUT)
                            .send(move |result| Event::NotificationReadResponse {
                                notification_id: id_for_event,
                                result: Box::new(result),
                            });
                    }
                    caps.render.render();
                }

                Event::NotificationReadResponse {
                    notification_id,
                    result,
                } => {
                    if let Err(error) = Self::check_mutation(result.as_ref()) {
                        let notification_id = NotificationId::new(notification_id);
                        warn!(notification = %notification_id, %error, "mark-read failed, reverting");
                        model.revert_notification_read(&notification_id);
                    }
                    caps.render.render();
                }

                Event::ReviewSubmitted {
                    request_id,
                    score,
                    comment,
                } => {
                    if Self::mutation_allowed(model) {
                        let request_id = RequestId::new(request_id);
                        match ReviewDraft::new(score, comment) {
                            Err(error) => model.set_error(AppError::from(error)),
                            Ok(draft) => {
                                if model.pending_reviews.contains(&request_id) {
                                    debug!(request = %request_id, "review already in flight");
                                } else {
                                    let reviewable = model.reputation.items().iter().any(|r| {
                                        r.id == request_id
                                            && r.status == ReputationStatus::Pending
                                    });
                                    if reviewable {
                                        model.pending_reviews.insert(request_id.clone());
                                        let url = model.api.endpoint(&format!(
                                            "/api/v1/reputation/requests/{request_id}/review"
                                        ));
                                        let id_for_event = request_id.as_str().to_owned();
                                        Self::with_auth(caps.http.post(url), model)
                                            .json(&draft.request_body())
                                            .timeout(MUTATION_TIMEOUT)
                                            .send(move |result| Event::ReviewResponse {
                                                request_id: id_for_event,
                                                result: Box::new(result),
                                            });
                                    } else {
                                        model.show_toast(
                                            "This request can no longer be reviewed",
                                            ToastKind::Warning,
                                        );
                                    }
                                }
                            }
                        }
                    }
                    caps.render.render();
                }

                Event::ReviewResponse { request_id, result } => {
                    let request_id = RequestId::new(request_id);
                    model.pending_reviews.remove(&request_id);
                    match Self::check_mutation(result.as_ref()) {
                        Ok(()) => {
                            if let Some(request) = model
                                .reputation
                                .items_mut()
                                .iter_mut()
                                .find(|r| r.id == request_id)
                            {
                                request.status = ReputationStatus::Completed;
                            }
                            model.show_toast("Review submitted", ToastKind::Success);
                        }
                        Err(error) => {
                            warn!(request = %request_id, %error, "review submission failed");
                            model.set_error(error);
                        }
                    }
                    caps.render.render();
                }

                Event::DismissError => {
                    model.clear_error();
                    caps.render.render();
                }

                Event::DismissToast => {
                    model.clear_toast();
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let now_ms = model.view_timestamp_ms;

            let applications = Self::feed_pane(&model.applications, |a| ApplicationRow {
                id: a.id.as_str().to_owned(),
                posting_title: a.posting_title.clone(),
                business_name: a.business_name.clone(),
                wage_text: format_wage(a.hourly_wage),
                status: a.status,
                status_label: a.status.label().to_owned(),
                applied_text: format_relative_time(a.applied_at_ms, now_ms),
            });

            let applicants = Self::feed_pane(&model.applicants, |a| ApplicantRow {
                id: a.id.as_str().to_owned(),
                name: a.name.clone(),
                status: a.status,
                status_label: a.status.label().to_owned(),
                applied_text: format_relative_time(a.applied_at_ms, now_ms),
                introduction_preview: a
                    .introduction
                    .as_deref()
                    .map(|text| preview_text(text, DESCRIPTION_PREVIEW_LENGTH)),
                career_text: a.career_months.map(format_career_months),
                is_deciding: model.pending_decisions.contains_key(&a.id),
            });

            let notifications = Self::feed_pane(&model.notifications, |n| NotificationRow {
                id: n.id.as_str().to_owned(),
                title: n.title.clone(),
                body: n.body.clone(),
                read: n.read,
                time_text: format_relative_time(n.created_at_ms, now_ms),
                link: n.link.clone(),
            });

            let reputation = Self::feed_pane(&model.reputation, |r| ReputationRow {
                id: r.id.as_str().to_owned(),
                counterpart_name: r.counterpart_name.clone(),
                posting_title: r.posting_title.clone(),
                status: r.status,
                status_label: r.status.label().to_owned(),
                requested_text: format_relative_time(r.requested_at_ms, now_ms),
                can_review: r.status == ReputationStatus::Pending
                    && !model.pending_reviews.contains(&r.id),
            });

            let my_postings = model
                .my_postings
                .iter()
                .map(|p| PostingRow {
                    id: p.id.as_str().to_owned(),
                    title: p.title.clone(),
                    wage_text: format_wage(p.hourly_wage),
                    status: p.status,
                    status_label: p.status.label().to_owned(),
                    applicant_count: p.applicant_count,
                    created_text: format_relative_time(p.created_at_ms, now_ms),
                })
                .collect();

            ViewModel {
                is_authenticated: model.is_authenticated(),
                user_id: model
                    .session
                    .as_ref()
                    .map(|s| s.user_id.as_str().to_owned()),
                role: model.role,
                online: model.network_online,
                applications,
                applicants,
                selected_posting_id: model
                    .selected_posting_id
                    .as_ref()
                    .map(|id| id.as_str().to_owned()),
                notifications,
                unread_notifications: model.unread_notifications(),
                reputation,
                my_postings,
                my_postings_loading: model.my_postings_loading,
                posting_in_flight: model.posting_in_flight,
                error: model.active_error.as_ref().map(UserFacingError::from),
                toast: model.active_toast.as_ref().map(ToastView::from),
            }
        }
    }
}
