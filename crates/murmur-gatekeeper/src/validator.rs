//! Payload validation logic

use crate::{GatekeeperError, ValidationConfig};
use murmur_domain::traits::UserStore;
use murmur_domain::{CommentDraft, CommentUpdate, PostDraft, PostUpdate, ProfileUpdate, Registration};
use std::fmt;

/// Result of payload validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the payload passed validation
    pub status: ValidationStatus,

    /// Rejection reasons (if any)
    pub reasons: Vec<RejectionReason>,
}

impl ValidationResult {
    fn from_reasons(reasons: Vec<RejectionReason>) -> Self {
        let status = if reasons.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Rejected
        };
        Self { status, reasons }
    }

    /// True when no rule was violated
    pub fn is_accepted(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Payload accepted
    Accepted,

    /// Payload rejected
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// A required field is empty
    Required {
        /// Field name
        field: &'static str,
    },

    /// A field is shorter than allowed
    TooShort {
        /// Field name
        field: &'static str,
        /// Minimum length
        min: usize,
        /// Actual length
        actual: usize,
    },

    /// A field is longer than allowed
    TooLong {
        /// Field name
        field: &'static str,
        /// Maximum length
        max: usize,
        /// Actual length
        actual: usize,
    },

    /// A field does not have the expected shape
    InvalidFormat {
        /// Field name
        field: &'static str,
        /// Description of the issue
        issue: String,
    },

    /// The username is already registered
    UsernameTaken(String),

    /// A partial update names no field
    EmptyUpdate,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::Required { field } => write!(f, "{} is required", field),
            RejectionReason::TooShort { field, min, actual } => write!(
                f,
                "{} must be at least {} characters (got {})",
                field, min, actual
            ),
            RejectionReason::TooLong { field, max, actual } => write!(
                f,
                "{} must be at most {} characters (got {})",
                field, max, actual
            ),
            RejectionReason::InvalidFormat { field, issue } => write!(f, "{}: {}", field, issue),
            RejectionReason::UsernameTaken(name) => {
                write!(f, "A user with username '{}' already exists", name)
            }
            RejectionReason::EmptyUpdate => write!(f, "No fields to update"),
        }
    }
}

/// The Gatekeeper validates payloads before they reach the store
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Validate a registration
    ///
    /// # Arguments
    ///
    /// * `registration` - The registration to validate
    /// * `store` - User store for the username availability check (optional)
    pub fn validate_registration<S: UserStore>(
        &self,
        registration: &Registration,
        store: Option<&S>,
    ) -> Result<ValidationResult, GatekeeperError> {
        let mut reasons = Vec::new();

        self.check_username(&registration.username, &mut reasons);
        self.check_email(&registration.email, &mut reasons);
        check_length(
            "password",
            &registration.password,
            self.config.min_password_len,
            usize::MAX,
            &mut reasons,
        );
        check_max("bio", &registration.bio, self.config.max_bio_len, &mut reasons);

        // Only worth a lookup when the name itself is acceptable
        if reasons.is_empty() {
            if let Some(store) = store {
                let existing = store
                    .find_by_username(&registration.username)
                    .map_err(|e| GatekeeperError::Store(format!("Failed to look up user: {}", e)))?;
                if existing.is_some() {
                    reasons.push(RejectionReason::UsernameTaken(registration.username.clone()));
                }
            }
        }

        Ok(ValidationResult::from_reasons(reasons))
    }

    /// Validate a partial profile update
    pub fn validate_profile_update(&self, update: &ProfileUpdate) -> ValidationResult {
        let mut reasons = Vec::new();

        if update.is_empty() {
            reasons.push(RejectionReason::EmptyUpdate);
        }
        if let Some(email) = &update.email {
            self.check_email(email, &mut reasons);
        }
        if let Some(bio) = &update.bio {
            check_max("bio", bio, self.config.max_bio_len, &mut reasons);
        }

        ValidationResult::from_reasons(reasons)
    }

    /// Validate a new post
    pub fn validate_post(&self, draft: &PostDraft) -> ValidationResult {
        let mut reasons = Vec::new();
        check_length("title", &draft.title, 1, self.config.max_title_len, &mut reasons);
        check_length("content", &draft.content, 1, self.config.max_content_len, &mut reasons);
        ValidationResult::from_reasons(reasons)
    }

    /// Validate a partial post update
    pub fn validate_post_update(&self, update: &PostUpdate) -> ValidationResult {
        let mut reasons = Vec::new();

        if update.title.is_none() && update.content.is_none() {
            reasons.push(RejectionReason::EmptyUpdate);
        }
        if let Some(title) = &update.title {
            check_length("title", title, 1, self.config.max_title_len, &mut reasons);
        }
        if let Some(content) = &update.content {
            check_length("content", content, 1, self.config.max_content_len, &mut reasons);
        }

        ValidationResult::from_reasons(reasons)
    }

    /// Validate a new comment
    pub fn validate_comment(&self, draft: &CommentDraft) -> ValidationResult {
        let mut reasons = Vec::new();
        check_length("content", &draft.content, 1, self.config.max_comment_len, &mut reasons);
        ValidationResult::from_reasons(reasons)
    }

    /// Validate a comment edit
    pub fn validate_comment_update(&self, update: &CommentUpdate) -> ValidationResult {
        let mut reasons = Vec::new();
        match &update.content {
            None => reasons.push(RejectionReason::EmptyUpdate),
            Some(content) => {
                check_length("content", content, 1, self.config.max_comment_len, &mut reasons)
            }
        }
        ValidationResult::from_reasons(reasons)
    }

    /// Usernames: letters, digits and `@ . + - _`
    fn check_username(&self, username: &str, reasons: &mut Vec<RejectionReason>) {
        let before = reasons.len();
        check_length(
            "username",
            username,
            self.config.min_username_len,
            self.config.max_username_len,
            reasons,
        );
        if reasons.len() > before {
            return;
        }

        if let Some(bad) = username
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')))
        {
            reasons.push(RejectionReason::InvalidFormat {
                field: "username",
                issue: format!("character '{}' is not allowed", bad),
            });
        }
    }

    /// Emails: one `@`, non-empty local part, dotted domain
    fn check_email(&self, email: &str, reasons: &mut Vec<RejectionReason>) {
        let before = reasons.len();
        check_length("email", email, 1, self.config.max_email_len, reasons);
        if reasons.len() > before {
            return;
        }

        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };
        if !valid {
            reasons.push(RejectionReason::InvalidFormat {
                field: "email",
                issue: format!("'{}' is not a valid email address", email),
            });
        }
    }
}

/// Check `min <= chars <= max`, treating whitespace-only as empty
fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
    reasons: &mut Vec<RejectionReason>,
) {
    if value.trim().is_empty() {
        reasons.push(RejectionReason::Required { field });
        return;
    }

    let actual = value.chars().count();
    if actual < min {
        reasons.push(RejectionReason::TooShort { field, min, actual });
    } else if actual > max {
        reasons.push(RejectionReason::TooLong { field, max, actual });
    }
}

/// Check an optional text field against its maximum only
fn check_max(field: &'static str, value: &str, max: usize, reasons: &mut Vec<RejectionReason>) {
    let actual = value.chars().count();
    if actual > max {
        reasons.push(RejectionReason::TooLong { field, max, actual });
    }
}
