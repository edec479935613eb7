//! Duplicate-request policy for the edge toggles

/// How follow/like react to a pair that is already linked, and unfollow/unlike
/// to a pair that is not
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DuplicatePolicy {
    /// Report the condition as an error (already exists / not found)
    #[default]
    Reject,

    /// Treat the request as a successful no-op
    Ignore,
}

impl DuplicatePolicy {
    /// Get the policy name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::Reject => "reject",
            DuplicatePolicy::Ignore => "ignore",
        }
    }

    /// Parse a policy from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Some(DuplicatePolicy::Reject),
            "ignore" => Some(DuplicatePolicy::Ignore),
            _ => None,
        }
    }
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid duplicate policy: {}", s))
    }
}
