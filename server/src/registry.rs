//! Status-code registries — immutable reference data, fixed at compile time.
//!
//! Publish/review status codes, publish environments, member roles, and the
//! publish/product type tables. Rows in the database store the raw codes;
//! everything here is lookup only. The deployment executor may write publish
//! status codes this module does not know about — callers must treat unknown
//! codes as "other", never as an error.

/// A code → label registry row.
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub code: &'static str,
    pub label: &'static str,
}

// ── Publish status ──

/// Daily publish accepted and queued for execution.
pub const STATUS_DAILY_QUEUED: &str = "4001";
/// Online publish blocked until its code review passes.
pub const STATUS_PENDING_REVIEW: &str = "4003";
/// Daily publish accepted (direct path).
pub const STATUS_DAILY_ACCEPTED: &str = "4004";

pub const PUBLISH_STATUSES: &[RegistryEntry] = &[
    RegistryEntry { code: STATUS_DAILY_QUEUED, label: "queued" },
    RegistryEntry { code: STATUS_PENDING_REVIEW, label: "pending review" },
    RegistryEntry { code: STATUS_DAILY_ACCEPTED, label: "accepted" },
];

pub fn publish_status_label(code: &str) -> Option<&'static str> {
    PUBLISH_STATUSES
        .iter()
        .find(|e| e.code == code)
        .map(|e| e.label)
}

// ── Review status ──

pub const REVIEW_APPROVED: &str = "7001";
pub const REVIEW_REJECTED: &str = "7002";

/// Three-way review gate verdict. Any code other than approved/rejected is
/// still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approved,
    Rejected,
    Pending,
}

pub fn review_verdict(code: &str) -> ReviewVerdict {
    match code {
        REVIEW_APPROVED => ReviewVerdict::Approved,
        REVIEW_REJECTED => ReviewVerdict::Rejected,
        _ => ReviewVerdict::Pending,
    }
}

// ── Publish environment ──

/// Target environment for a publish. Two variants only — `online` is the one
/// that requires review; everything else rides the daily path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishEnv {
    Daily,
    Online,
}

impl PublishEnv {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "daily" => Some(Self::Daily),
            "online" => Some(Self::Online),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Online => "online",
        }
    }

    /// Status a freshly admitted publish starts in.
    pub fn initial_status(self) -> &'static str {
        match self {
            Self::Daily => STATUS_DAILY_ACCEPTED,
            Self::Online => STATUS_PENDING_REVIEW,
        }
    }

    pub fn requires_review(self) -> bool {
        matches!(self, Self::Online)
    }
}

// ── Member roles ──

pub const ROLE_CREATOR: &str = "5001";
pub const ROLE_DEVELOPER: &str = "5002";

pub const MEMBER_ROLES: &[RegistryEntry] = &[
    RegistryEntry { code: ROLE_CREATOR, label: "creator" },
    RegistryEntry { code: ROLE_DEVELOPER, label: "developer" },
];

pub fn member_role_label(code: &str) -> Option<&'static str> {
    MEMBER_ROLES.iter().find(|e| e.code == code).map(|e| e.label)
}

// ── Publish / product types ──

/// Publish type registry row; the logo doubles as the default application
/// logo at creation time.
#[derive(Debug, Clone, Copy)]
pub struct PublishTypeEntry {
    pub code: &'static str,
    pub label: &'static str,
    pub logo: &'static str,
}

pub const PUBLISH_TYPES: &[PublishTypeEntry] = &[
    PublishTypeEntry {
        code: "2001",
        label: "web application",
        logo: "/static/logo/web.png",
    },
    PublishTypeEntry {
        code: "2002",
        label: "static site",
        logo: "/static/logo/static.png",
    },
];

pub fn publish_type(code: &str) -> Option<&'static PublishTypeEntry> {
    PUBLISH_TYPES.iter().find(|e| e.code == code)
}

pub const PRODUCT_TYPES: &[RegistryEntry] = &[
    RegistryEntry { code: "1001", label: "internal tooling" },
    RegistryEntry { code: "1002", label: "customer facing" },
];

pub fn product_type(code: &str) -> Option<&'static RegistryEntry> {
    PRODUCT_TYPES.iter().find(|e| e.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_codes_round_trip() {
        assert_eq!(PublishEnv::from_code("daily"), Some(PublishEnv::Daily));
        assert_eq!(PublishEnv::from_code("online"), Some(PublishEnv::Online));
        assert_eq!(PublishEnv::from_code("staging"), None);
        assert_eq!(PublishEnv::Daily.code(), "daily");
        assert_eq!(PublishEnv::Online.code(), "online");
    }

    #[test]
    fn initial_status_depends_on_environment() {
        assert_eq!(PublishEnv::Daily.initial_status(), STATUS_DAILY_ACCEPTED);
        assert_eq!(PublishEnv::Online.initial_status(), STATUS_PENDING_REVIEW);
        assert!(PublishEnv::Online.requires_review());
        assert!(!PublishEnv::Daily.requires_review());
    }

    #[test]
    fn review_verdict_defaults_to_pending() {
        assert_eq!(review_verdict("7001"), ReviewVerdict::Approved);
        assert_eq!(review_verdict("7002"), ReviewVerdict::Rejected);
        assert_eq!(review_verdict("7003"), ReviewVerdict::Pending);
        assert_eq!(review_verdict(""), ReviewVerdict::Pending);
    }

    #[test]
    fn status_lookup_rejects_unknown_codes() {
        assert_eq!(publish_status_label("4001"), Some("queued"));
        assert_eq!(publish_status_label("9999"), None);
    }

    #[test]
    fn type_registries_resolve_known_codes() {
        assert_eq!(publish_type("2001").map(|e| e.label), Some("web application"));
        assert!(publish_type("2999").is_none());
        assert_eq!(product_type("1002").map(|e| e.label), Some("customer facing"));
        assert_eq!(member_role_label(ROLE_CREATOR), Some("creator"));
    }
}
