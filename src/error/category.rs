//! High-level error classification.

/// Category of a tracking error, used to pick a handling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing OS permission; the user can grant it or open settings.
    Permission,
    /// The session profile is missing required identifiers; only a
    /// re-login can fix it.
    Identity,
    /// A transport failed; retried on the next cycle.
    Network,
    /// The device could not produce a fix; retried on the next cycle.
    Device,
}

impl ErrorCategory {
    /// Whether the user can do something about errors in this category.
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, ErrorCategory::Permission)
    }

    /// Whether errors in this category resolve themselves on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Device)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCategory::Permission => "permission",
            ErrorCategory::Identity => "identity",
            ErrorCategory::Network => "network",
            ErrorCategory::Device => "device",
        };
        write!(f, "{}", name)
    }
}
