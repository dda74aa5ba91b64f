use crate::models::BookingStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do when a new booking overlaps an existing one
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Accept it; the provider reconciles conflicts by hand
    #[default]
    Allow,
    /// Refuse it atomically at the store
    Reject,
}

/// Which status changes a provider may make
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionPolicy {
    /// Any booking may be set to confirmed or cancelled, including repeats
    /// and cancelling after confirmation
    #[default]
    Permissive,
    /// Only pending bookings may be confirmed or cancelled
    PendingOnly,
}

impl TransitionPolicy {
    pub fn permits(self, from: BookingStatus, to: BookingStatus) -> bool {
        if to == BookingStatus::Pending {
            return false;
        }
        match self {
            Self::Permissive => true,
            Self::PendingOnly => from == BookingStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingPolicy {
    pub overlap: OverlapPolicy,
    pub transitions: TransitionPolicy,
}

impl BookingPolicy {
    /// Rejects overlaps and only decides pending bookings
    pub fn strict() -> Self {
        Self {
            overlap: OverlapPolicy::Reject,
            transitions: TransitionPolicy::PendingOnly,
        }
    }
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            other => Err(format!("expected allow or reject, got {other:?}")),
        }
    }
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Reject => "reject",
        })
    }
}

impl FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "permissive" => Ok(Self::Permissive),
            "pending-only" => Ok(Self::PendingOnly),
            other => Err(format!("expected permissive or pending-only, got {other:?}")),
        }
    }
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Permissive => "permissive",
            Self::PendingOnly => "pending-only",
        })
    }
}
