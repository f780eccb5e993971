//! Integrity violation records.
//!
//! A [`Violation`] is an immutable record of one integrity breach observed
//! during an exam session. The set of kinds is closed: every producer maps its
//! observation onto a [`ViolationKind`], and the escalation policy classifies
//! kinds, never free-form strings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a violation message. Longer messages are truncated on
/// construction so a misbehaving producer cannot grow the ledger unboundedly.
pub const MAX_MESSAGE_LENGTH: usize = 256;

// =============================================================================
// ViolationKind
// =============================================================================

/// The kind of integrity breach a violation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ViolationKind {
    /// No face was visible in the camera frame.
    #[serde(rename = "Face Missing")]
    FaceMissing,
    /// More than one face was visible in the camera frame.
    #[serde(rename = "Multiple Faces")]
    MultipleFaces,
    /// The candidate left fullscreen mode.
    #[serde(rename = "Full-Screen Exit Attempt")]
    FullscreenExit,
}

impl ViolationKind {
    /// Returns the display label for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FaceMissing => "Face Missing",
            Self::MultipleFaces => "Multiple Faces",
            Self::FullscreenExit => "Full-Screen Exit Attempt",
        }
    }

    /// Returns all known violation kinds.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::FaceMissing, Self::MultipleFaces, Self::FullscreenExit]
    }

    /// Maps a detected face count onto a violation, if the count is one.
    ///
    /// Exactly one face is the only compliant observation.
    #[must_use]
    pub fn for_face_count(count: usize) -> Option<(Self, String)> {
        match count {
            0 => Some((Self::FaceMissing, "No face detected".to_string())),
            1 => None,
            n => Some((Self::MultipleFaces, format!("{n} faces detected"))),
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Violation
// =============================================================================

/// An immutable integrity violation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Violation {
    #[serde(rename = "type")]
    kind: ViolationKind,
    message: String,
    timestamp: DateTime<Utc>,
}

impl Violation {
    /// Creates a violation record.
    #[must_use]
    pub fn new(kind: ViolationKind, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let mut message = message.into();
        if message.len() > MAX_MESSAGE_LENGTH {
            let mut cut = MAX_MESSAGE_LENGTH;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        Self {
            kind,
            message,
            timestamp,
        }
    }

    /// Returns the violation kind.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the time the violation was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.kind,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 5).unwrap()
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ViolationKind::FaceMissing.to_string(), "Face Missing");
        assert_eq!(ViolationKind::MultipleFaces.to_string(), "Multiple Faces");
        assert_eq!(
            ViolationKind::FullscreenExit.to_string(),
            "Full-Screen Exit Attempt"
        );
    }

    #[test]
    fn test_face_count_mapping() {
        let (kind, message) = ViolationKind::for_face_count(0).unwrap();
        assert_eq!(kind, ViolationKind::FaceMissing);
        assert_eq!(message, "No face detected");

        assert!(ViolationKind::for_face_count(1).is_none());

        let (kind, message) = ViolationKind::for_face_count(3).unwrap();
        assert_eq!(kind, ViolationKind::MultipleFaces);
        assert!(message.contains('3'));
    }

    #[test]
    fn test_message_truncated_on_char_boundary() {
        let long = "é".repeat(MAX_MESSAGE_LENGTH);
        let v = Violation::new(ViolationKind::FaceMissing, long, ts());
        assert!(v.message().len() <= MAX_MESSAGE_LENGTH);
        assert!(v.message().chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_serializes_kind_as_type_label() {
        let v = Violation::new(ViolationKind::FullscreenExit, "Exited full-screen mode", ts());
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "Full-Screen Exit Attempt");
        assert_eq!(json["message"], "Exited full-screen mode");
        assert!(json["timestamp"].as_str().unwrap().starts_with("2026-03-01T09:30:05"));
    }

    #[test]
    fn test_display() {
        let v = Violation::new(ViolationKind::FaceMissing, "No face detected", ts());
        assert_eq!(v.to_string(), "[09:30:05] Face Missing: No face detected");
    }
}
