//! Keyword moderation
//!
//! Lower-cases the message and looks for any forbidden keyword as a
//! substring. Substring matching flags words like "spammer" or "hateful"
//! as well; no word-boundary handling is done.

use crate::types::ModerationStatus;

/// Keywords that flag a message
pub const FORBIDDEN_KEYWORDS: [&str; 5] = ["violence", "hate", "harassment", "explicit", "spam"];

/// Action recorded in the moderation log for flagged content
pub const FLAG_ACTION: &str = "flag";

/// Reason recorded in the moderation log for flagged content
pub const FLAG_REASON: &str = "Automated content filter triggered";

/// Classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// `Flagged` or `Approved`; never `Pending`
    pub status: ModerationStatus,
    /// First keyword that matched
    pub matched: Option<&'static str>,
}

impl Verdict {
    /// Whether the message was flagged
    #[inline]
    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.matched.is_some()
    }
}

/// Classify a message against [`FORBIDDEN_KEYWORDS`]
#[must_use]
pub fn classify(message: &str) -> Verdict {
    let lower = message.to_lowercase();
    let matched = FORBIDDEN_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| lower.contains(keyword));

    Verdict {
        status: if matched.is_some() {
            ModerationStatus::Flagged
        } else {
            ModerationStatus::Approved
        },
        matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn spam_is_flagged() {
        let verdict = classify("this is spam content");
        assert_eq!(verdict.status, ModerationStatus::Flagged);
        assert!(verdict.is_flagged());
        assert_eq!(verdict.matched, Some("spam"));
    }

    #[test]
    fn clean_message_is_approved() {
        let verdict = classify("hello world");
        assert_eq!(verdict.status, ModerationStatus::Approved);
        assert!(!verdict.is_flagged());
    }

    #[test]
    fn matching_ignores_case() {
        assert!(classify("No more VIOLENCE").is_flagged());
    }

    #[test]
    fn substrings_are_flagged() {
        // "whatever" contains "hate"
        assert!(classify("whatever works").is_flagged());
    }

    proptest! {
        #[test]
        fn prop_keyword_anywhere_flags(
            prefix in "[a-z ]{0,20}",
            suffix in "[a-z ]{0,20}",
            idx in 0usize..FORBIDDEN_KEYWORDS.len(),
        ) {
            let message = format!("{prefix}{}{suffix}", FORBIDDEN_KEYWORDS[idx].to_uppercase());
            prop_assert!(classify(&message).is_flagged());
        }

        #[test]
        fn prop_digits_never_flag(message in "[0-9 ]{0,64}") {
            prop_assert_eq!(classify(&message).status, ModerationStatus::Approved);
        }
    }
}
