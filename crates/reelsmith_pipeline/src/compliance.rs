//! Platform-guideline screening for generated scripts.

use regex::Regex;
use tracing::debug;

/// Keywords that flag a script for review when they appear in a harmful
/// phrasing.
const BANNED_KEYWORDS: &[&str] = &[
    "kill", "murder", "suicide", "self-harm", "violence", "drug", "illegal", "weapon", "gun",
    "knife",
];

/// Scans script text for policy-sensitive keywords and identifying
/// information, and redacts contact details before narration.
///
/// Findings are advisory by default: they are recorded on the content unit
/// for review, and only fail the unit when compliance is configured as
/// blocking.
#[derive(Debug, Clone)]
pub struct ComplianceChecker {
    full_name: Regex,
    ssn: Regex,
    dotted_phone: Regex,
    phone: Regex,
    email: Regex,
}

impl ComplianceChecker {
    /// Build the checker, compiling the fixed pattern set.
    pub fn new() -> Self {
        // Two capitalized words in a row, the shape of a full name.
        let full_name = Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b").expect("Valid name regex");
        let ssn = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("Valid SSN regex");
        let dotted_phone = Regex::new(r"\b\d{3}\.\d{3}\.\d{4}\b").expect("Valid phone regex");
        let phone = Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("Valid phone regex");
        let email = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .expect("Valid email regex");
        Self {
            full_name,
            ssn,
            dotted_phone,
            phone,
            email,
        }
    }

    /// Scan text and return human-readable findings, empty when clean.
    pub fn check(&self, text: &str) -> Vec<String> {
        let mut findings = Vec::new();
        let lowered = text.to_lowercase();

        for keyword in BANNED_KEYWORDS {
            if lowered.contains(keyword) && Self::harmful_context(&lowered, keyword) {
                findings.push(format!("Potentially harmful content: {}", keyword));
            }
        }

        for regex in [&self.full_name, &self.ssn, &self.dotted_phone, &self.email] {
            let matches: Vec<&str> = regex.find_iter(text).map(|m| m.as_str()).take(3).collect();
            if !matches.is_empty() {
                findings.push(format!(
                    "Potential identifying information found: {:?}",
                    matches
                ));
            }
        }

        if !findings.is_empty() {
            debug!(count = findings.len(), "Compliance findings recorded");
        }
        findings
    }

    /// Whether a keyword appears in a phrasing that suggests intent rather
    /// than narration.
    fn harmful_context(lowered: &str, keyword: &str) -> bool {
        ["how to", "want to", "going to", "plan to"]
            .iter()
            .any(|lead| lowered.contains(&format!("{} {}", lead, keyword)))
    }

    /// Replace contact details with placeholder tokens.
    pub fn redact(&self, text: &str) -> String {
        let text = self.email.replace_all(text, "[email]");
        let text = self.phone.replace_all(&text, "[phone]");
        let text = self.ssn.replace_all(&text, "[id]");
        text.into_owned()
    }
}

impl Default for ComplianceChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_passes() {
        let checker = ComplianceChecker::new();
        let findings = checker.check("a story about a cat stuck in a tree");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_keyword_flagged_only_in_harmful_context() {
        let checker = ComplianceChecker::new();
        // Narrative mention, no intent phrasing.
        assert!(checker.check("the villain had a knife in the story").is_empty());
        // Intent phrasing flags.
        let findings = checker.check("he said he was going to kill the plant");
        assert_eq!(findings, vec!["Potentially harmful content: kill".to_string()]);
    }

    #[test]
    fn test_identifying_information_flagged() {
        let checker = ComplianceChecker::new();
        let findings = checker.check("contact me at someone@example.com please");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("someone@example.com"));
    }

    #[test]
    fn test_redact_replaces_contact_details() {
        let checker = ComplianceChecker::new();
        let redacted =
            checker.redact("email someone@example.com or call 555-123-4567, ssn 123-45-6789");
        assert!(!redacted.contains("someone@example.com"));
        assert!(!redacted.contains("555-123-4567"));
        assert!(redacted.contains("[email]"));
        assert!(redacted.contains("[phone]"));
    }
}
