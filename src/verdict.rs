//! Checker verdict classification.
//!
//! The checker agent is instructed to open its reply with one of two fixed
//! marker phrases. Classification is exact-substring containment, checked in
//! a fixed order; it is intentionally not a parser. A marker appearing
//! anywhere in the text counts, including inside quoted material, and the
//! accept marker wins when both are present. Keeping these semantics is part
//! of the protocol contract with the checker prompt.

/// Marker phrase meaning the checker accepted the result.
pub const ACCEPTED_MARKER: &str = "ЗАДАЧА ВЫПОЛНЕНА";

/// Marker phrase meaning the checker rejected the result.
pub const REJECTED_MARKER: &str = "ЗАДАЧА НЕ ВЫПОЛНЕНА";

/// Classified checker verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The accept marker is present.
    Accepted,
    /// The reject marker is present and the accept marker is not.
    Rejected,
    /// Neither marker is present.
    Ambiguous,
}

/// Classify checker output text by marker containment.
pub fn classify(checker_text: &str) -> Verdict {
    if checker_text.contains(ACCEPTED_MARKER) {
        Verdict::Accepted
    } else if checker_text.contains(REJECTED_MARKER) {
        Verdict::Rejected
    } else {
        Verdict::Ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted() {
        let text = "ЗАДАЧА ВЫПОЛНЕНА: все критерии приемки подтверждены";
        assert_eq!(classify(text), Verdict::Accepted);
    }

    #[test]
    fn test_rejected() {
        let text = "ЗАДАЧА НЕ ВЫПОЛНЕНА: отсутствует скриншот";
        assert_eq!(classify(text), Verdict::Rejected);
    }

    #[test]
    fn test_ambiguous() {
        assert_eq!(classify("я не уверен, нужно уточнение"), Verdict::Ambiguous);
        assert_eq!(classify(""), Verdict::Ambiguous);
    }

    #[test]
    fn test_marker_anywhere_in_text_counts() {
        let text = "Отчет длинный...\n...в итоге ЗАДАЧА НЕ ВЫПОЛНЕНА по пункту 3.";
        assert_eq!(classify(text), Verdict::Rejected);
    }

    #[test]
    fn test_accept_checked_first_when_both_present() {
        let text = "ЗАДАЧА ВЫПОЛНЕНА. Ранее было: ЗАДАЧА НЕ ВЫПОЛНЕНА.";
        assert_eq!(classify(text), Verdict::Accepted);

        let reversed = "ЗАДАЧА НЕ ВЫПОЛНЕНА... хотя нет: ЗАДАЧА ВЫПОЛНЕНА";
        assert_eq!(classify(reversed), Verdict::Accepted);
    }

    #[test]
    fn test_reject_marker_does_not_contain_accept_marker() {
        // The two phrases differ by an inserted word; a bare rejection must
        // never classify as Accepted.
        assert!(!REJECTED_MARKER.contains(ACCEPTED_MARKER));
        assert_eq!(classify(REJECTED_MARKER), Verdict::Rejected);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(classify("задача выполнена"), Verdict::Ambiguous);
    }

    #[test]
    fn test_quoted_marker_counts() {
        // Exact-substring semantics: even a quoted example is a match.
        let text = "Формат ответа должен быть \"ЗАДАЧА ВЫПОЛНЕНА: ...\"";
        assert_eq!(classify(text), Verdict::Accepted);
    }
}
