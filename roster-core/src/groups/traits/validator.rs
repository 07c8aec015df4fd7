//! Member identifier validation

/// Decides whether a string is a syntactically valid member identifier
pub trait MemberValidator: Send + Sync {
    fn is_valid(&self, identifier: &str) -> bool;
}

/// Accepts E.164-style numbers: a leading `+` followed by ASCII digits
#[derive(Debug, Clone, Copy, Default)]
pub struct E164Validator;

impl MemberValidator for E164Validator {
    fn is_valid(&self, identifier: &str) -> bool {
        match identifier.strip_prefix('+') {
            Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_e164_accepts_numbers() {
        let v = E164Validator;
        assert!(v.is_valid("+15555550123"));
        assert!(v.is_valid("+1"));
    }

    #[test]
    fn test_e164_rejects_malformed() {
        let v = E164Validator;
        assert!(!v.is_valid(""));
        assert!(!v.is_valid("+"));
        assert!(!v.is_valid("15555550123"));
        assert!(!v.is_valid("+1555-555"));
        assert!(!v.is_valid("+1555 555"));
        assert!(!v.is_valid("++1555"));
        assert!(!v.is_valid("+١٢٣"));
    }
}
