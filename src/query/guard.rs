//! Read-only guard.
//!
//! A keyword heuristic applied before a statement is admitted on a read-only
//! connection. It matches whole words only, so `deletedAt` passes while
//! `DELETE` does not. Mutations hidden behind procedure calls are not
//! detected.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SessionError;
use crate::query::statement::StatementDescriptor;

const MUTATING_PATTERN: &str = r"(?i)\b(create|relate|delete|set)\b";

static MUTATING: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(MUTATING_PATTERN).ok());

/// Whether `text` contains a mutating keyword as a whole word.
pub fn is_mutating(text: &str) -> bool {
    match MUTATING.as_ref() {
        Some(re) => re.is_match(text),
        // Fail closed.
        None => true,
    }
}

/// Reject the first mutating statement in `statements`.
///
/// # Errors
///
/// Returns `SessionError::ReadOnlyViolation` naming the offending query.
pub fn check_read_only(statements: &[StatementDescriptor]) -> Result<(), SessionError> {
    match statements.iter().find(|s| is_mutating(s.text())) {
        Some(statement) => Err(SessionError::ReadOnlyViolation {
            query: statement.text().to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_compiles() {
        assert!(MUTATING.is_some());
    }

    #[test]
    fn test_rejects_keywords_any_case() {
        assert!(is_mutating("MATCH (n) DELETE n"));
        assert!(is_mutating("match (n) delete n"));
        assert!(is_mutating("CREATE (n:Person)"));
        assert!(is_mutating("MATCH (n) SET n.x = 1"));
        assert!(is_mutating("START a=node(1) RELATE a-[:R]->b"));
        assert!(is_mutating("MATCH (n) DETACH DELETE n"));
    }

    #[test]
    fn test_accepts_substrings() {
        assert!(!is_mutating("MATCH (n) RETURN n.deletedAt"));
        assert!(!is_mutating("MATCH (n) WHERE n.created > 0 RETURN n"));
        assert!(!is_mutating("MATCH (n:Settings) RETURN n.offset"));
        assert!(!is_mutating("RETURN 1"));
    }

    #[test]
    fn test_word_boundary_is_textual() {
        // Property access and string literals are not parsed.
        assert!(is_mutating("MATCH (n) RETURN n.set"));
        assert!(is_mutating("RETURN 'delete me'"));
    }

    #[test]
    fn test_check_read_only_reports_offender() {
        let statements = vec![
            StatementDescriptor::new("MATCH (n) RETURN n"),
            StatementDescriptor::new("MATCH (n) DELETE n"),
        ];
        match check_read_only(&statements) {
            Err(SessionError::ReadOnlyViolation { query }) => {
                assert_eq!(query, "MATCH (n) DELETE n");
            }
            other => panic!("Expected ReadOnlyViolation, got {:?}", other),
        }

        assert!(check_read_only(&statements[..1]).is_ok());
        assert!(check_read_only(&[]).is_ok());
    }
}
