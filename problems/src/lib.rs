//! Problem codes for PLCopen TC6 documents.
//!
//! The enumeration is generated from `resources/problem-codes.csv` so that
//! the codes stay stable and documented in one place.

include!(concat!(env!("OUT_DIR"), "/problems.rs"));

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::Problem;

    #[test]
    fn code_when_all_problems_then_codes_are_unique() {
        let codes: HashSet<&str> = Problem::ALL.iter().map(|p| p.code()).collect();
        assert_eq!(codes.len(), Problem::ALL.len());
    }

    #[test]
    fn code_when_dangling_reference_then_stable_code() {
        assert_eq!(Problem::DanglingReference.code(), "P0005");
    }

    #[test]
    fn fmt_when_problem_then_includes_code_and_message() {
        let text = format!("{}", Problem::InvalidChoice);
        assert!(text.starts_with("P0002: "));
        assert!(text.contains("exactly one alternative"));
    }
}
