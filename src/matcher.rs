//! Value matching for element text and attribute values.

use crate::expectation::ValueExpr;

/// Why an actual value did not satisfy its expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// Wildcard expected, but the value is empty
    Empty,
    /// Value differs from the literal or is not an enumeration member
    Incorrect,
}

impl Mismatch {
    /// Short description, e.g. `value is empty`
    pub fn describe(&self) -> &'static str {
        match self {
            Mismatch::Empty => "value is empty",
            Mismatch::Incorrect => "value is incorrect",
        }
    }
}

/// Compare one actual value with one expected expression.
///
/// `None` means the value matches. Total over all inputs.
pub fn match_value(actual: &str, expected: &ValueExpr) -> Option<Mismatch> {
    match expected {
        ValueExpr::Wildcard => actual.is_empty().then_some(Mismatch::Empty),
        ValueExpr::Enumeration { members, .. } => {
            (!members.iter().any(|member| member == actual)).then_some(Mismatch::Incorrect)
        }
        ValueExpr::Literal(value) => (actual != value).then_some(Mismatch::Incorrect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard() {
        assert_eq!(
            match_value("", &ValueExpr::Wildcard),
            Some(Mismatch::Empty)
        );
        assert_eq!(match_value("Up", &ValueExpr::Wildcard), None);
        assert_eq!(match_value(" ", &ValueExpr::Wildcard), None);
    }

    #[test]
    fn test_enumeration_trims_members() {
        let expected = ValueExpr::parse("a, b ,c");
        assert_eq!(match_value("b", &expected), None);
        assert_eq!(match_value("a", &expected), None);
        assert_eq!(
            match_value("d", &ValueExpr::parse("a,b,c")),
            Some(Mismatch::Incorrect)
        );
        assert_eq!(
            match_value(" b ", &expected),
            Some(Mismatch::Incorrect)
        );
    }

    #[test]
    fn test_enumeration_trailing_comma() {
        let expected = ValueExpr::parse("PG,");
        assert_eq!(match_value("PG", &expected), None);
        assert_eq!(match_value("", &expected), Some(Mismatch::Incorrect));
    }

    #[test]
    fn test_enumeration_interior_empty_member() {
        let expected = ValueExpr::parse("a,,b");
        assert_eq!(match_value("", &expected), None);
        assert_eq!(match_value("b", &expected), None);
        assert_eq!(match_value("c", &expected), Some(Mismatch::Incorrect));
    }

    #[test]
    fn test_literal() {
        for value in ["", "PG-13", "Toy Story 3", "ünïcödé"] {
            assert_eq!(match_value(value, &ValueExpr::parse(value)), None);
        }
        assert_eq!(
            match_value("PG", &ValueExpr::parse("PG-13")),
            Some(Mismatch::Incorrect)
        );
        assert_eq!(
            match_value("", &ValueExpr::parse("PG")),
            Some(Mismatch::Incorrect)
        );
    }

    #[test]
    fn test_mismatch_description() {
        assert_eq!(Mismatch::Empty.describe(), "value is empty");
        assert_eq!(Mismatch::Incorrect.describe(), "value is incorrect");
    }
}
