//! Rule condition expressions.
//!
//! The grammar is a single comparison: `<field-path> <op> <literal>`, e.g.
//! `payload.plan == 'enterprise'` or `amount >= 100`. A blank or absent
//! condition always matches (catch-all rule). Parsing and evaluation are
//! separate steps; anything that cannot be parsed or resolved evaluates to
//! `false`, so a misconfigured rule never fires and never panics.
//!
//! Semantics:
//! - `==` / `!=` compare the display form of both sides as strings.
//! - `>` / `>=` / `<` / `<=` parse both sides as `f64`; integers beyond
//!   2^53 lose precision, and any parse failure yields `false`.
//! - Operators are probed in the order `!=`, `==`, `>=`, `<=`, `>`, `<`
//!   and the first kind found anywhere in the string wins, so literals
//!   containing operator characters are not supported.

use serde_json::{Map, Value};

/// Comparison operator, in probe order (multi-character operators first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Ne,
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

impl Op {
    const PROBE_ORDER: [(&'static str, Op); 6] = [
        ("!=", Op::Ne),
        ("==", Op::Eq),
        (">=", Op::Ge),
        ("<=", Op::Le),
        (">", Op::Gt),
        ("<", Op::Lt),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Ne => "!=",
            Op::Eq => "==",
            Op::Ge => ">=",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Lt => "<",
        }
    }
}

/// Typed right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Literal {
    fn parse(raw: &str) -> Self {
        let quoted = (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2)
            || (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2);
        if quoted {
            return Literal::Str(raw[1..raw.len() - 1].to_string());
        }
        if raw.eq_ignore_ascii_case("true") {
            return Literal::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Literal::Bool(false);
        }
        if raw.contains('.') {
            if let Ok(f) = raw.parse::<f64>() {
                return Literal::Float(f);
            }
        } else if let Ok(i) = raw.parse::<i64>() {
            return Literal::Int(i);
        }
        Literal::Str(raw.to_string())
    }

    fn display_form(&self) -> String {
        match self {
            Literal::Str(s) => s.clone(),
            Literal::Bool(b) => b.to_string(),
            Literal::Int(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
        }
    }
}

/// Error produced when a condition string cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConditionParseError {
    #[error("no comparison operator found in condition")]
    NoOperator,
    #[error("missing operand around '{0}'")]
    MissingOperand(&'static str),
}

/// A parsed condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Blank condition: always matches.
    CatchAll,
    Compare {
        path: Vec<String>,
        op: Op,
        literal: Literal,
    },
}

impl Condition {
    /// Parse a condition string. `None` or blank parses to [`Condition::CatchAll`].
    pub fn parse(raw: Option<&str>) -> Result<Self, ConditionParseError> {
        let raw = match raw {
            Some(s) if !s.trim().is_empty() => s.trim(),
            _ => return Ok(Condition::CatchAll),
        };

        let (op_str, op) = Op::PROBE_ORDER
            .iter()
            .find(|(symbol, _)| raw.contains(symbol))
            .copied()
            .ok_or(ConditionParseError::NoOperator)?;

        let (left, right) = raw
            .split_once(op_str)
            .ok_or(ConditionParseError::NoOperator)?;

        let field = left.trim();
        let literal_raw = right.trim();
        if field.is_empty() || literal_raw.is_empty() {
            return Err(ConditionParseError::MissingOperand(op.as_str()));
        }

        // The payload itself is the evaluation root, so a leading
        // `payload.` segment is stripped.
        let path_str = field.strip_prefix("payload.").unwrap_or(field);
        let path = path_str.split('.').map(str::to_string).collect();

        Ok(Condition::Compare {
            path,
            op,
            literal: Literal::parse(literal_raw),
        })
    }

    /// Evaluate against a payload. Unresolvable fields yield `false`.
    pub fn evaluate(&self, payload: &Map<String, Value>) -> bool {
        match self {
            Condition::CatchAll => true,
            Condition::Compare { path, op, literal } => {
                let Some(actual) = resolve_path(path, payload) else {
                    return false;
                };
                compare(actual, *op, literal)
            }
        }
    }
}

/// Parse-and-evaluate convenience used by the engine.
///
/// Never panics and never errors: a blank condition matches everything,
/// an unparseable one matches nothing.
pub fn evaluate(condition: Option<&str>, payload: &Map<String, Value>) -> bool {
    match Condition::parse(condition) {
        Ok(parsed) => parsed.evaluate(payload),
        Err(_) => false,
    }
}

/// Walk the payload map segment by segment; any missing segment or
/// non-object intermediate resolves to `None`.
fn resolve_path<'a>(path: &[String], payload: &'a Map<String, Value>) -> Option<&'a Value> {
    let mut current: Option<&Value> = None;
    let mut map = payload;

    for (i, segment) in path.iter().enumerate() {
        let value = map.get(segment)?;
        if i + 1 < path.len() {
            map = value.as_object()?;
        }
        current = Some(value);
    }

    match current {
        Some(Value::Null) | None => None,
        some => some,
    }
}

fn compare(actual: &Value, op: Op, literal: &Literal) -> bool {
    match op {
        Op::Eq => display_form(actual) == literal.display_form(),
        Op::Ne => display_form(actual) != literal.display_form(),
        Op::Gt => compare_numeric(actual, literal, |a, e| a > e),
        Op::Ge => compare_numeric(actual, literal, |a, e| a >= e),
        Op::Lt => compare_numeric(actual, literal, |a, e| a < e),
        Op::Le => compare_numeric(actual, literal, |a, e| a <= e),
    }
}

/// Numeric ordering goes through f64 on both sides; parse failures on
/// either side mean no match.
fn compare_numeric(actual: &Value, literal: &Literal, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (
        display_form(actual).parse::<f64>(),
        literal.display_form().parse::<f64>(),
    ) {
        (Ok(a), Ok(e)) => cmp(a, e),
        _ => false,
    }
}

/// Display form of a payload value for stringwise comparison: strings are
/// unquoted, everything else renders as its JSON text.
fn display_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn blank_condition_always_matches() {
        let p = payload(json!({"plan": "free"}));
        assert!(evaluate(None, &p));
        assert!(evaluate(Some(""), &p));
        assert!(evaluate(Some("   "), &p));
    }

    #[test]
    fn string_equality() {
        let p = payload(json!({"plan": "enterprise"}));
        assert!(evaluate(Some("payload.plan == 'enterprise'"), &p));
        assert!(!evaluate(Some("payload.plan == 'standard'"), &p));
        assert!(evaluate(Some("plan == \"enterprise\""), &p));
    }

    #[test]
    fn inequality() {
        let p = payload(json!({"plan": "enterprise"}));
        assert!(evaluate(Some("payload.plan != 'standard'"), &p));
        assert!(!evaluate(Some("payload.plan != 'enterprise'"), &p));
    }

    #[test]
    fn numeric_comparisons() {
        let p = payload(json!({"amount": 150}));
        assert!(evaluate(Some("payload.amount > 100"), &p));
        assert!(evaluate(Some("payload.amount >= 150"), &p));
        assert!(!evaluate(Some("payload.amount < 100"), &p));
        assert!(evaluate(Some("payload.amount <= 150"), &p));
        assert!(!evaluate(Some("payload.amount > 200"), &p));
    }

    #[test]
    fn decimal_comparison() {
        let p = payload(json!({"score": 0.75}));
        assert!(evaluate(Some("score > 0.5"), &p));
        assert!(!evaluate(Some("score > 0.9"), &p));
    }

    #[test]
    fn number_compares_stringwise_under_equality() {
        let p = payload(json!({"count": 100}));
        assert!(evaluate(Some("count == 100"), &p));
        assert!(!evaluate(Some("count == 99"), &p));
        assert!(evaluate(Some("count == '100'"), &p));
    }

    #[test]
    fn boolean_literal() {
        let p = payload(json!({"active": true}));
        assert!(evaluate(Some("active == true"), &p));
        assert!(evaluate(Some("active == TRUE"), &p));
        assert!(!evaluate(Some("active == false"), &p));
    }

    #[test]
    fn nested_field_path() {
        let p = payload(json!({"address": {"city": "Madrid"}}));
        assert!(evaluate(Some("payload.address.city == 'Madrid'"), &p));
        assert!(!evaluate(Some("address.city == 'Paris'"), &p));
    }

    #[test]
    fn missing_field_does_not_match() {
        let p = payload(json!({"plan": "enterprise"}));
        assert!(!evaluate(Some("payload.tier == 'gold'"), &p));
    }

    #[test]
    fn null_field_does_not_match() {
        let p = payload(json!({"plan": null}));
        assert!(!evaluate(Some("plan == 'enterprise'"), &p));
    }

    #[test]
    fn non_object_intermediate_does_not_match() {
        let p = payload(json!({"plan": "enterprise"}));
        assert!(!evaluate(Some("plan.tier == 'gold'"), &p));
    }

    #[test]
    fn numeric_comparison_against_non_numeric_does_not_match() {
        let p = payload(json!({"plan": "enterprise"}));
        assert!(!evaluate(Some("plan > 10"), &p));
    }

    #[test]
    fn unparseable_conditions_do_not_match() {
        let p = payload(json!({"plan": "enterprise"}));
        assert!(!evaluate(Some("no operator here"), &p));
        assert!(!evaluate(Some("== 'enterprise'"), &p));
        assert!(!evaluate(Some("plan =="), &p));
    }

    #[test]
    fn multi_char_operators_win_over_single_char() {
        let p = payload(json!({"amount": 100}));
        // ">=" must not be read as ">" followed by "=100".
        assert!(evaluate(Some("amount >= 100"), &p));
        let parsed = Condition::parse(Some("amount >= 100")).unwrap();
        assert!(matches!(
            parsed,
            Condition::Compare { op: Op::Ge, .. }
        ));
    }

    #[test]
    fn evaluator_never_panics_on_arbitrary_input() {
        let p = payload(json!({"a": {"b": [1, 2]}, "c": "x"}));
        let inputs = [
            "", " ", "a", "a.b", "a.b == ", "== ==", "!=", "a.b.c.d > 'x'",
            "a == 'unterminated", "...", "a.b == [1,2]", "c < c", "\u{0} == \u{0}",
            "payload.payload.payload == 1", "a >< b", "a ==> b",
        ];
        for input in inputs {
            // Result only needs to be a bool; no panic allowed.
            let _ = evaluate(Some(input), &p);
        }
    }

    #[test]
    fn parse_separates_from_evaluation() {
        let parsed = Condition::parse(Some("payload.plan == 'enterprise'")).unwrap();
        match &parsed {
            Condition::Compare { path, op, literal } => {
                assert_eq!(path, &vec!["plan".to_string()]);
                assert_eq!(*op, Op::Eq);
                assert_eq!(*literal, Literal::Str("enterprise".to_string()));
            }
            other => panic!("unexpected parse result: {other:?}"),
        }
        assert!(Condition::parse(Some("garbage")).is_err());
        assert_eq!(Condition::parse(None).unwrap(), Condition::CatchAll);
    }
}
