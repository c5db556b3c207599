//! Where-clause evaluation for the in-memory store.
//!
//! The dialect covers conjunctive filters over document fields:
//!
//! ```text
//! p.score >= @min_score AND p.profile.region = 'eu' AND p.active = true
//! ```
//!
//! Comparisons take the form `operand op operand` with `=`, `!=`, `<`,
//! `<=`, `>` and `>=`, joined by `AND`. An operand is a dotted field
//! path rooted at the query's source alias, an `@name` parameter, or a
//! literal (single-quoted string, number, `true`, `false`, `null`).
//! Comparisons are typed: numbers order numerically, strings
//! lexicographically, and operands of mismatched type never satisfy an
//! ordering operator. A comparison over a missing field does not match.
//! An empty clause matches every document.

use std::cmp::Ordering;

use anyhow::anyhow;
use docstore::{Document, StoreError, StoreQuery};

#[derive(Debug, Clone, Copy)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug)]
enum Token {
    Word(String),
    Text(String),
    Op(CmpOp),
    And,
}

#[derive(Debug, Clone)]
enum Operand {
    /// Path segments below the source alias.
    Field(Vec<String>),
    /// A literal or a resolved parameter value.
    Value(Document),
}

#[derive(Debug)]
struct Comparison {
    left: Operand,
    op: CmpOp,
    right: Operand,
}

/// A parsed where-clause, ready to match documents.
#[derive(Debug)]
pub(crate) struct WherePredicate {
    comparisons: Vec<Comparison>,
}

impl WherePredicate {
    /// Parses the query's clause, resolving `@name` tokens against its
    /// bound parameters. Syntax problems and unbound parameters surface
    /// as backend errors.
    pub(crate) fn parse(query: &StoreQuery) -> Result<Self, StoreError> {
        let tokens = tokenize(query.where_clause())?;
        if tokens.is_empty() {
            return Ok(Self {
                comparisons: Vec::new(),
            });
        }

        let mut comparisons = Vec::new();
        for group in tokens.split(|token| matches!(token, Token::And)) {
            match group {
                [left, Token::Op(op), right] => comparisons.push(Comparison {
                    left: parse_operand(left, query)?,
                    op: *op,
                    right: parse_operand(right, query)?,
                }),
                _ => return Err(syntax_error("expected 'operand operator operand'")),
            }
        }

        Ok(Self { comparisons })
    }

    /// True when `document` satisfies every comparison.
    pub(crate) fn matches(&self, document: &Document) -> bool {
        self.comparisons
            .iter()
            .all(|comparison| comparison.matches(document))
    }
}

impl Comparison {
    fn matches(&self, document: &Document) -> bool {
        let (Some(left), Some(right)) =
            (self.left.resolve(document), self.right.resolve(document))
        else {
            return false;
        };
        compare(left, self.op, right)
    }
}

impl Operand {
    fn resolve<'a>(&'a self, document: &'a Document) -> Option<&'a Document> {
        match self {
            Operand::Value(value) => Some(value),
            Operand::Field(segments) => {
                let mut current = document;
                for segment in segments {
                    current = current.get(segment)?;
                }
                Some(current)
            }
        }
    }
}

fn compare(left: &Document, op: CmpOp, right: &Document) -> bool {
    match op {
        CmpOp::Eq => values_equal(left, right),
        CmpOp::Ne => !values_equal(left, right),
        CmpOp::Lt => matches!(order_of(left, right), Some(Ordering::Less)),
        CmpOp::Le => matches!(
            order_of(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CmpOp::Gt => matches!(order_of(left, right), Some(Ordering::Greater)),
        CmpOp::Ge => matches!(
            order_of(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// Numbers and strings order; every other pairing does not.
fn order_of(left: &Document, right: &Document) -> Option<Ordering> {
    match (left, right) {
        (Document::Number(a), Document::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
        (Document::String(a), Document::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Equality compares numbers numerically, so an integer field matches a
/// float parameter with the same value. Everything else uses strict
/// JSON equality.
fn values_equal(left: &Document, right: &Document) -> bool {
    match (left, right) {
        (Document::Number(a), Document::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

fn parse_operand(token: &Token, query: &StoreQuery) -> Result<Operand, StoreError> {
    match token {
        Token::Text(text) => Ok(Operand::Value(Document::String(text.clone()))),
        Token::Word(word) => parse_word(word, query),
        _ => Err(syntax_error("operator in operand position")),
    }
}

fn parse_word(word: &str, query: &StoreQuery) -> Result<Operand, StoreError> {
    if word.starts_with('@') {
        return match query.parameters().get(word) {
            Some(value) => Ok(Operand::Value(value.clone())),
            None => Err(StoreError::Backend(anyhow!("unbound parameter '{}'", word))),
        };
    }

    match word {
        "true" => return Ok(Operand::Value(Document::Bool(true))),
        "false" => return Ok(Operand::Value(Document::Bool(false))),
        "null" => return Ok(Operand::Value(Document::Null)),
        _ => {}
    }

    if let Ok(integer) = word.parse::<i64>() {
        return Ok(Operand::Value(Document::from(integer)));
    }
    if let Ok(float) = word.parse::<f64>() {
        return match serde_json::Number::from_f64(float) {
            Some(number) => Ok(Operand::Value(Document::Number(number))),
            None => Err(syntax_error(&format!("non-finite number '{}'", word))),
        };
    }

    let alias = format!("{}.", query.source());
    if let Some(path) = word.strip_prefix(&alias) {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(syntax_error(&format!("malformed field path '{}'", word)));
        }
        return Ok(Operand::Field(segments));
    }

    Err(syntax_error(&format!("unrecognized token '{}'", word)))
}

fn tokenize(clause: &str) -> Result<Vec<Token>, StoreError> {
    let mut tokens = Vec::new();
    let mut chars = clause.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '=' {
            chars.next();
            tokens.push(Token::Op(CmpOp::Eq));
        } else if c == '!' {
            chars.next();
            match chars.next() {
                Some('=') => tokens.push(Token::Op(CmpOp::Ne)),
                _ => return Err(syntax_error("expected '=' after '!'")),
            }
        } else if c == '<' {
            chars.next();
            if chars.peek() == Some(&'=') {
                chars.next();
                tokens.push(Token::Op(CmpOp::Le));
            } else {
                tokens.push(Token::Op(CmpOp::Lt));
            }
        } else if c == '>' {
            chars.next();
            if chars.peek() == Some(&'=') {
                chars.next();
                tokens.push(Token::Op(CmpOp::Ge));
            } else {
                tokens.push(Token::Op(CmpOp::Gt));
            }
        } else if c == '\'' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('\'') => break,
                    Some(ch) => text.push(ch),
                    None => return Err(syntax_error("unterminated string literal")),
                }
            }
            tokens.push(Token::Text(text));
        } else if is_word_char(c) {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if !is_word_char(ch) {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            if word.eq_ignore_ascii_case("and") {
                tokens.push(Token::And);
            } else {
                tokens.push(Token::Word(word));
            }
        } else {
            return Err(syntax_error(&format!("unexpected character '{}'", c)));
        }
    }

    Ok(tokens)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '-')
}

fn syntax_error(detail: &str) -> StoreError {
    StoreError::Backend(anyhow!("malformed where-clause: {}", detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore::QueryParameters;
    use serde_json::json;

    fn predicate(clause: &str, parameters: QueryParameters) -> WherePredicate {
        let query = StoreQuery::new("p", clause, parameters);
        WherePredicate::parse(&query).expect("Failed to parse where-clause")
    }

    fn parse_err(clause: &str, parameters: QueryParameters) -> StoreError {
        let query = StoreQuery::new("p", clause, parameters);
        WherePredicate::parse(&query).expect_err("parse should fail")
    }

    #[test]
    fn test_equality_on_string_parameter() {
        let predicate = predicate(
            "p.name = @name",
            QueryParameters::new().bind("@name", "alice"),
        );

        assert!(predicate.matches(&json!({"name": "alice"})));
        assert!(!predicate.matches(&json!({"name": "bob"})));
    }

    #[test]
    fn test_numeric_range_operators() {
        let predicate = predicate("p.score >= 10", QueryParameters::new());

        assert!(predicate.matches(&json!({"score": 10})));
        assert!(predicate.matches(&json!({"score": 11.5})));
        assert!(!predicate.matches(&json!({"score": 9})));
    }

    #[test]
    fn test_and_requires_every_comparison() {
        let predicate = predicate("p.score > 10 AND p.active = true", QueryParameters::new());

        assert!(predicate.matches(&json!({"score": 11, "active": true})));
        assert!(!predicate.matches(&json!({"score": 11, "active": false})));
        assert!(!predicate.matches(&json!({"score": 9, "active": true})));
    }

    #[test]
    fn test_lowercase_and_is_accepted() {
        let predicate = predicate("p.a = 1 and p.b = 2", QueryParameters::new());

        assert!(predicate.matches(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_nested_field_path() {
        let predicate = predicate("p.profile.region = 'eu'", QueryParameters::new());

        assert!(predicate.matches(&json!({"profile": {"region": "eu"}})));
        assert!(!predicate.matches(&json!({"profile": {"region": "us"}})));
        assert!(!predicate.matches(&json!({"profile": {}})));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let equals = predicate("p.absent = 1", QueryParameters::new());
        let differs = predicate("p.absent != 1", QueryParameters::new());

        assert!(!equals.matches(&json!({})));
        assert!(!differs.matches(&json!({})));
    }

    #[test]
    fn test_integer_and_float_compare_numerically() {
        let predicate = predicate("p.score = 21", QueryParameters::new());

        assert!(predicate.matches(&json!({"score": 21.0})));
    }

    #[test]
    fn test_mismatched_types_do_not_match() {
        let predicate = predicate("p.score = '10'", QueryParameters::new());

        assert!(!predicate.matches(&json!({"score": 10})));
    }

    #[test]
    fn test_boolean_and_null_literals() {
        let inactive = predicate("p.active = false", QueryParameters::new());
        let unset = predicate("p.deleted_at = null", QueryParameters::new());

        assert!(inactive.matches(&json!({"active": false})));
        assert!(!inactive.matches(&json!({"active": true})));
        assert!(unset.matches(&json!({"deleted_at": null})));
        assert!(!unset.matches(&json!({"deleted_at": "2024-01-01"})));
    }

    #[test]
    fn test_string_literal_with_spaces() {
        let predicate = predicate("p.title = 'hello world'", QueryParameters::new());

        assert!(predicate.matches(&json!({"title": "hello world"})));
    }

    #[test]
    fn test_negative_number_literal() {
        let predicate = predicate("p.delta < -1", QueryParameters::new());

        assert!(predicate.matches(&json!({"delta": -5})));
        assert!(!predicate.matches(&json!({"delta": 0})));
    }

    #[test]
    fn test_empty_clause_matches_everything() {
        let predicate = predicate("", QueryParameters::new());

        assert!(predicate.matches(&json!({"anything": true})));
        assert!(predicate.matches(&json!({})));
    }

    #[test]
    fn test_unbound_parameter_is_error() {
        let err = parse_err("p.score = @missing", QueryParameters::new());

        assert!(matches!(err, StoreError::Backend(_)));
        assert!(err.to_string().contains("@missing"));
    }

    #[test]
    fn test_dangling_operator_is_error() {
        let err = parse_err("p.score >", QueryParameters::new());

        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_unaliased_field_is_error() {
        let err = parse_err("score = 1", QueryParameters::new());

        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = parse_err("p.name = 'open", QueryParameters::new());

        assert!(matches!(err, StoreError::Backend(_)));
    }
}
