//! kubectl-style JSONPath subset used by `wait_for_upsert`
//!
//! Supported syntax:
//!
//! ```text
//! {.status.phase}                       braces and leading `$` are optional
//! .status.conditions[0].type            field access and array index
//! .metadata.labels['app.kubernetes.io/name']
//! .status.conditions[?(@.type=="Ready")].status
//! .spec.items[*].name                   wildcard over arrays and objects
//! ```

use serde_json::Value;

use crate::error::{CoreError, Result};

/// A parsed JSONPath expression
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    expression: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Field(String),
    Index(usize),
    Wildcard,
    Filter(Filter),
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    path: Vec<String>,
    negate: bool,
    literal: Value,
}

impl JsonPath {
    /// Parse an expression
    pub fn parse(expression: &str) -> Result<Self> {
        let segments = Parser::new(expression).parse()?;
        Ok(Self {
            expression: expression.to_string(),
            segments,
        })
    }

    /// The expression as written
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluate against a document, returning every matched value
    pub fn evaluate<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];

        for segment in &self.segments {
            let mut next = Vec::new();
            for value in current {
                match segment {
                    Segment::Field(name) => {
                        if let Some(v) = value.get(name.as_str()) {
                            next.push(v);
                        }
                    }
                    Segment::Index(i) => {
                        if let Some(v) = value.as_array().and_then(|a| a.get(*i)) {
                            next.push(v);
                        }
                    }
                    Segment::Wildcard => match value {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ => {}
                    },
                    Segment::Filter(filter) => {
                        if let Some(items) = value.as_array() {
                            next.extend(items.iter().filter(|item| filter.matches(item)));
                        }
                    }
                }
            }
            current = next;
        }

        current
    }

    /// Whether any matched value renders to exactly `expected`
    pub fn matches(&self, root: &Value, expected: &str) -> bool {
        self.evaluate(root)
            .into_iter()
            .any(|v| render_value(v) == expected)
    }
}

impl std::fmt::Display for JsonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}

impl Filter {
    fn matches(&self, item: &Value) -> bool {
        let mut current = item;
        for part in &self.path {
            match current.get(part.as_str()) {
                Some(v) => current = v,
                None => return self.negate,
            }
        }
        (current == &self.literal) != self.negate
    }
}

/// Render a matched value the way kubectl prints it: strings bare, the rest as JSON
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct Parser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        let trimmed = expression.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(trimmed)
            .trim();
        let inner = inner.strip_prefix('$').unwrap_or(inner);

        Self {
            expression,
            chars: inner.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> CoreError {
        CoreError::InvalidJsonPath {
            expression: self.expression.to_string(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' at position {}", c, self.pos)))
        }
    }

    fn parse(mut self) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();

        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.pos += 1;
                    match self.peek() {
                        // A lone trailing dot (".") addresses the root
                        None if segments.is_empty() => break,
                        Some('.') => return Err(self.error("recursive descent is not supported")),
                        Some('*') => {
                            self.pos += 1;
                            segments.push(Segment::Wildcard);
                        }
                        Some('[') => {}
                        _ => {
                            let name = self.identifier()?;
                            segments.push(Segment::Field(name));
                        }
                    }
                }
                '[' => segments.push(self.bracket()?),
                _ if segments.is_empty() && self.pos == 0 => {
                    // Leading field without a dot ("status.phase")
                    let name = self.identifier()?;
                    segments.push(Segment::Field(name));
                }
                other => {
                    return Err(self.error(format!(
                        "unexpected character '{}' at position {}",
                        other, self.pos
                    )));
                }
            }
        }

        Ok(segments)
    }

    fn identifier(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' || c == ']' || c.is_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error(format!("expected field name at position {}", start)));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn bracket(&mut self) -> Result<Segment> {
        self.expect('[')?;

        let segment = match self.peek() {
            Some('*') => {
                self.pos += 1;
                Segment::Wildcard
            }
            Some('\'') | Some('"') => Segment::Field(self.quoted()?),
            Some('?') => Segment::Filter(self.filter()?),
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let index = digits
                    .parse()
                    .map_err(|_| self.error(format!("invalid index '{}'", digits)))?;
                Segment::Index(index)
            }
            Some(other) => {
                return Err(self.error(format!(
                    "unsupported bracket expression starting with '{}'",
                    other
                )));
            }
            None => return Err(self.error("unterminated '['")),
        };

        self.expect(']')?;
        Ok(segment)
    }

    fn quoted(&mut self) -> Result<String> {
        let Some(quote) = self.peek() else {
            return Err(self.error("expected quoted string"));
        };
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let s: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(s);
            }
            self.pos += 1;
        }
        Err(self.error("unterminated string literal"))
    }

    fn filter(&mut self) -> Result<Filter> {
        self.expect('?')?;
        self.expect('(')?;
        self.skip_whitespace();
        self.expect('@')?;

        let mut path = Vec::new();
        while self.peek() == Some('.') {
            self.pos += 1;
            let start = self.pos;
            while let Some(c) = self.peek() {
                if c == '.' || c == '=' || c == '!' || c == ')' || c.is_whitespace() {
                    break;
                }
                self.pos += 1;
            }
            if self.pos == start {
                return Err(self.error("expected field name in filter"));
            }
            path.push(self.chars[start..self.pos].iter().collect());
        }
        if path.is_empty() {
            return Err(self.error("filter must reference a field of '@'"));
        }

        self.skip_whitespace();
        let negate = match (self.peek(), self.chars.get(self.pos + 1).copied()) {
            (Some('='), Some('=')) => false,
            (Some('!'), Some('=')) => true,
            _ => return Err(self.error("filter supports only '==' and '!='")),
        };
        self.pos += 2;
        self.skip_whitespace();

        let literal = match self.peek() {
            Some('\'') | Some('"') => Value::String(self.quoted()?),
            Some(_) => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c != ')' && !c.is_whitespace()) {
                    self.pos += 1;
                }
                let raw: String = self.chars[start..self.pos].iter().collect();
                serde_json::from_str(&raw)
                    .map_err(|_| self.error(format!("invalid filter literal '{}'", raw)))?
            }
            None => return Err(self.error("unterminated filter")),
        };

        self.skip_whitespace();
        self.expect(')')?;

        Ok(Filter {
            path,
            negate,
            literal,
        })
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object() -> Value {
        json!({
            "metadata": {
                "name": "demo",
                "labels": {"app.kubernetes.io/name": "loki"}
            },
            "status": {
                "phase": "Ready",
                "replicas": 3,
                "conditions": [
                    {"type": "Pending", "status": "False"},
                    {"type": "Ready", "status": "True"}
                ]
            }
        })
    }

    #[test]
    fn test_simple_field_paths() {
        let doc = object();
        assert!(JsonPath::parse(".status.phase").unwrap().matches(&doc, "Ready"));
        assert!(JsonPath::parse("{.status.phase}").unwrap().matches(&doc, "Ready"));
        assert!(JsonPath::parse("$.status.phase").unwrap().matches(&doc, "Ready"));
        assert!(JsonPath::parse("status.phase").unwrap().matches(&doc, "Ready"));
        assert!(!JsonPath::parse(".status.phase").unwrap().matches(&doc, "Pending"));
    }

    #[test]
    fn test_numbers_render_as_json() {
        let doc = object();
        assert!(JsonPath::parse(".status.replicas").unwrap().matches(&doc, "3"));
    }

    #[test]
    fn test_index_and_quoted_field() {
        let doc = object();
        let path = JsonPath::parse(".status.conditions[1].type").unwrap();
        assert!(path.matches(&doc, "Ready"));

        let label = JsonPath::parse(".metadata.labels['app.kubernetes.io/name']").unwrap();
        assert!(label.matches(&doc, "loki"));
    }

    #[test]
    fn test_filter_expression() {
        let doc = object();
        let path = JsonPath::parse(r#".status.conditions[?(@.type=="Ready")].status"#).unwrap();
        assert_eq!(path.evaluate(&doc), vec![&json!("True")]);
        assert!(path.matches(&doc, "True"));

        let negated = JsonPath::parse(".status.conditions[?(@.type != 'Ready')].status").unwrap();
        assert!(negated.matches(&doc, "False"));
    }

    #[test]
    fn test_wildcard() {
        let doc = object();
        let path = JsonPath::parse(".status.conditions[*].type").unwrap();
        assert_eq!(path.evaluate(&doc).len(), 2);
        assert!(path.matches(&doc, "Pending"));
    }

    #[test]
    fn test_missing_path_matches_nothing() {
        let doc = object();
        let path = JsonPath::parse(".status.missing.deeper").unwrap();
        assert!(path.evaluate(&doc).is_empty());
        assert!(!path.matches(&doc, ""));
    }

    #[test]
    fn test_root_path() {
        let doc = json!("x");
        assert!(JsonPath::parse("{.}").unwrap().matches(&doc, "x"));
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(JsonPath::parse(".status[").is_err());
        assert!(JsonPath::parse("..status").is_err());
        assert!(JsonPath::parse(".items[?(@.a > 1)]").is_err());
        assert!(JsonPath::parse(".items[?(@.a=='x']").is_err());
    }
}
