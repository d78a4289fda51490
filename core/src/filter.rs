//! JSONPath-style exclusion filters.
//!
//! A filter is evaluated against the raw schema document. Every node it
//! matches is turned back into a field path by dropping the `properties`
//! segments of the match location, so `$.properties.user.properties.id`
//! excludes the field `user.id`.
//!
//! Supported syntax:
//!
//! | Syntax                 | Meaning                                     |
//! |------------------------|---------------------------------------------|
//! | `$`                    | document root                               |
//! | `.name`, `['name']`    | child member                                |
//! | `.*`, `[*]`            | every child                                 |
//! | `..name`, `..*`        | recursive descent                           |
//! | `[2]`                  | array element                               |
//! | `[?(@.key)]`           | children that have `key`                    |
//! | `[?(@.key == 'v')]`    | children whose `key` equals (or `!=`) a literal |

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::{DocsError, Result};

/// A compiled filter expression.
///
/// # Examples
///
/// ```
/// use schema_docs_core::Filter;
/// use serde_json::json;
///
/// let schema = json!({
///     "properties": {
///         "id": {"type": "string"},
///         "debug": {"type": "object", "properties": {"trace": {"type": "string"}}}
///     }
/// });
///
/// let filter = Filter::compile("$.properties.debug.properties.trace").unwrap();
/// assert!(filter.excluded_paths(&schema).contains("debug.trace"));
///
/// assert!(Filter::compile("properties.id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    expression: String,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Child(Selector),
    Descendant(Selector),
}

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Name(String),
    Wildcard,
    Index(usize),
    Predicate(Predicate),
}

#[derive(Debug, Clone, PartialEq)]
struct Predicate {
    key: String,
    comparison: Option<(Comparison, Value)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

impl Filter {
    /// Compiles a filter expression.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Filter`] if the expression is malformed.
    pub fn compile(expression: &str) -> Result<Self> {
        let steps = FilterParser::new(expression).parse()?;
        Ok(Self {
            expression: expression.to_string(),
            steps,
        })
    }

    /// Compiles every expression, failing on the first malformed one.
    ///
    /// # Errors
    ///
    /// Returns [`DocsError::Filter`] for the first expression that does not
    /// compile.
    pub fn compile_all<S: AsRef<str>>(expressions: &[S]) -> Result<Vec<Self>> {
        expressions
            .iter()
            .map(|expression| Self::compile(expression.as_ref()))
            .collect()
    }

    /// The source text this filter was compiled from.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Field paths of every node this filter matches in `schema`.
    pub fn excluded_paths(&self, schema: &Value) -> BTreeSet<String> {
        let mut current: Vec<(Vec<Segment>, &Value)> = vec![(Vec::new(), schema)];

        for step in &self.steps {
            let mut next = Vec::new();
            for (location, node) in &current {
                match step {
                    Step::Child(selector) => select(selector, location, *node, &mut next),
                    Step::Descendant(selector) => {
                        let mut visited = Vec::new();
                        descendants(location, *node, &mut visited);
                        for (inner_location, inner_node) in &visited {
                            select(selector, inner_location, *inner_node, &mut next);
                        }
                    }
                }
            }
            current = next;
        }

        current
            .into_iter()
            .map(|(location, _)| field_path(&location))
            .filter(|path| !path.is_empty())
            .collect()
    }
}

/// Union of the paths excluded by every filter.
pub fn excluded_paths(filters: &[Filter], schema: &Value) -> BTreeSet<String> {
    filters
        .iter()
        .flat_map(|filter| filter.excluded_paths(schema))
        .collect()
}

fn select<'s>(
    selector: &Selector,
    location: &[Segment],
    node: &'s Value,
    out: &mut Vec<(Vec<Segment>, &'s Value)>,
) {
    let with = |segment: Segment| {
        let mut extended = location.to_vec();
        extended.push(segment);
        extended
    };

    match (selector, node) {
        (Selector::Name(name), Value::Object(map)) => {
            if let Some(child) = map.get(name) {
                out.push((with(Segment::Key(name.clone())), child));
            }
        }
        (Selector::Index(index), Value::Array(items)) => {
            if let Some(child) = items.get(*index) {
                out.push((with(Segment::Index(*index)), child));
            }
        }
        (Selector::Wildcard, _) => {
            for (segment, child) in children(node) {
                out.push((with(segment), child));
            }
        }
        (Selector::Predicate(predicate), _) => {
            for (segment, child) in children(node) {
                if predicate.matches(child) {
                    out.push((with(segment), child));
                }
            }
        }
        _ => {}
    }
}

fn children(node: &Value) -> Vec<(Segment, &Value)> {
    match node {
        Value::Object(map) => map
            .iter()
            .map(|(key, child)| (Segment::Key(key.clone()), child))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, child)| (Segment::Index(index), child))
            .collect(),
        _ => Vec::new(),
    }
}

fn descendants<'s>(location: &[Segment], node: &'s Value, out: &mut Vec<(Vec<Segment>, &'s Value)>) {
    out.push((location.to_vec(), node));
    for (segment, child) in children(node) {
        let mut extended = location.to_vec();
        extended.push(segment);
        descendants(&extended, child, out);
    }
}

fn field_path(location: &[Segment]) -> String {
    location
        .iter()
        .filter(|segment| !matches!(segment, Segment::Key(key) if key == "properties"))
        .map(|segment| match segment {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

impl Predicate {
    fn matches(&self, node: &Value) -> bool {
        let Some(actual) = node.get(&self.key) else {
            return false;
        };
        match &self.comparison {
            None => true,
            Some((Comparison::Equal, expected)) => literal_eq(actual, expected),
            Some((Comparison::NotEqual, expected)) => !literal_eq(actual, expected),
        }
    }
}

fn literal_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

struct FilterParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> FilterParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.trim().chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Vec<Step>> {
        if !self.eat('$') {
            return Err(self.error("expression must start with `$`"));
        }

        let mut steps = Vec::new();
        while let Some(ch) = self.peek() {
            let step = match ch {
                '.' => {
                    self.pos += 1;
                    if self.eat('.') {
                        Step::Descendant(self.dotted_or_bracket()?)
                    } else {
                        Step::Child(self.dotted()?)
                    }
                }
                '[' => Step::Child(self.bracket()?),
                other => return Err(self.error(format!("unexpected character `{other}`"))),
            };
            steps.push(step);
        }

        Ok(steps)
    }

    fn dotted_or_bracket(&mut self) -> Result<Selector> {
        if self.peek() == Some('[') {
            self.bracket()
        } else {
            self.dotted()
        }
    }

    fn dotted(&mut self) -> Result<Selector> {
        if self.eat('*') {
            return Ok(Selector::Wildcard);
        }
        let name = self.identifier();
        if name.is_empty() {
            return Err(self.error("expected a member name after `.`"));
        }
        Ok(Selector::Name(name))
    }

    fn bracket(&mut self) -> Result<Selector> {
        self.expect('[')?;
        self.skip_whitespace();
        let selector = match self.peek() {
            Some('*') => {
                self.pos += 1;
                Selector::Wildcard
            }
            Some('\'' | '"') => Selector::Name(self.quoted()?),
            Some('?') => {
                self.pos += 1;
                self.expect('(')?;
                let predicate = self.predicate()?;
                self.skip_whitespace();
                self.expect(')')?;
                Selector::Predicate(predicate)
            }
            Some(ch) if ch.is_ascii_digit() => {
                let digits = self.take_while(|c| c.is_ascii_digit());
                let index = digits
                    .parse()
                    .map_err(|_| self.error(format!("invalid index `{digits}`")))?;
                Selector::Index(index)
            }
            Some(other) => return Err(self.error(format!("unexpected `{other}` in brackets"))),
            None => return Err(self.error("unterminated `[`")),
        };
        self.skip_whitespace();
        self.expect(']')?;
        Ok(selector)
    }

    fn predicate(&mut self) -> Result<Predicate> {
        self.skip_whitespace();
        self.expect('@')?;
        self.expect('.')?;
        let key = if matches!(self.peek(), Some('\'' | '"')) {
            self.quoted()?
        } else {
            self.identifier()
        };
        if key.is_empty() {
            return Err(self.error("expected a member name after `@.`"));
        }

        self.skip_whitespace();
        let comparison = if self.starts_with("==") {
            self.pos += 2;
            Some(Comparison::Equal)
        } else if self.starts_with("!=") {
            self.pos += 2;
            Some(Comparison::NotEqual)
        } else {
            None
        };

        let comparison = match comparison {
            Some(op) => {
                self.skip_whitespace();
                Some((op, self.literal()?))
            }
            None => None,
        };

        Ok(Predicate { key, comparison })
    }

    fn literal(&mut self) -> Result<Value> {
        if matches!(self.peek(), Some('\'' | '"')) {
            return Ok(Value::String(self.quoted()?));
        }
        let raw = self.take_while(|c| !c.is_whitespace() && c != ')');
        match raw.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Ok(Value::Null),
            "" => Err(self.error("expected a literal after comparison operator")),
            number => serde_json::from_str::<serde_json::Number>(number)
                .map(Value::Number)
                .map_err(|_| self.error(format!("invalid literal `{number}`"))),
        }
    }

    fn quoted(&mut self) -> Result<String> {
        let Some(quote) = self.peek() else {
            return Err(self.error("expected a quoted string"));
        };
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(escaped) => {
                            out.push(escaped);
                            self.pos += 1;
                        }
                        None => return Err(self.error("unterminated escape")),
                    }
                }
                Some(ch) if ch == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(ch) => {
                    out.push(ch);
                    self.pos += 1;
                }
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn identifier(&mut self) -> String {
        self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '$')
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn starts_with(&self, token: &str) -> bool {
        token
            .chars()
            .enumerate()
            .all(|(offset, ch)| self.chars.get(self.pos + offset) == Some(&ch))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{expected}` at position {}", self.pos)))
        }
    }

    fn error(&self, message: impl Into<String>) -> DocsError {
        DocsError::filter(self.source, message)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema() -> Value {
        json!({
            "description": "Schema for a checkout",
            "properties": {
                "orderId": {"type": "string"},
                "internal": {"type": "string", "description": "internal"},
                "customer": {
                    "type": "object",
                    "properties": {
                        "email": {"type": "string", "pii": true},
                        "tier": {"type": "integer"}
                    }
                }
            }
        })
    }

    #[test]
    fn test_child_path() {
        let filter = Filter::compile("$.properties.internal").unwrap();
        let excluded = filter.excluded_paths(&schema());
        assert_eq!(excluded.into_iter().collect::<Vec<_>>(), vec!["internal"]);
    }

    #[test]
    fn test_bracket_names_and_nesting() {
        let filter = Filter::compile("$['properties']['customer'].properties[\"tier\"]").unwrap();
        assert!(filter.excluded_paths(&schema()).contains("customer.tier"));
    }

    #[test]
    fn test_wildcard_under_object() {
        let filter = Filter::compile("$.properties.customer.properties.*").unwrap();
        let excluded = filter.excluded_paths(&schema());
        assert!(excluded.contains("customer.email"));
        assert!(excluded.contains("customer.tier"));
        assert_eq!(excluded.len(), 2);
    }

    #[test]
    fn test_recursive_descent_with_predicate() {
        let filter = Filter::compile("$..properties[?(@.pii == true)]").unwrap();
        let excluded = filter.excluded_paths(&schema());
        assert_eq!(excluded.into_iter().collect::<Vec<_>>(), vec!["customer.email"]);
    }

    #[test]
    fn test_existence_and_not_equal_predicates() {
        let has_description = Filter::compile("$.properties[?(@.description)]").unwrap();
        assert!(has_description.excluded_paths(&schema()).contains("internal"));

        let not_string = Filter::compile("$..properties[?(@.type != 'string')]").unwrap();
        let excluded = not_string.excluded_paths(&schema());
        assert!(excluded.contains("customer"));
        assert!(excluded.contains("customer.tier"));
        assert!(!excluded.contains("orderId"));
    }

    #[test]
    fn test_recursive_name() {
        let filter = Filter::compile("$..tier").unwrap();
        assert!(filter.excluded_paths(&schema()).contains("customer.tier"));
    }

    #[test]
    fn test_index_selector() {
        let doc = json!({"properties": {"list": {"enum": ["a", "b"]}}});
        let filter = Filter::compile("$.properties.list.enum[1]").unwrap();
        assert!(filter.excluded_paths(&doc).contains("list.enum.1"));
    }

    #[test]
    fn test_missing_member_matches_nothing() {
        let filter = Filter::compile("$.properties.absent").unwrap();
        assert!(filter.excluded_paths(&schema()).is_empty());
    }

    #[test]
    fn test_malformed_expressions() {
        for bad in [
            "",
            "properties.x",
            "$.",
            "$.properties[",
            "$.properties['x",
            "$[?(@.type == )]",
            "$[?(type)]",
            "$ .x",
            "$.a]",
        ] {
            let err = Filter::compile(bad).unwrap_err();
            assert!(
                matches!(err, DocsError::Filter { .. }),
                "expected filter error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_compile_all_stops_at_first_error() {
        let err = Filter::compile_all(&["$.properties.a", "nope", "$["]).unwrap_err();
        match err {
            DocsError::Filter { expression, .. } => assert_eq!(expression, "nope"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_union_of_filters() {
        let filters = Filter::compile_all(&["$.properties.internal", "$..tier"]).unwrap();
        let excluded = excluded_paths(&filters, &schema());
        assert_eq!(excluded.len(), 2);
    }
}
