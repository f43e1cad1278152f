//! Structural parser for the argument object syntax typed at the prompt.
//!
//! Players type JavaScript-style objects such as `{host: "mainframe"}`, so
//! besides strict JSON this accepts unquoted identifier keys and single-quoted
//! strings. The result is a plain [`serde_json::Value`] ready for binding.

use serde_json::{Map, Number, Value};

/// Deepest nesting of objects and arrays accepted, matching `serde_json`.
pub(crate) const MAX_DEPTH: usize = 128;

/// Why the structural parse failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SyntaxErrorKind {
    UnterminatedString,
    InvalidPropertyName(char),
    InvalidValue(char),
    MissingColon,
    MissingDelimiter,
    TrailingContent,
    UnexpectedEnd,
    TooDeep,
}

impl SyntaxErrorKind {
    pub(crate) fn message(&self) -> String {
        match self {
            Self::UnterminatedString => "Unterminated string".to_owned(),
            Self::InvalidPropertyName(ch) => format!("Invalid character in property name: '{ch}'"),
            Self::InvalidValue(ch) => format!("Invalid character in value: '{ch}'"),
            Self::MissingColon => "Expected ':' after property name".to_owned(),
            Self::MissingDelimiter => "Expected ',' or closing bracket".to_owned(),
            Self::TrailingContent => "Unexpected content after closing }".to_owned(),
            Self::UnexpectedEnd => "Unexpected end of input".to_owned(),
            Self::TooDeep => format!("Nesting deeper than {MAX_DEPTH} levels"),
        }
    }
}

/// A failed parse and the character index it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub(crate) kind: SyntaxErrorKind,
    pub(crate) column: usize,
}

/// Parses `input` as a single value followed only by whitespace.
pub(crate) fn parse(input: &str) -> Result<Value, SyntaxError> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        position: 0,
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    if parser.position < parser.chars.len() {
        return Err(parser.error(SyntaxErrorKind::TrailingContent));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    position: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError {
            kind,
            column: self.position,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn value(&mut self) -> Result<Value, SyntaxError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error(SyntaxErrorKind::UnexpectedEnd)),
            Some('{') => self.nested(Self::object),
            Some('[') => self.nested(Self::array),
            Some(quote @ ('"' | '\'')) => self.string(quote).map(Value::String),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.number(),
            Some(ch) if is_identifier_start(ch) => self.literal(),
            Some(ch) => Err(self.error(SyntaxErrorKind::InvalidValue(ch))),
        }
    }

    /// Runs `container` one level deeper, refusing to recurse past [`MAX_DEPTH`].
    fn nested(
        &mut self,
        container: fn(&mut Self) -> Result<Value, SyntaxError>,
    ) -> Result<Value, SyntaxError> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(SyntaxErrorKind::TooDeep));
        }
        self.depth += 1;
        let parsed = container(self);
        self.depth -= 1;
        parsed
    }

    fn object(&mut self) -> Result<Value, SyntaxError> {
        self.position += 1;
        let mut map = Map::new();
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.position += 1;
            return Ok(Value::Object(map));
        }

        loop {
            self.skip_whitespace();
            let key = self.property_name()?;
            self.skip_whitespace();
            match self.peek() {
                Some(':') => self.position += 1,
                None => return Err(self.error(SyntaxErrorKind::UnexpectedEnd)),
                Some(_) => return Err(self.error(SyntaxErrorKind::MissingColon)),
            }
            let value = self.value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.position += 1,
                Some('}') => {
                    self.position += 1;
                    return Ok(Value::Object(map));
                }
                None => return Err(self.error(SyntaxErrorKind::UnexpectedEnd)),
                Some(_) => return Err(self.error(SyntaxErrorKind::MissingDelimiter)),
            }
        }
    }

    fn array(&mut self) -> Result<Value, SyntaxError> {
        self.position += 1;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.position += 1;
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.position += 1,
                Some(']') => {
                    self.position += 1;
                    return Ok(Value::Array(items));
                }
                None => return Err(self.error(SyntaxErrorKind::UnexpectedEnd)),
                Some(_) => return Err(self.error(SyntaxErrorKind::MissingDelimiter)),
            }
        }
    }

    fn property_name(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.string(quote),
            Some(ch) if is_identifier_start(ch) => Ok(self.identifier()),
            Some(ch) => Err(self.error(SyntaxErrorKind::InvalidPropertyName(ch))),
            None => Err(self.error(SyntaxErrorKind::UnexpectedEnd)),
        }
    }

    fn identifier(&mut self) -> String {
        let start = self.position;
        while self.peek().is_some_and(is_identifier_part) {
            self.position += 1;
        }
        self.chars
            .get(start..self.position)
            .unwrap_or_default()
            .iter()
            .collect()
    }

    fn string(&mut self, quote: char) -> Result<String, SyntaxError> {
        let opening = self.position;
        self.position += 1;
        let mut text = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(SyntaxError {
                    kind: SyntaxErrorKind::UnterminatedString,
                    column: opening,
                });
            };
            self.position += 1;
            match ch {
                c if c == quote => return Ok(text),
                '\\' => text.push(self.escape(opening)?),
                c => text.push(c),
            }
        }
    }

    fn escape(&mut self, opening: usize) -> Result<char, SyntaxError> {
        let Some(ch) = self.peek() else {
            return Err(SyntaxError {
                kind: SyntaxErrorKind::UnterminatedString,
                column: opening,
            });
        };
        let escaped = match ch {
            '"' | '\'' | '\\' | '/' => ch,
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => return self.unicode_escape(),
            other => return Err(self.error(SyntaxErrorKind::InvalidValue(other))),
        };
        self.position += 1;
        Ok(escaped)
    }

    fn unicode_escape(&mut self) -> Result<char, SyntaxError> {
        let start = self.position;
        self.position += 1;
        let mut code = 0_u32;
        for _ in 0..4 {
            let Some(ch) = self.peek() else {
                return Err(self.error(SyntaxErrorKind::UnexpectedEnd));
            };
            let Some(digit) = ch.to_digit(16) else {
                return Err(self.error(SyntaxErrorKind::InvalidValue(ch)));
            };
            code = code * 16 + digit;
            self.position += 1;
        }
        char::from_u32(code).ok_or(SyntaxError {
            kind: SyntaxErrorKind::InvalidValue('u'),
            column: start,
        })
    }

    fn number(&mut self) -> Result<Value, SyntaxError> {
        let start = self.position;
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.position += 1;
        }
        let text: String = self
            .chars
            .get(start..self.position)
            .unwrap_or_default()
            .iter()
            .collect();
        let number = text
            .parse::<i64>()
            .map(Number::from)
            .ok()
            .or_else(|| text.parse::<u64>().map(Number::from).ok())
            .or_else(|| text.parse::<f64>().ok().and_then(Number::from_f64));
        number
            .map(Value::Number)
            .ok_or_else(|| self.invalid_value_at(start))
    }

    fn literal(&mut self) -> Result<Value, SyntaxError> {
        let start = self.position;
        let word = self.identifier();
        match word.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Ok(Value::Null),
            _ => Err(self.invalid_value_at(start)),
        }
    }

    fn invalid_value_at(&self, column: usize) -> SyntaxError {
        let found = self.chars.get(column).copied().unwrap_or_default();
        SyntaxError {
            kind: SyntaxErrorKind::InvalidValue(found),
            column,
        }
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(r#"{"host": "mainframe"}"#, json!({"host": "mainframe"}))]
    #[case(r#"{host: 'mainframe', user: "root"}"#, json!({"host": "mainframe", "user": "root"}))]
    #[case("{id: 0}", json!({"id": 0}))]
    #[case("{id: -3, ratio: 1.5, ok: true, none: null}", json!({"id": -3, "ratio": 1.5, "ok": true, "none": null}))]
    #[case(r#"{tags: ["a", 'b'], nested: {deep: {}}}"#, json!({"tags": ["a", "b"], "nested": {"deep": {}}}))]
    #[case(r#"{text: "line\nbreak A"}"#, json!({"text": "line\nbreak A"}))]
    fn accepts_relaxed_objects(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(parse(input).expect("parse"), expected);
    }

    #[rstest]
    #[case(r#"{host: "x}"#, SyntaxErrorKind::UnterminatedString, 7)]
    #[case(r#"{-host: "x"}"#, SyntaxErrorKind::InvalidPropertyName('-'), 1)]
    #[case("{host: x}", SyntaxErrorKind::InvalidValue('x'), 7)]
    #[case(r#"{host "x"}"#, SyntaxErrorKind::MissingColon, 6)]
    #[case(r#"{host: "x" user: "y"}"#, SyntaxErrorKind::MissingDelimiter, 11)]
    #[case(r#"{host: "x"} }"#, SyntaxErrorKind::TrailingContent, 12)]
    #[case("{host:", SyntaxErrorKind::UnexpectedEnd, 6)]
    fn reports_error_columns(
        #[case] input: &str,
        #[case] kind: SyntaxErrorKind,
        #[case] column: usize,
    ) {
        assert_eq!(parse(input), Err(SyntaxError { kind, column }));
    }

    fn nested_arrays(levels: usize) -> String {
        format!("{{a:{}1{}}}", "[".repeat(levels), "]".repeat(levels))
    }

    #[test]
    fn nesting_up_to_the_limit_is_accepted() {
        let value = parse(&nested_arrays(MAX_DEPTH - 1)).expect("within the limit");

        let mut inner = &value["a"];
        for _ in 0..MAX_DEPTH - 1 {
            inner = &inner[0];
        }
        assert_eq!(inner, &Value::from(1));
    }

    #[rstest]
    #[case::just_past_the_limit(nested_arrays(MAX_DEPTH))]
    #[case::line_sized_arrays(nested_arrays(30_000))]
    #[case::line_sized_objects(format!("{}1{}", "{a:".repeat(15_000), "}".repeat(15_000)))]
    fn deep_nesting_is_rejected_at_the_limit(#[case] input: String) {
        let error = parse(&input).expect_err("too deep");

        assert_eq!(error.kind, SyntaxErrorKind::TooDeep);
        let opening = input.chars().nth(error.column).expect("column inside input");
        assert!(matches!(opening, '{' | '['));
    }
}
