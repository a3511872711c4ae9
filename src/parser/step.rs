//! ISO 10303-21 ("STEP physical file") reader.
//!
//! Only what the IFC queries need: the header schema and the instances of
//! the `DATA` section. Instances may span several lines; statements are
//! split on `;` outside string literals.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    String(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Enum(String),
    Reference(u64),
    List(Vec<StepValue>),
    Null,
    Derived,
}

#[derive(Debug, Clone)]
pub struct StepEntity {
    pub id: u64,
    /// Upper-case entity name, e.g. `IFCWALL`.
    pub entity_type: String,
    pub values: Vec<StepValue>,
}

impl StepEntity {
    #[must_use]
    pub fn string_at(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(StepValue::String(s)) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn reference_at(&self, index: usize) -> Option<u64> {
        match self.values.get(index) {
            Some(StepValue::Reference(id)) => Some(*id),
            _ => None,
        }
    }

    /// References inside a list attribute; non-reference items are dropped.
    #[must_use]
    pub fn references_at(&self, index: usize) -> Vec<u64> {
        match self.values.get(index) {
            Some(StepValue::List(items)) => items
                .iter()
                .filter_map(|item| match item {
                    StepValue::Reference(id) => Some(*id),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct StepFile {
    pub entities: HashMap<u64, StepEntity>,
    pub schema: String,
    /// Instances that could not be read (complex instances, syntax errors).
    pub skipped: usize,
    by_type: HashMap<String, Vec<u64>>,
}

impl StepFile {
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut file = StepFile::default();
        let mut in_data = false;
        let mut saw_data = false;

        for statement in split_statements(content) {
            let statement = statement.trim();

            if statement.starts_with("FILE_SCHEMA") {
                file.schema = parse_schema(statement).unwrap_or_default();
            } else if statement == "DATA" {
                in_data = true;
                saw_data = true;
            } else if statement == "ENDSEC" {
                in_data = false;
            } else if in_data && statement.starts_with('#') {
                match parse_instance(statement) {
                    Ok(Some(entity)) => file.insert(entity),
                    Ok(None) => file.skipped += 1,
                    Err(message) => {
                        debug!(%message, "unreadable STEP instance");
                        file.skipped += 1;
                    }
                }
            }
        }

        if !saw_data {
            return Err(ParseError::InvalidStep {
                message: "no DATA section".to_string(),
            });
        }
        if file.skipped > 0 {
            warn!(skipped = file.skipped, "some STEP instances were not read");
        }

        Ok(file)
    }

    fn insert(&mut self, entity: StepEntity) {
        self.by_type
            .entry(entity.entity_type.clone())
            .or_default()
            .push(entity.id);
        self.entities.insert(entity.id, entity);
    }

    #[must_use]
    pub fn get_entity(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    /// Instances of exactly `entity_type` (case-insensitive), in file order.
    pub fn entities_of_type<'a>(
        &'a self,
        entity_type: &str,
    ) -> impl Iterator<Item = &'a StepEntity> + 'a {
        let mut ids = self
            .by_type
            .get(&entity_type.to_ascii_uppercase())
            .cloned()
            .unwrap_or_default();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.entities.get(&id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Splits on `;` outside `'...'` literals, dropping `/* */` comments.
fn split_statements(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'*') => {
                // Comments only appear between statements in practice; keep the
                // text before it and resume after the terminator.
                let end = content[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |p| i + 2 + p + 2);
                if content[start..i].trim().is_empty() {
                    start = end;
                }
                i = end;
                continue;
            }
            b';' if !in_string => {
                statements.push(&content[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    statements
}

fn parse_schema(statement: &str) -> Option<String> {
    let start = statement.find('\'')? + 1;
    let len = statement[start..].find('\'')?;
    Some(statement[start..start + len].to_string())
}

/// `#12 = IFCWALL(...)`. `Ok(None)` for complex instances `#12 = (A()B())`.
fn parse_instance(statement: &str) -> Result<Option<StepEntity>, String> {
    let (lhs, rhs) = statement
        .split_once('=')
        .ok_or_else(|| format!("missing '=' in {statement:.40}"))?;
    let id: u64 = lhs
        .trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("bad instance id {lhs:.20}"))?;

    let rhs = rhs.trim();
    if rhs.starts_with('(') {
        debug!(id, "complex instance skipped");
        return Ok(None);
    }

    let paren = rhs
        .find('(')
        .ok_or_else(|| format!("#{id}: missing attribute list"))?;
    let entity_type = rhs[..paren].trim().to_ascii_uppercase();

    let mut parser = ValueParser::new(&rhs[paren..]);
    let values = match parser.value()? {
        StepValue::List(values) => values,
        other => vec![other],
    };

    Ok(Some(StepEntity {
        id,
        entity_type,
        values,
    }))
}

struct ValueParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> ValueParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn value(&mut self) -> Result<StepValue, String> {
        self.skip_ws();
        let Some(b) = self.peek() else {
            return Err("unexpected end of attributes".to_string());
        };

        match b {
            b'$' => {
                self.pos += 1;
                Ok(StepValue::Null)
            }
            b'*' => {
                self.pos += 1;
                Ok(StepValue::Derived)
            }
            b'#' => {
                self.pos += 1;
                let digits = self.take_while(|b| b.is_ascii_digit());
                digits
                    .parse()
                    .map(StepValue::Reference)
                    .map_err(|_| format!("bad reference at {}", self.pos))
            }
            b'\'' => self.string(),
            b'"' => {
                self.pos += 1;
                let hex = self.take_while(|b| b != b'"');
                self.pos += 1;
                Ok(StepValue::String(hex.to_string()))
            }
            b'.' => {
                self.pos += 1;
                let name = self.take_while(|b| b != b'.');
                self.pos += 1;
                Ok(match name {
                    "T" => StepValue::Boolean(true),
                    "F" => StepValue::Boolean(false),
                    other => StepValue::Enum(other.to_string()),
                })
            }
            b'(' => self.list(),
            b'-' | b'+' | b'0'..=b'9' => self.number(),
            b if b.is_ascii_alphabetic() => {
                // Typed value such as IFCLABEL('x') or IFCBOOLEAN(.T.): keep the inner value.
                self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                self.skip_ws();
                if self.peek() != Some(b'(') {
                    return Err(format!("bare keyword at {}", self.pos));
                }
                self.pos += 1;
                let inner = self.value()?;
                self.skip_ws();
                if self.peek() == Some(b')') {
                    self.pos += 1;
                }
                Ok(inner)
            }
            other => Err(format!("unexpected '{}' at {}", other as char, self.pos)),
        }
    }

    fn list(&mut self) -> Result<StepValue, String> {
        self.pos += 1; // '('
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(StepValue::List(items));
                }
                Some(b',') => self.pos += 1,
                Some(_) => items.push(self.value()?),
                None => return Err("unterminated list".to_string()),
            }
        }
    }

    fn string(&mut self) -> Result<StepValue, String> {
        self.pos += 1; // opening quote
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b'\'') if self.src.as_bytes().get(self.pos + 1) == Some(&b'\'') => {
                    self.pos += 2;
                }
                Some(b'\'') => break,
                Some(_) => self.pos += 1,
                None => return Err("unterminated string".to_string()),
            }
        }
        let raw = &self.src[start..self.pos];
        self.pos += 1;
        Ok(StepValue::String(decode_step_string(raw)))
    }

    fn number(&mut self) -> Result<StepValue, String> {
        let token = self.take_while(|b| {
            b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'E' | b'e')
        });
        if let Ok(i) = token.parse::<i64>() {
            return Ok(StepValue::Integer(i));
        }
        // STEP allows a trailing dot ("0." or "1.E-5").
        token
            .replace(".E", ".0E")
            .trim_end_matches('.')
            .parse::<f64>()
            .map(StepValue::Real)
            .map_err(|_| format!("bad number '{token}'"))
    }
}

/// Decodes STEP string escapes:
/// `\X2\XXXX..\X0\` (UTF-16 code units), `\X\hh` (ISO 8859-1),
/// `\S\c` (high-bit shift), `\\` and `''`.
fn decode_step_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find(['\\', '\'']) {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(t) = tail.strip_prefix("''") {
            result.push('\'');
            rest = t;
        } else if let Some(t) = tail.strip_prefix("\\X2\\") {
            let end = t.find("\\X0\\").unwrap_or(t.len());
            let units: Vec<u16> = t[..end]
                .as_bytes()
                .chunks(4)
                .filter_map(|c| std::str::from_utf8(c).ok())
                .filter_map(|c| u16::from_str_radix(c, 16).ok())
                .collect();
            result.extend(char::decode_utf16(units).filter_map(Result::ok));
            rest = t.get(end + 4..).unwrap_or("");
        } else if let Some(t) = tail.strip_prefix("\\X\\") {
            let code = t.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok());
            match code {
                Some(code) => {
                    result.push(char::from(code));
                    rest = &t[2..];
                }
                None => {
                    result.push_str("\\X\\");
                    rest = t;
                }
            }
        } else if let Some(t) = tail.strip_prefix("\\S\\") {
            let mut chars = t.chars();
            if let Some(c) = chars.next() {
                result.push(char::from((c as u8).wrapping_add(128)));
            }
            rest = chars.as_str();
        } else if let Some(t) = tail.strip_prefix("\\\\") {
            result.push('\\');
            rest = t;
        } else {
            result.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }

    result.push_str(rest);
    result
}
