//! Generated SQL text and the values bound to it
//!
//! A [`SqlTemplate`] is the cacheable half: it only ever contains
//! `@name` placeholders. A [`ParameterSet`] is the per-call half and is
//! rebuilt on every request.

use serde::Serialize;

use super::errors::SqlGenError;
use super::value::SqlValue;

/// Immutable SQL text made of one or more statements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlTemplate {
    statements: Vec<String>,
    batch: String,
}

impl SqlTemplate {
    pub fn single(sql: impl Into<String>) -> Self {
        Self::batch_of(vec![sql.into()])
    }

    /// Statements meant to run in order, either as one multi-result batch
    /// or one by one.
    pub fn batch_of(statements: Vec<String>) -> Self {
        let batch = statements.join("\n");
        SqlTemplate { statements, batch }
    }

    /// Full text, statements separated by newlines
    pub fn sql(&self) -> &str {
        &self.batch
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn statement(&self, index: usize) -> Option<&str> {
        self.statements.get(index).map(String::as_str)
    }

    /// The COUNT and page statements of a paged template
    pub fn count_and_page(&self) -> Result<(&str, &str), SqlGenError> {
        match self.statements.as_slice() {
            [count, page] => Ok((count, page)),
            other => Err(SqlGenError::StatementCount {
                expected: 2,
                found: other.len(),
            }),
        }
    }

    /// Placeholder names (without `@`) in order of first appearance
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut chars = self.batch.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '@' {
                continue;
            }
            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Ordered placeholder-name to value bindings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterSet {
    entries: Vec<(String, SqlValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to placeholder `name` (given without `@`).
    ///
    /// Rebinding an existing name replaces its value in place.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.add(name, value);
        self
    }

    /// Look a value up by name, with or without the leading `@`
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        let name = name.strip_prefix('@').unwrap_or(name);
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a (String, SqlValue);
    type IntoIter = std::slice::Iter<'a, (String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
