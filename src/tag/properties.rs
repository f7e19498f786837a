//! In-memory tree form of the tag format.
//!
//! A [`Properties`] value holds one [`PropertyLevel`] per inheritance level,
//! most-derived first, plus the nested child objects that appeared inside
//! the tag span. Constructors walk the levels with a [`PropertiesCursor`]:
//! each level reads its own keys, then hands `next_level()` to its base.

use crate::error::{FlowError, Result};
use crate::tag::writer::TagWriter;
use std::str::FromStr;

/// One inheritance level: a type name and its ordered key/value pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyLevel {
    name: String,
    entries: Vec<(String, String)>,
}

impl PropertyLevel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn from_parts(name: String, entries: Vec<(String, String)>) -> Self {
        Self { name, entries }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A fully-read tag object: inheritance levels plus nested children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Properties {
    levels: Vec<PropertyLevel>,
    contents: Vec<Properties>,
    text: String,
}

impl Properties {
    /// Single-level object named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            levels: vec![PropertyLevel::new(name)],
            contents: Vec::new(),
            text: String::new(),
        }
    }

    /// Object with no levels yet; used when a type chain describes itself
    /// level by level.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a more-base level and return it for filling.
    pub fn push_level(&mut self, name: impl Into<String>) -> &mut PropertyLevel {
        let index = self.levels.len();
        self.levels.push(PropertyLevel::new(name));
        &mut self.levels[index]
    }

    pub(crate) fn push_parsed_level(&mut self, level: PropertyLevel) {
        self.levels.push(level);
    }

    /// Set a key on the most recently pushed level.
    ///
    /// # Panics
    ///
    /// Panics if the object has no level yet.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.levels
            .last_mut()
            .expect("Properties::set called before any level was pushed")
            .set(key, value);
        self
    }

    /// Builder form of [`Properties::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_child(mut self, child: Properties) -> Self {
        self.contents.push(child);
        self
    }

    pub fn add_child(&mut self, child: Properties) {
        self.contents.push(child);
    }

    pub fn levels(&self) -> &[PropertyLevel] {
        &self.levels
    }

    /// Name of the most-derived level, or `""` for an empty object.
    pub fn name(&self) -> &str {
        self.levels.first().map(|l| l.name()).unwrap_or("")
    }

    /// Name of the base level; this is the name of the closing tag.
    pub fn base_name(&self) -> &str {
        self.levels.last().map(|l| l.name()).unwrap_or("")
    }

    pub fn contents(&self) -> &[Properties] {
        &self.contents
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Cursor positioned at the most-derived level.
    pub fn cursor(&self) -> PropertiesCursor<'_> {
        PropertiesCursor {
            props: self,
            level: 0,
        }
    }

    /// Compact wire form.
    pub fn to_tag_string(&self) -> String {
        TagWriter::compact().write_to_string(self)
    }
}

/// Read position inside a [`Properties`] inheritance chain.
#[derive(Debug, Clone, Copy)]
pub struct PropertiesCursor<'a> {
    props: &'a Properties,
    level: usize,
}

impl<'a> PropertiesCursor<'a> {
    fn current(&self) -> Option<&'a PropertyLevel> {
        self.props.levels.get(self.level)
    }

    /// Type name at the current level.
    pub fn name(&self) -> &'a str {
        self.current().map(|l| l.name()).unwrap_or("")
    }

    pub fn level_index(&self) -> usize {
        self.level
    }

    pub fn is_base(&self) -> bool {
        self.level + 1 >= self.props.levels.len()
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.current().and_then(|l| l.get(key))
    }

    /// Like [`get`](Self::get) but a missing key is an error.
    pub fn require(&self, key: &str) -> Result<&'a str> {
        self.get(key).ok_or_else(|| FlowError::MissingProperty {
            tag: self.name().to_string(),
            key: key.to_string(),
        })
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.parse(key)
    }

    pub fn get_float(&self, key: &str) -> Result<f64> {
        self.parse(key)
    }

    /// Parse a required key with [`FromStr`].
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.require(key)?;
        raw.trim().parse().map_err(|_| FlowError::InvalidProperty {
            key: key.to_string(),
            value: raw.to_string(),
        })
    }

    /// Cursor for the next (more base) level, if any.
    pub fn next_level(&self) -> Option<PropertiesCursor<'a>> {
        if self.is_base() {
            None
        } else {
            Some(PropertiesCursor {
                props: self.props,
                level: self.level + 1,
            })
        }
    }

    /// Like [`next_level`](Self::next_level) but the base level must exist.
    pub fn expect_level(&self, name: &str) -> Result<PropertiesCursor<'a>> {
        match self.next_level() {
            Some(next) if next.name() == name => Ok(next),
            Some(next) => Err(FlowError::MalformedTag(format!(
                "expected inheritance level [{}] after [{}], found [{}]",
                name,
                self.name(),
                next.name()
            ))),
            None => Err(FlowError::MalformedTag(format!(
                "[{}] is missing its [{}] base level",
                self.name(),
                name
            ))),
        }
    }

    /// Nested child objects.
    pub fn contents(&self) -> &'a [Properties] {
        &self.props.contents
    }

    pub fn properties(&self) -> &'a Properties {
        self.props
    }
}
