//! Pull-based, resumable tag tokenizer.
//!
//! [`TagParser`] is fed bytes as they arrive and hands back one
//! [`TagEvent`] per call to [`TagParser::next_event`]. When the buffered
//! input runs out in the middle of a tag, the parser remembers exactly where
//! it was inside the tag grammar (name, key, quoted value, escape) and picks
//! up from there after the next [`feed`](TagParser::feed).
//!
//! [`TagReader`] drives a parser from any [`Read`] and adds
//! [`read_full`](TagReader::read_full), which assembles one complete
//! [`Properties`] tree per top-level tag.

use crate::error::{FlowError, Result};
use crate::tag::properties::{Properties, PropertyLevel};
use std::io::Read;

/// A single lexical event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    /// `[Name ...]`, or `[|Name ...]` when `chained` (a non-base
    /// inheritance level that has no closing tag of its own).
    Enter { level: PropertyLevel, chained: bool },
    /// `[/Name]`
    Exit { name: String },
    /// Non-blank text between tags, unescaped.
    Text(String),
}

/// Outcome of one [`TagParser::next_event`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStep {
    Event(TagEvent),
    /// Buffered input is exhausted; feed more or close.
    NeedInput,
    /// Input closed and fully consumed.
    End,
}

/// Position inside the tag grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    TextEscape,
    /// Just read `[`.
    Open,
    Name,
    CloseName,
    /// Between attributes of an opening tag.
    Attrs,
    Key,
    /// Read `key=`, expecting the opening quote.
    Quote,
    Value,
    ValueEscape,
}

/// Resumable tokenizer state.
pub struct TagParser {
    input: Vec<u8>,
    pos: usize,
    closed: bool,
    state: State,
    chained: bool,
    text: Vec<u8>,
    name: Vec<u8>,
    key: Vec<u8>,
    value: Vec<u8>,
    attrs: Vec<(String, String)>,
    /// Bytes consumed so far, for diagnostics.
    offset: u64,
}

impl TagParser {
    pub fn new() -> Self {
        Self {
            input: Vec::new(),
            pos: 0,
            closed: false,
            state: State::Text,
            chained: false,
            text: Vec::new(),
            name: Vec::new(),
            key: Vec::new(),
            value: Vec::new(),
            attrs: Vec::new(),
            offset: 0,
        }
    }

    /// Append more input.
    pub fn feed(&mut self, bytes: &[u8]) {
        debug_assert!(!self.closed, "feed after close");
        self.input.extend_from_slice(bytes);
    }

    /// Mark end of input.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Advance to the next event.
    pub fn next_event(&mut self) -> Result<ParseStep> {
        loop {
            let Some(&byte) = self.input.get(self.pos) else {
                if !self.closed {
                    self.compact();
                    return Ok(ParseStep::NeedInput);
                }
                return self.finish_input();
            };
            self.pos += 1;
            self.offset += 1;

            match self.state {
                State::Text => match byte {
                    b'[' => {
                        self.state = State::Open;
                        if let Some(text) = self.take_text()? {
                            return Ok(ParseStep::Event(TagEvent::Text(text)));
                        }
                    }
                    b'\\' => self.state = State::TextEscape,
                    _ => self.text.push(byte),
                },
                State::TextEscape => {
                    self.text.push(byte);
                    self.state = State::Text;
                }
                State::Open => match byte {
                    b'/' => self.state = State::CloseName,
                    b'|' => {
                        self.chained = true;
                        self.state = State::Name;
                    }
                    b if is_name_byte(b) => {
                        self.chained = false;
                        self.name.push(b);
                        self.state = State::Name;
                    }
                    _ => return Err(self.unexpected(byte, "after '['")),
                },
                State::Name => match byte {
                    b if is_name_byte(b) => self.name.push(b),
                    b']' => return self.finish_open(),
                    b if b.is_ascii_whitespace() => self.state = State::Attrs,
                    _ => return Err(self.unexpected(byte, "in tag name")),
                },
                State::CloseName => match byte {
                    b if is_name_byte(b) => self.name.push(b),
                    b']' => return self.finish_close(),
                    _ => return Err(self.unexpected(byte, "in closing tag")),
                },
                State::Attrs => match byte {
                    b if b.is_ascii_whitespace() => {}
                    b']' => return self.finish_open(),
                    b if is_name_byte(b) => {
                        self.key.push(b);
                        self.state = State::Key;
                    }
                    _ => return Err(self.unexpected(byte, "between properties")),
                },
                State::Key => match byte {
                    b if is_name_byte(b) => self.key.push(b),
                    b'=' => self.state = State::Quote,
                    _ => return Err(self.unexpected(byte, "in property key")),
                },
                State::Quote => match byte {
                    b'"' => self.state = State::Value,
                    _ => return Err(self.unexpected(byte, "before property value")),
                },
                State::Value => match byte {
                    b'\\' => self.state = State::ValueEscape,
                    b'"' => {
                        let key = self.take_utf8(KeyOrValue::Key)?;
                        let value = self.take_utf8(KeyOrValue::Value)?;
                        self.attrs.push((key, value));
                        self.state = State::Attrs;
                    }
                    _ => self.value.push(byte),
                },
                State::ValueEscape => {
                    self.value.push(byte);
                    self.state = State::Value;
                }
            }
        }
    }

    fn finish_input(&mut self) -> Result<ParseStep> {
        match self.state {
            State::Text => match self.take_text()? {
                Some(text) => Ok(ParseStep::Event(TagEvent::Text(text))),
                None => Ok(ParseStep::End),
            },
            _ => Err(FlowError::UnexpectedEof),
        }
    }

    fn finish_open(&mut self) -> Result<ParseStep> {
        if self.name.is_empty() {
            return Err(self.malformed("empty tag name"));
        }
        let name = String::from_utf8(std::mem::take(&mut self.name))
            .map_err(|_| self.malformed("tag name is not UTF-8"))?;
        let attrs = std::mem::take(&mut self.attrs);
        let entries = collect_entries(&name, attrs)?;
        let chained = std::mem::replace(&mut self.chained, false);
        self.state = State::Text;
        tracing::trace!("Tag enter [{}{}]", if chained { "|" } else { "" }, name);
        Ok(ParseStep::Event(TagEvent::Enter {
            level: PropertyLevel::from_parts(name, entries),
            chained,
        }))
    }

    fn finish_close(&mut self) -> Result<ParseStep> {
        if self.name.is_empty() {
            return Err(self.malformed("empty closing tag name"));
        }
        let name = String::from_utf8(std::mem::take(&mut self.name))
            .map_err(|_| self.malformed("tag name is not UTF-8"))?;
        self.state = State::Text;
        Ok(ParseStep::Event(TagEvent::Exit { name }))
    }

    /// Take pending text; blank text is dropped.
    fn take_text(&mut self) -> Result<Option<String>> {
        if self.text.is_empty() {
            return Ok(None);
        }
        let bytes = std::mem::take(&mut self.text);
        let text = String::from_utf8(bytes).map_err(|_| self.malformed("text is not UTF-8"))?;
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn take_utf8(&mut self, which: KeyOrValue) -> Result<String> {
        let bytes = match which {
            KeyOrValue::Key => std::mem::take(&mut self.key),
            KeyOrValue::Value => std::mem::take(&mut self.value),
        };
        String::from_utf8(bytes).map_err(|_| self.malformed("property is not UTF-8"))
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.input.drain(..self.pos);
            self.pos = 0;
        }
    }

    fn unexpected(&self, byte: u8, place: &str) -> FlowError {
        self.malformed(&format!("unexpected {:?} {}", byte as char, place))
    }

    fn malformed(&self, what: &str) -> FlowError {
        FlowError::MalformedTag(format!("{} at byte {}", what, self.offset))
    }
}

impl Default for TagParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum KeyOrValue {
    Key,
    Value,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':')
}

/// Check `numProperties="N"` followed by exactly N `nameI`/`valI` pairs.
fn collect_entries(tag: &str, attrs: Vec<(String, String)>) -> Result<Vec<(String, String)>> {
    let mut iter = attrs.into_iter();
    let Some((first_key, first_value)) = iter.next() else {
        return Ok(Vec::new());
    };
    if first_key != "numProperties" {
        return Err(FlowError::MalformedTag(format!(
            "[{}] must start with numProperties, found '{}'",
            tag, first_key
        )));
    }
    let count: usize = first_value.parse().map_err(|_| {
        FlowError::MalformedTag(format!(
            "[{}] has non-numeric numProperties '{}'",
            tag, first_value
        ))
    })?;

    let rest: Vec<(String, String)> = iter.collect();
    if rest.len() != count * 2 {
        return Err(FlowError::MalformedTag(format!(
            "[{}] declares {} properties but carries {} attributes",
            tag,
            count,
            rest.len()
        )));
    }

    let mut entries = Vec::with_capacity(count);
    let mut pairs = rest.into_iter();
    for i in 0..count {
        let (Some((name_attr, key)), Some((val_attr, value))) = (pairs.next(), pairs.next()) else {
            unreachable!("attribute count was checked above");
        };
        if name_attr != format!("name{i}") || val_attr != format!("val{i}") {
            return Err(FlowError::MalformedTag(format!(
                "[{}] property {} is out of order ('{}', '{}')",
                tag, i, name_attr, val_attr
            )));
        }
        entries.push((key, value));
    }
    Ok(entries)
}

/// Blocking driver that pulls chunks from a reader into a [`TagParser`].
pub struct TagReader<R: Read> {
    reader: R,
    parser: TagParser,
    chunk: Vec<u8>,
}

impl<R: Read> TagReader<R> {
    const CHUNK_SIZE: usize = 8 * 1024;

    pub fn new(reader: R) -> Self {
        Self {
            reader,
            parser: TagParser::new(),
            chunk: vec![0; Self::CHUNK_SIZE],
        }
    }

    /// Next event, or `None` at end of input.
    pub fn read_event(&mut self) -> Result<Option<TagEvent>> {
        loop {
            match self.parser.next_event()? {
                ParseStep::Event(event) => return Ok(Some(event)),
                ParseStep::End => return Ok(None),
                ParseStep::NeedInput => {
                    let n = self.reader.read(&mut self.chunk)?;
                    if n == 0 {
                        self.parser.close();
                    } else {
                        self.parser.feed(&self.chunk[..n]);
                    }
                }
            }
        }
    }

    /// Read one complete top-level object, or `None` at end of input.
    pub fn read_full(&mut self) -> Result<Option<Properties>> {
        loop {
            match self.read_event()? {
                None => return Ok(None),
                Some(TagEvent::Text(text)) => {
                    tracing::debug!("Ignoring top-level text {:?}", text);
                }
                Some(TagEvent::Exit { name }) => {
                    return Err(FlowError::MalformedTag(format!(
                        "closing tag [/{}] without an opening tag",
                        name
                    )));
                }
                Some(TagEvent::Enter { level, chained }) => {
                    return self.read_body(level, chained).map(Some);
                }
            }
        }
    }

    /// Read every top-level object until end of input.
    pub fn read_all(&mut self) -> Result<Vec<Properties>> {
        let mut objects = Vec::new();
        while let Some(props) = self.read_full()? {
            objects.push(props);
        }
        Ok(objects)
    }

    fn read_body(&mut self, level: PropertyLevel, chained: bool) -> Result<Properties> {
        let mut props = Properties::empty();
        props.push_parsed_level(level);

        let mut more = chained;
        while more {
            match self.read_event()? {
                Some(TagEvent::Enter { level, chained }) => {
                    props.push_parsed_level(level);
                    more = chained;
                }
                Some(other) => {
                    return Err(FlowError::MalformedTag(format!(
                        "inheritance chain of [{}] interrupted by {:?}",
                        props.name(),
                        other
                    )));
                }
                None => return Err(FlowError::UnexpectedEof),
            }
        }

        loop {
            match self.read_event()? {
                None => return Err(FlowError::UnexpectedEof),
                Some(TagEvent::Text(text)) => props.push_text(&text),
                Some(TagEvent::Exit { name }) => {
                    if name == props.base_name() {
                        return Ok(props);
                    }
                    return Err(FlowError::MalformedTag(format!(
                        "[{}] closed by [/{}]",
                        props.base_name(),
                        name
                    )));
                }
                Some(TagEvent::Enter { level, chained }) => {
                    let child = self.read_body(level, chained)?;
                    props.add_child(child);
                }
            }
        }
    }
}

/// Parse every top-level object in `text`.
pub fn parse_str(text: &str) -> Result<Vec<Properties>> {
    TagReader::new(text.as_bytes()).read_all()
}
