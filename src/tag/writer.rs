//! Emits [`Properties`] in the tag wire form.
//!
//! ```text
//! [|Sequence numProperties="1" name0="count" val0="3"][Operator numProperties="1" name0="id" val0="1"][/Operator]
//! ```
//!
//! Every level but the base is written with a `|` prefix and has no
//! closing tag; nested children go between the base opening tag and its
//! closing tag.

use crate::tag::escape::escape;
use crate::tag::properties::{Properties, PropertyLevel};
use std::fmt::Write;

/// Tag serializer. `compact` writes everything on one line; `pretty` puts
/// every object on its own line and indents children.
#[derive(Debug, Clone, Copy)]
pub struct TagWriter {
    indent: Option<usize>,
}

impl TagWriter {
    pub fn compact() -> Self {
        Self { indent: None }
    }

    pub fn pretty() -> Self {
        Self { indent: Some(2) }
    }

    pub fn write_to_string(&self, props: &Properties) -> String {
        let mut out = String::new();
        self.write(props, &mut out)
            .unwrap_or_else(|_| unreachable!("writing to a String cannot fail"));
        out
    }

    pub fn write(&self, props: &Properties, out: &mut impl Write) -> std::fmt::Result {
        self.write_at(props, 0, out)
    }

    /// Write a sequence of top-level objects.
    pub fn write_all<'a>(
        &self,
        objects: impl IntoIterator<Item = &'a Properties>,
        out: &mut impl Write,
    ) -> std::fmt::Result {
        for props in objects {
            self.write_at(props, 0, out)?;
        }
        Ok(())
    }

    fn write_at(&self, props: &Properties, depth: usize, out: &mut impl Write) -> std::fmt::Result {
        let levels = props.levels();
        if levels.is_empty() {
            return Ok(());
        }
        self.pad(depth, out)?;
        let last = levels.len() - 1;
        for (i, level) in levels.iter().enumerate() {
            write_open(level, i != last, out)?;
        }
        if !props.text().is_empty() {
            out.write_str(&escape(props.text()))?;
        }
        if !props.contents().is_empty() {
            self.newline(out)?;
            for child in props.contents() {
                self.write_at(child, depth + 1, out)?;
            }
            self.pad(depth, out)?;
        }
        write!(out, "[/{}]", props.base_name())?;
        self.newline(out)
    }

    fn pad(&self, depth: usize, out: &mut impl Write) -> std::fmt::Result {
        if let Some(width) = self.indent {
            for _ in 0..depth * width {
                out.write_char(' ')?;
            }
        }
        Ok(())
    }

    fn newline(&self, out: &mut impl Write) -> std::fmt::Result {
        if self.indent.is_some() {
            out.write_char('\n')?;
        }
        Ok(())
    }
}

impl Default for TagWriter {
    fn default() -> Self {
        Self::compact()
    }
}

fn write_open(level: &PropertyLevel, chained: bool, out: &mut impl Write) -> std::fmt::Result {
    out.write_char('[')?;
    if chained {
        out.write_char('|')?;
    }
    write!(out, "{} numProperties=\"{}\"", level.name(), level.len())?;
    for (i, (key, value)) in level.entries().enumerate() {
        write!(
            out,
            " name{i}=\"{}\" val{i}=\"{}\"",
            escape(key),
            escape(value)
        )?;
    }
    out.write_char(']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_tag() {
        let props = Properties::new("Scalar").with("type", "int");
        assert_eq!(
            props.to_tag_string(),
            r#"[Scalar numProperties="1" name0="type" val0="int"][/Scalar]"#
        );
    }

    #[test]
    fn test_chain_and_children() {
        let mut props = Properties::empty();
        props.push_level("Zip");
        props.push_level("Operator").set("id", 2);
        props.add_child(Properties::new("Note"));
        assert_eq!(
            props.to_tag_string(),
            concat!(
                r#"[|Zip numProperties="0"][Operator numProperties="1" name0="id" val0="2"]"#,
                r#"[Note numProperties="0"][/Note][/Operator]"#
            )
        );
    }

    #[test]
    fn test_values_are_escaped() {
        let props = Properties::new("Literal").with("values", r#"a]b"c"#);
        assert!(props.to_tag_string().contains(r#"val0="a\]b\"c""#));
    }

    #[test]
    fn test_pretty_indents_children() {
        let props = Properties::new("Streams").with_child(Properties::new("Edge"));
        let text = TagWriter::pretty().write_to_string(&props);
        assert_eq!(
            text,
            "[Streams numProperties=\"0\"]\n  [Edge numProperties=\"0\"][/Edge]\n[/Streams]\n"
        );
    }
}
