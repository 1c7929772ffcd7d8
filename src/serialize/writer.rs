//! XML output writer
//!
//! Terminal stage of the serialization pipeline: renders the filtered
//! event stream back to markup. With no filters in front of it the
//! output reproduces the stored document byte for byte (modulo the
//! `<a/>`/`<a></a>` equivalence for childless elements).

use super::events::Event;

/// Escaping writer producing the serialized document
#[derive(Debug, Default)]
pub struct XmlWriter {
    out: String,
}

impl XmlWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one event
    pub fn write(&mut self, event: &Event) {
        match event {
            Event::ElementStart { name, attrs, empty } => {
                self.out.push('<');
                self.out.push_str(name);
                for (attr_name, value) in attrs {
                    self.out.push(' ');
                    self.out.push_str(attr_name);
                    self.out.push_str("=\"");
                    escape_attr(&mut self.out, value);
                    self.out.push('"');
                }
                if *empty {
                    self.out.push_str("/>");
                } else {
                    self.out.push('>');
                }
            }
            Event::Text { text, .. } => {
                escape_text(&mut self.out, text);
            }
            Event::ElementEnd { name } => {
                self.out.push_str("</");
                self.out.push_str(name);
                self.out.push('>');
            }
        }
    }

    /// Take the rendered output
    pub fn finish(self) -> String {
        self.out
    }
}

fn escape_text(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
