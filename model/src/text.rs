//! Free-form text content (ST and IL bodies, documentation, comments).
//!
//! The content of these elements is usually XHTML and is kept exactly as it
//! appeared in the source document. Nothing in this crate interprets it.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Opaque markup held byte-for-byte.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormattedText {
    markup: String,
}

impl FormattedText {
    /// Creates text from markup that is already escaped, for example the
    /// inner content of an XML element.
    pub fn from_markup(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    /// Creates text from plain characters, escaping XML special characters.
    pub fn from_text(text: &str) -> Self {
        Self {
            markup: escape(text).into_owned(),
        }
    }

    /// Creates an XHTML paragraph holding the plain characters. This is the
    /// shape most tools use for ST and IL bodies.
    pub fn paragraph(text: &str) -> Self {
        Self {
            markup: format!("<xhtml:p>{}</xhtml:p>", escape(text)),
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn is_empty(&self) -> bool {
        self.markup.is_empty()
    }

    /// Returns the character content with elements removed and entities
    /// resolved.
    pub fn text(&self) -> Result<String, Error> {
        let mut reader = Reader::from_str(&self.markup);
        let mut text = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Text(e)) => {
                    let chunk = e
                        .unescape()
                        .map_err(|e| Error::malformed("text", e.to_string()))?;
                    text.push_str(&chunk);
                }
                Ok(Event::CData(e)) => {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::malformed(
                        "text",
                        format!("at position {}: {}", reader.error_position(), e),
                    ))
                }
            }
        }

        Ok(text)
    }
}

impl From<&str> for FormattedText {
    fn from(text: &str) -> Self {
        FormattedText::from_text(text)
    }
}
