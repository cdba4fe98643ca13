//! XML wire format for PLCopen TC6 documents.
//!
//! [`from_str`] reads a document with `roxmltree` and [`to_string`] writes
//! one with the `quick-xml` event writer. Both validate the document, so an
//! invalid model is never read or written.
//!
//! ```rust
//! use plcopen_model::*;
//!
//! let mut project = Project::new(
//!     FileHeader::new("Acme", "Line Control", "1.0"),
//!     ContentHeader::new("Plant"),
//! );
//! let mut pou = Pou::new("Main", PouType::Program);
//! pou.body = Some(Body::st("x := 1;"));
//! project.types_mut().pous.push(pou);
//!
//! let xml = plcopen_xml::to_string(&project).unwrap();
//! assert_eq!(plcopen_xml::from_str(&xml).unwrap(), project);
//! ```

mod decode;
mod encode;

pub use decode::from_str;
pub use encode::{to_string, to_string_with_options, XmlOptions};

/// The namespace written on the root element.
pub const TC6_NAMESPACE: &str = "http://www.plcopen.org/xml/tc6.xsd";

/// Root namespaces accepted when reading.
pub const ACCEPTED_NAMESPACES: &[&str] = &[TC6_NAMESPACE, "http://www.plcopen.org/xml/tc6_0201"];

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
