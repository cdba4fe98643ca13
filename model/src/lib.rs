//! Typed document model for PLCopen TC6 (IEC 61131-3) projects.
//!
//! The model is a tree of plain values rooted at [`Project`]. Two building
//! blocks recur throughout:
//!
//! - **Choice groups** (data types, values, bodies, graph elements) are
//!   enums, so exactly one alternative is always populated. Decoders that
//!   read a choice from a loosely structured source go through
//!   [`choice::Alternatives`], which rejects zero or several candidates.
//! - **Variable lists** are one [`VarList`] type that the [`Interface`]
//!   exposes through each [`VarRole`].
//!
//! Graphical bodies (FBD, LD and SFC) are lists of elements that wire to
//! each other by local id. [`graph::BodyGraph`] builds the explicit
//! adjacency view of such a body and checks that every reference resolves.
//!
//! The XML wire format lives in the `plcopen-xml` crate. The JSON projection
//! is in [`json`].
//!
//! # Example
//!
//! ```rust
//! use plcopen_model::*;
//!
//! let mut pou = Pou::new("Main", PouType::Program);
//! pou.body = Some(Body::st("counter := counter + 1;"));
//!
//! let mut project = Project::new(
//!     FileHeader::new("Acme", "Line Control", "1.0"),
//!     ContentHeader::new("Plant"),
//! );
//! project.types_mut().pous.push(pou);
//!
//! assert!(project.validate().is_ok());
//! ```

#[macro_use]
mod token;

pub mod body;
pub mod choice;
pub mod error;
pub mod graph;
pub mod json;
pub mod pou;
pub mod project;
pub mod text;
pub mod timestamp;
pub mod types;
pub mod validate;
pub mod value;

pub use body::*;
pub use error::Error;
pub use pou::*;
pub use project::*;
pub use text::FormattedText;
pub use timestamp::Timestamp;
pub use types::*;
pub use value::*;

pub use plcopen_problems::Problem;
