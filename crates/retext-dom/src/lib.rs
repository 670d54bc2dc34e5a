//! In-memory document tree for the retext engine.
//!
//! This crate provides the host side of text rewriting: a [`Document`] that owns
//! every node, parses and serializes markup, and reports structural and
//! character-data changes to registered observers.
//!
//! # Architecture
//!
//! - [`Document`] is a generational arena; nodes are addressed by [`NodeId`]
//! - [`Document::observe`] registers a callback for changes under a subtree
//! - [`Document::deliver`] runs one turn of the event loop, handing each
//!   observer the records queued since the previous turn
//! - [`Host`] abstracts the capabilities the engine consumes, so other trees
//!   (a browser DOM, a widget tree) can stand in for [`Document`]
//!
//! # Example
//!
//! ```
//! use retext_dom::Document;
//!
//! let doc = Document::parse("<p>Hello <b>world</b></p>");
//! let root = doc.root();
//! assert_eq!(doc.text_content(root), "Hello world");
//! assert_eq!(doc.inner_html(root), "<p>Hello <b>world</b></p>");
//! ```

mod document;
mod entities;
mod error;
mod host;
mod markup;
mod mutation;
mod node;
mod serialize;

pub use document::Document;
pub use error::DomError;
pub use host::{Host, MutationCallback};
pub use mutation::{MutationKind, MutationRecord, ObserveOptions, ObserverId};
pub use node::{Element, NodeData, NodeId, NodeType};
