//! # chatcast DOM
//!
//! A small arena DOM used for every frame-side read.
//!
//! - [`Document`] - arena tree with open shadow roots and backend node ids
//! - [`parse_html`] - html5ever based parser; declarative shadow roots are attached
//! - [`Selector`] - CSS selector engine scoped to one tree (never crosses shadow roots)
//! - [`find`] - element resolution that pierces open shadow roots
//!
//! Snapshots either come from a live frame (CDP `DOM.getDocument` with `pierce`)
//! or from saved HTML.

pub mod error;
pub mod node;
pub mod parse;
pub mod resolver;
pub mod selector;
mod serialize;

pub use error::SelectorError;
pub use node::{Document, ElementData, ElementRef, NodeId, NodeKind};
pub use parse::parse_html;
pub use resolver::{find, find_compiled, find_str};
pub use selector::Selector;
