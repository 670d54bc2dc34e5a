//! Change-reactive text rewriting.
//!
//! [`install`] watches a subtree of a [`Host`](retext_dom::Host) document and
//! keeps its text rewritten by an ordered [`FilterSet`]. On every change
//! notification a full pass runs:
//!
//! 1. [`discover_text`] lists the text nodes under the watched root
//! 2. [`matches`] keeps the ones a filter's pattern matches, testing a
//!    disposable clone so the live tree is never touched
//! 3. [`apply`] renders each replacement into a scratch container, refuses
//!    it if the result still matches the pattern, and otherwise swaps it in
//!    for the original text node
//!
//! The rewriter's own edits are reported back by the host on its next turn,
//! so newly produced text is processed too, and a replacement that would
//! regenerate its own trigger is stopped by the guard in step 3.
//!
//! # Example
//!
//! ```
//! use regex::Regex;
//! use retext::{install, make_filter};
//! use retext_dom::Document;
//!
//! let mut doc = Document::parse("<p>PRICE today</p>");
//! let root = doc.root();
//! let filter = make_filter(Regex::new("PRICE").unwrap(), "<b>$5</b>");
//!
//! install(&mut doc, root, filter).unwrap();
//! doc.run_until_idle(16).unwrap();
//!
//! assert_eq!(doc.inner_html(root), "<p><b>$5</b> today</p>");
//! ```

mod discover;
mod filter;
mod rewrite;
mod template;
mod validate;
mod watch;

pub use discover::discover_text;
pub use filter::{Filter, FilterSet, Pattern, ReplaceFn, Replacement, make_filter};
pub use rewrite::{GuardTrip, RewriteReport, apply};
pub use validate::matches;
pub use watch::{Watch, install};
