//! Rewrite application: render, guard, commit.
//!
//! Each filter runs against a fresh snapshot of the watched subtree, so text
//! produced by one filter is visible to the filters after it. Every match is
//! handled atomically: the rendered fragment is either inserted in full and
//! the original text node removed and released, or the live tree is not
//! touched at all.

use std::fmt;

use regex::Regex;
use retext_dom::Host;

use crate::discover::discover_text;
use crate::filter::{FilterSet, Replacement};
use crate::template::render;
use crate::validate::{SCRATCH_TAG, matches};

/// A replacement that was refused because its output matches its own pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardTrip {
    /// Source of the offending pattern.
    pub pattern: String,
    /// The replacement, as displayed by [`Replacement`].
    pub replacement: String,
}

impl fmt::Display for GuardTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "replacement {:?} for /{}/ reproduces its own match; left unchanged",
            self.replacement, self.pattern
        )
    }
}

/// Outcome of one [`apply`] pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Text nodes replaced by rendered content.
    pub replaced: usize,
    /// Filters skipped because they are malformed.
    pub skipped_filters: usize,
    /// Matches left alone by the loop guard.
    pub guard_trips: Vec<GuardTrip>,
}

impl RewriteReport {
    /// Whether the pass changed the tree.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.replaced > 0
    }
}

/// Apply every filter in `filters`, in order, to the text under `root`.
///
/// Malformed filters are skipped. A match whose rendered replacement still
/// matches the filter's pattern is reported in
/// [`RewriteReport::guard_trips`] and left unmodified; earlier replacements
/// stay in place.
///
/// # Errors
///
/// Returns the host's error if a tree operation fails.
pub fn apply<H: Host>(
    host: &mut H,
    filters: &FilterSet,
    root: H::Node,
) -> Result<RewriteReport, H::Error> {
    let mut report = RewriteReport::default();

    for filter in filters {
        let Some((pattern, replacement)) = filter.active() else {
            tracing::debug!(pattern = %filter.pattern().source(), "Skipping malformed filter");
            report.skipped_filters += 1;
            continue;
        };

        let mut candidates = Vec::new();
        for node in discover_text(host, root) {
            if matches(host, pattern, node)? {
                candidates.push(node);
            }
        }

        for node in candidates {
            match rewrite_node(host, pattern, replacement, node)? {
                Outcome::Replaced => report.replaced += 1,
                Outcome::Guarded => {
                    tracing::warn!(
                        pattern = %pattern.as_str(),
                        replacement = %replacement,
                        "Replacement reproduces its own match, skipping"
                    );
                    report.guard_trips.push(GuardTrip {
                        pattern: pattern.as_str().to_owned(),
                        replacement: replacement.to_string(),
                    });
                }
                Outcome::Vanished => {}
            }
        }
    }

    if report.changed() || !report.guard_trips.is_empty() {
        tracing::debug!(
            replaced = report.replaced,
            guard_trips = report.guard_trips.len(),
            skipped_filters = report.skipped_filters,
            "Rewrite pass finished"
        );
    }
    Ok(report)
}

enum Outcome {
    Replaced,
    Guarded,
    /// The node is gone or detached; nothing to do.
    Vanished,
}

/// Render, guard and commit a single matched text node.
fn rewrite_node<H: Host>(
    host: &mut H,
    pattern: &Regex,
    replacement: &Replacement,
    node: H::Node,
) -> Result<Outcome, H::Error> {
    let Some(parent) = host.parent(node) else {
        return Ok(Outcome::Vanished);
    };
    let Some(rendered) = host
        .text(node)
        .and_then(|text| render(pattern, replacement, text))
    else {
        return Ok(Outcome::Vanished);
    };

    let container = host.create_element(SCRATCH_TAG);
    let guarded = host
        .set_inner_html(container, &rendered)
        .and_then(|()| matches(host, pattern, container));
    let guarded = match guarded {
        Ok(guarded) => guarded,
        Err(e) => {
            let _ = host.discard(container);
            return Err(e);
        }
    };
    if guarded {
        host.discard(container)?;
        return Ok(Outcome::Guarded);
    }

    while let Some(child) = host.first_child(container) {
        host.insert_before(parent, child, Some(node))?;
    }
    // Replaced text is released; handles to it held elsewhere go stale.
    host.discard(node)?;
    host.discard(container)?;
    Ok(Outcome::Replaced)
}
