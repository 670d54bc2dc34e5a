//! Change subscription.

use retext_dom::{Host, MutationRecord, ObserveOptions, ObserverId};

use crate::filter::FilterSet;
use crate::rewrite::apply;

/// Handle to an installed rewriter.
///
/// Dropping the handle leaves the rewriter running; call
/// [`disconnect`](Self::disconnect) to stop it.
#[derive(Debug, PartialEq, Eq)]
pub struct Watch {
    observer: ObserverId,
}

impl Watch {
    #[must_use]
    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    /// Stop rewriting. Returns `false` if the host had already dropped the observer.
    pub fn disconnect<H: Host>(self, host: &mut H) -> bool {
        host.disconnect(self.observer)
    }
}

/// Keep the text under `root` rewritten by `filters`.
///
/// Registers an observer for structural and character-data changes under
/// `root`. Every delivered batch runs a full [`apply`] pass, including the
/// batches caused by the rewriter's own edits, which the host delivers on its
/// next turn. A probe element is appended to and removed from `root` right
/// away so the content already present is rewritten on the first turn.
///
/// # Errors
///
/// Returns the host's error if `root` cannot be observed or does not accept
/// children.
pub fn install<H: Host + 'static>(
    host: &mut H,
    root: H::Node,
    filters: impl Into<FilterSet>,
) -> Result<Watch, H::Error> {
    let filters = filters.into();
    let observer = host.observe(
        root,
        ObserveOptions::subtree_changes(),
        Box::new(move |host: &mut H, records: &[MutationRecord<H::Node>]| {
            tracing::trace!(records = records.len(), "Change batch received");
            if let Err(e) = apply(host, &filters, root) {
                tracing::error!(error = %e, "Rewrite pass failed");
            }
        }),
    )?;

    let probe = host.create_element("div");
    let kicked = host
        .append_child(root, probe)
        .and_then(|()| host.remove(probe));
    host.discard(probe)?;
    if let Err(e) = kicked {
        host.disconnect(observer);
        return Err(e);
    }
    Ok(Watch { observer })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use regex::Regex;
    use retext_dom::{Document, DomError};

    use super::*;
    use crate::filter::make_filter;

    const TURNS: usize = 16;

    fn cat_to_dog() -> FilterSet {
        make_filter(Regex::new("cat").unwrap(), "<b>dog</b>").into()
    }

    #[test]
    fn test_existing_content_is_rewritten_on_first_turn() {
        let mut doc = Document::parse("<p>PRICE today</p>");
        let root = doc.root();

        install(
            &mut doc,
            root,
            make_filter(Regex::new("PRICE").unwrap(), "<b>$5</b>"),
        )
        .unwrap();
        assert_eq!(doc.inner_html(root), "<p>PRICE today</p>");

        doc.deliver();

        assert_eq!(doc.inner_html(root), "<p><b>$5</b> today</p>");
    }

    #[test]
    fn test_probe_is_released() {
        let mut doc = Document::parse("<p>nothing here</p>");
        let root = doc.root();
        let before = doc.node_count();

        install(&mut doc, root, cat_to_dog()).unwrap();

        assert_eq!(doc.node_count(), before);
        assert_eq!(doc.children(root).len(), 1);
        assert!(doc.has_pending_records());
    }

    #[test]
    fn test_settles_after_own_edits() {
        let mut doc = Document::parse("<p>cat</p>");
        let root = doc.root();
        install(&mut doc, root, cat_to_dog()).unwrap();

        let turns = doc.run_until_idle(TURNS).unwrap();

        assert_eq!(doc.inner_html(root), "<p><b>dog</b></p>");
        // Kick, then the batch caused by the rewrite itself.
        assert_eq!(turns, 2);
    }

    #[test]
    fn test_inserted_content_is_rewritten() {
        let mut doc = Document::parse("<main><p>start</p></main>");
        let root = doc.root();
        let main = doc.elements_by_tag(root, "main")[0];
        install(&mut doc, root, cat_to_dog()).unwrap();
        doc.run_until_idle(TURNS).unwrap();

        let section = doc.create_element("section");
        doc.set_inner_html(section, "<p>a cat</p>").unwrap();
        doc.append_child(main, section).unwrap();
        doc.run_until_idle(TURNS).unwrap();

        assert_eq!(
            doc.inner_html(root),
            "<main><p>start</p><section><p>a <b>dog</b></p></section></main>"
        );
    }

    #[test]
    fn test_character_data_change_is_rewritten() {
        let mut doc = Document::parse("<p>start</p>");
        let root = doc.root();
        install(&mut doc, root, cat_to_dog()).unwrap();
        doc.run_until_idle(TURNS).unwrap();

        let text = doc.first_child(doc.first_child(root).unwrap()).unwrap();
        doc.set_text(text, "cat").unwrap();
        doc.run_until_idle(TURNS).unwrap();

        assert_eq!(doc.inner_html(root), "<p><b>dog</b></p>");
    }

    #[test]
    fn test_node_count_is_stable_across_rewrites() {
        let mut doc = Document::parse("<p>start</p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let filters: FilterSet = make_filter(Regex::new("cat").unwrap(), "dog").into();
        install(&mut doc, root, filters).unwrap();
        doc.run_until_idle(TURNS).unwrap();
        let before = doc.node_count();

        for _ in 0..200 {
            let text = doc.first_child(p).unwrap();
            doc.set_text(text, "cat").unwrap();
            doc.run_until_idle(TURNS).unwrap();
        }

        assert_eq!(doc.inner_html(root), "<p>dog</p>");
        assert_eq!(doc.node_count(), before);
    }

    #[test]
    fn test_changes_outside_root_are_ignored() {
        let mut doc = Document::parse("<aside>cat</aside><main></main>");
        let root = doc.root();
        let main = doc.elements_by_tag(root, "main")[0];
        install(&mut doc, main, cat_to_dog()).unwrap();
        doc.run_until_idle(TURNS).unwrap();

        let aside_text = doc.first_child(doc.first_child(root).unwrap()).unwrap();
        doc.set_text(aside_text, "cat cat").unwrap();
        doc.run_until_idle(TURNS).unwrap();

        assert_eq!(doc.inner_html(root), "<aside>cat cat</aside><main></main>");
    }

    #[test]
    fn test_feeding_filters_never_settle() {
        let mut doc = Document::parse("<p>x</p>");
        let root = doc.root();
        let filters = vec![
            make_filter(Regex::new("x").unwrap(), "y"),
            make_filter(Regex::new("y").unwrap(), "x"),
        ];
        install(&mut doc, root, filters).unwrap();

        let err = doc.run_until_idle(4).unwrap_err();

        assert_eq!(err, DomError::Unsettled { turns: 4 });
    }

    #[test]
    fn test_disconnect_stops_rewriting() {
        let mut doc = Document::parse("<p>start</p>");
        let root = doc.root();
        let watch = install(&mut doc, root, cat_to_dog()).unwrap();
        doc.run_until_idle(TURNS).unwrap();

        assert!(watch.disconnect(&mut doc));
        let text = doc.first_child(doc.first_child(root).unwrap()).unwrap();
        doc.set_text(text, "cat").unwrap();
        doc.run_until_idle(TURNS).unwrap();

        assert_eq!(doc.inner_html(root), "<p>cat</p>");
    }

    #[test]
    fn test_text_root_is_rejected() {
        let mut doc = Document::parse("<p>cat</p>");
        let text = doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap();

        let err = install(&mut doc, text, cat_to_dog()).unwrap_err();

        assert_eq!(err, DomError::NotAContainer(text));
        assert!(!doc.has_pending_records());
    }
}
