//! Best-effort markup parsing into document nodes.
//!
//! Markup is read with `quick-xml` in a lenient configuration and turned into
//! detached nodes. The parser never fails: HTML conveniences the XML reader
//! does not know about are patched up front, and whatever the reader still
//! rejects is kept as literal text.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::document::Document;
use crate::entities::{
    convert_html_entities, decode_entity, escape_stray_markup, unescaped_offset,
};
use crate::error::DomError;
use crate::mutation::MutationRecord;
use crate::node::{Element, NodeData, NodeId};

impl Document {
    /// Parse `markup` into detached nodes, returned in document order.
    ///
    /// Void elements (`br`, `img`, ...) never take children, end tags close
    /// the nearest open element with the same name, and unparseable input is
    /// kept as text.
    pub fn parse_fragment(&mut self, markup: &str) -> Vec<NodeId> {
        let converted = convert_html_entities(markup);
        let source = escape_stray_markup(&converted);

        let mut reader = Reader::from_str(&source);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut builder = FragmentBuilder::new(self);
        loop {
            let offset = usize::try_from(reader.buffer_position()).unwrap_or(source.len());
            match reader.read_event() {
                Ok(Event::Start(e)) => builder.open_element(decode_element(&reader, &e)),
                Ok(Event::Empty(e)) => builder.empty_element(decode_element(&reader, &e)),
                Ok(Event::End(e)) => {
                    builder.close_element(&decode_bytes(&reader, e.name().as_ref()));
                }
                Ok(Event::Text(e)) => builder.append_text(&decode_bytes(&reader, &e)),
                Ok(Event::GeneralRef(e)) => {
                    builder.append_text(&decode_entity(&decode_bytes(&reader, &e)));
                }
                Ok(Event::CData(e)) => builder.append_text(&String::from_utf8_lossy(&e)),
                Ok(Event::Comment(e)) => builder.append_comment(&decode_bytes(&reader, &e)),
                Ok(Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(err) => {
                    tracing::debug!(
                        error = %err,
                        offset,
                        "Markup not parseable, keeping remainder as text"
                    );
                    let remainder = unescaped_offset(&converted, offset);
                    builder.append_text(converted.get(remainder..).unwrap_or_default());
                    break;
                }
            }
        }
        builder.finish()
    }

    /// Replace all children of `container` with the parsed `markup`.
    ///
    /// Reported as a single child-list change.
    pub fn set_inner_html(&mut self, container: NodeId, markup: &str) -> Result<(), DomError> {
        if !self.node(container)?.data.is_container() {
            return Err(DomError::NotAContainer(container));
        }
        let removed = self.detach_children(container);
        let added = self.parse_fragment(markup);
        for &node in &added {
            self.attach(container, node);
        }
        if !removed.is_empty() || !added.is_empty() {
            self.queue_record(MutationRecord::child_list(container, added, removed));
        }
        Ok(())
    }
}

/// Stack-based assembly of parsed nodes.
struct FragmentBuilder<'d> {
    doc: &'d mut Document,
    top_level: Vec<NodeId>,
    open: Vec<(String, NodeId)>,
}

impl<'d> FragmentBuilder<'d> {
    fn new(doc: &'d mut Document) -> Self {
        Self {
            doc,
            top_level: Vec::new(),
            open: Vec::new(),
        }
    }

    fn append(&mut self, node: NodeId) {
        match self.open.last() {
            Some(&(_, parent)) => self.doc.attach(parent, node),
            None => self.top_level.push(node),
        }
    }

    fn open_element(&mut self, element: Element) {
        let tag = (!element.is_void()).then(|| element.tag.clone());
        let node = self.doc.create_element_with(element);
        self.append(node);
        if let Some(tag) = tag {
            self.open.push((tag, node));
        }
    }

    fn empty_element(&mut self, element: Element) {
        let node = self.doc.create_element_with(element);
        self.append(node);
    }

    fn close_element(&mut self, tag: &str) {
        if let Some(index) = self
            .open
            .iter()
            .rposition(|(open, _)| open.eq_ignore_ascii_case(tag))
        {
            self.open.truncate(index);
        }
    }

    /// Append text, merging with a directly preceding text node.
    fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let previous = match self.open.last() {
            Some(&(_, parent)) => self.doc.last_child(parent),
            None => self.top_level.last().copied(),
        };
        if let Some(previous) = previous
            && let Some(NodeData::Text(existing)) = self.doc.data_mut(previous)
        {
            existing.push_str(text);
            return;
        }
        let node = self.doc.create_text(text);
        self.append(node);
    }

    fn append_comment(&mut self, text: &str) {
        let node = self.doc.create_comment(text);
        self.append(node);
    }

    fn finish(self) -> Vec<NodeId> {
        self.top_level
    }
}

fn decode_element<R>(reader: &Reader<R>, e: &BytesStart) -> Element {
    let tag = decode_bytes(reader, e.name().as_ref());
    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = decode_bytes(reader, attr.key.as_ref());
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            Cow::into_owned,
        );
        attrs.push((key, value));
    }
    Element { tag, attrs }
}

fn decode_bytes<R>(reader: &Reader<R>, bytes: &[u8]) -> String {
    reader.decoder().decode(bytes).map_or_else(
        |_| String::from_utf8_lossy(bytes).into_owned(),
        Cow::into_owned,
    )
}
