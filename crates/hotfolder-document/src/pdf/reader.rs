// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: inspect an existing PDF and splice its pages between other
// documents using the `lopdf` crate.

use std::collections::HashMap;

use hotfolder_core::PaperSize;
use hotfolder_core::error::HotfolderError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Reads an existing PDF and copies its pages into other documents.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, HotfolderError> {
        let document = Document::load_mem(data).map_err(|err| {
            HotfolderError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Size of the first page, taken from its (possibly inherited) MediaBox.
    pub fn first_page_size(&self) -> Option<PaperSize> {
        let pages = self.document.get_pages();
        let first = *pages.values().next()?;
        let media_box = inherited_attribute(&self.document, first, b"MediaBox")?;
        let coords: Vec<f32> = media_box
            .as_array()
            .ok()?
            .iter()
            .filter_map(number)
            .collect();
        if coords.len() != 4 {
            return None;
        }
        let width = (coords[2] - coords[0]).abs();
        let height = (coords[3] - coords[1]).abs();
        (width > 0.0 && height > 0.0).then(|| PaperSize::from_points(width, height))
    }

    // -- Splicing -------------------------------------------------------------

    /// Build `before ++ self ++ after` as a single PDF and return its bytes.
    ///
    /// `before` becomes the base document; this document's pages and then
    /// the pages of `after` are appended to its page tree.
    #[instrument(skip_all, fields(pages = self.page_count()))]
    pub fn splice_between(&self, before: &[u8], after: &[u8]) -> Result<Vec<u8>, HotfolderError> {
        let mut combined = Document::load_mem(before).map_err(|err| {
            HotfolderError::PdfError(format!("failed to load leading PDF: {}", err))
        })?;
        let trailing = Document::load_mem(after).map_err(|err| {
            HotfolderError::PdfError(format!("failed to load trailing PDF: {}", err))
        })?;

        append_all_pages(&self.document, &mut combined)?;
        append_all_pages(&trailing, &mut combined)?;

        let mut output = Vec::new();
        combined.save_to(&mut output).map_err(|err| {
            HotfolderError::PdfError(format!("failed to serialise spliced PDF: {}", err))
        })?;

        debug!(
            total_pages = combined.get_pages().len(),
            output_bytes = output.len(),
            "Splice complete"
        );
        Ok(output)
    }
}

// -- Helpers ------------------------------------------------------------------

/// Append every page of `source`, in order, to the end of `target`'s page tree.
fn append_all_pages(source: &Document, target: &mut Document) -> Result<(), HotfolderError> {
    let mut copier = ObjectCopier::new(source);
    for page_id in source.get_pages().into_values() {
        copier.append_page(target, page_id)?;
    }
    Ok(())
}

/// Copies objects from one document into another, remembering what has
/// already been copied so shared resources are copied once and reference
/// cycles terminate.
struct ObjectCopier<'a> {
    source: &'a Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: HashMap::new(),
        }
    }

    /// Copy the page `page_id` into `target` as its last page.
    fn append_page(&mut self, target: &mut Document, page_id: ObjectId) -> Result<(), HotfolderError> {
        let source = self.source;
        let page = source.get_dictionary(page_id).map_err(|err| {
            HotfolderError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        // /Parent is dropped during the copy, so pull inherited attributes
        // down onto the page itself first.
        let mut page = page.clone();
        for key in INHERITABLE_KEYS {
            if !page.has(key)
                && let Some(value) = inherited_attribute(source, page_id, key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }

        let copied = self.copy_object(target, &Object::Dictionary(page));
        let new_page_id = target.add_object(copied);

        let pages_id = target
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|err| HotfolderError::PdfError(format!("no /Pages in target: {}", err)))?;

        let pages_dict = target
            .get_object_mut(pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| HotfolderError::PdfError(format!("bad /Pages node: {}", err)))?;

        if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
            kids.push(Object::Reference(new_page_id));
        } else {
            pages_dict.set("Kids", Object::Array(vec![Object::Reference(new_page_id)]));
        }
        let count = pages_dict
            .get(b"Count")
            .and_then(Object::as_i64)
            .unwrap_or(0);
        pages_dict.set("Count", Object::Integer(count + 1));

        if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(new_page_id) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }

        Ok(())
    }

    /// Deep-copy an object, rewriting references into `target` ids.
    /// /Parent entries are skipped; the caller patches the page's own parent.
    fn copy_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(target, item))
                    .collect(),
            ),
            Object::Reference(id) => Object::Reference(self.copy_reference(target, *id)),
            Object::Stream(stream) => Object::Stream(lopdf::Stream::new(
                self.copy_dictionary(target, &stream.dict),
                stream.content.clone(),
            )),
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(target, value));
        }
        copy
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> ObjectId {
        if let Some(existing) = self.copied.get(&id) {
            return *existing;
        }

        // Reserve the id before recursing so cycles resolve to it.
        let new_id = target.new_object_id();
        self.copied.insert(id, new_id);

        let source = self.source;
        let copied = match source.get_object(id) {
            Ok(referenced) => self.copy_object(target, referenced),
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        };
        target.objects.insert(new_id, copied);
        new_id
    }
}

/// Look up `key` on a page, walking up the /Parent chain if needed.
fn inherited_attribute<'d>(doc: &'d Document, page_id: ObjectId, key: &[u8]) -> Option<&'d Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    // Bounded walk; malformed files can contain parent cycles.
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return match value {
                Object::Reference(id) => doc.get_object(*id).ok(),
                direct => Some(direct),
            };
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
