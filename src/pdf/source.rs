//! Source document access
//!
//! Wraps a loaded lopdf [`Document`] with the handful of lookups the cropper
//! needs: page count, page object ids in reading order, and media boxes.

use std::path::{Path, PathBuf};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, warn};
use crate::error::{Error, Result};
use crate::layout::Rect;

/// A parsed spread PDF
#[derive(Debug)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub doc: Document,
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    /// Load and validate a source PDF
    ///
    /// Errors: `InputNotFound` when the file is missing or unreadable,
    /// `UnsupportedDocument` when it does not parse, is encrypted, or has no pages.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "failed to read input");
            Error::InputNotFound(path.to_path_buf())
        })?;

        let doc = Document::load_mem(&bytes).map_err(|e| {
            Error::UnsupportedDocument(format!("{}: {}", path.display(), e))
        })?;

        Self::from_document(path.to_path_buf(), doc)
    }

    /// Wrap an already loaded document
    pub fn from_document(path: PathBuf, doc: Document) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::UnsupportedDocument(format!(
                "{} is encrypted",
                path.display()
            )));
        }

        // get_pages() walks Kids in order and is keyed by 1-based page number
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(Error::UnsupportedDocument(format!(
                "{} has no pages",
                path.display()
            )));
        }

        if let Some(declared) = declared_page_count(&doc) {
            if declared != page_ids.len() {
                warn!(
                    declared,
                    found = page_ids.len(),
                    "page tree Count disagrees with the pages found; using the pages found"
                );
            }
        }

        debug!(path = %path.display(), pages = page_ids.len(), "loaded source document");

        Ok(Self { path, doc, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id of the page at 0-based `index`
    pub fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            Error::UnsupportedDocument(format!(
                "page {} out of range ({} pages)",
                index + 1,
                self.page_ids.len()
            ))
        })
    }

    /// Media box of the page at 0-based `index`, following inheritance
    pub fn media_box(&self, index: usize) -> Result<Rect> {
        let page_id = self.page_id(index)?;
        let obj = resolve_inherited(&self.doc, page_id, b"MediaBox")?.ok_or_else(|| {
            Error::UnsupportedDocument(format!("page {} has no MediaBox", index + 1))
        })?;
        let obj = resolve_reference(&self.doc, obj)?;
        rect_from_object(obj)
    }
}

/// Count declared on the root `Pages` node, if it can be read
fn declared_page_count(doc: &Document) -> Option<usize> {
    let catalog = doc.catalog().ok()?;
    let pages_id = catalog.get(b"Pages").ok()?.as_reference().ok()?;
    let pages = doc.get_object(pages_id).ok()?.as_dict().ok()?;
    match pages.get(b"Count").ok()? {
        Object::Integer(n) if *n >= 0 => Some(*n as usize),
        _ => None,
    }
}

/// Look up `key` on a page, walking up `/Parent` links when the page lacks it
pub fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut current = page_id;
    // Bounded walk so a cyclic /Parent chain cannot spin forever
    for _ in 0..64 {
        let dict = doc.get_object(current)?.as_dict()?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return Ok(None),
        }
    }
    Err(Error::UnsupportedDocument("page tree is too deep or cyclic".to_string()))
}

fn resolve_reference<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Parse a 4-number PDF box array
pub fn rect_from_object(obj: &Object) -> Result<Rect> {
    let array = obj
        .as_array()
        .map_err(|_| Error::UnsupportedDocument(format!("box is not an array: {:?}", obj)))?;
    if array.len() != 4 {
        return Err(Error::UnsupportedDocument(format!(
            "expected 4 numbers in box, got {}",
            array.len()
        )));
    }
    let mut values = [0.0; 4];
    for (slot, item) in values.iter_mut().zip(array) {
        *slot = object_to_f64(item)?;
    }
    Ok(Rect::from_media_box(values[0], values[1], values[2], values[3]))
}

fn object_to_f64(obj: &Object) -> Result<f64> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(f) => Ok(*f as f64),
        _ => Err(Error::UnsupportedDocument(format!("expected number, got {:?}", obj))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Two pages inheriting a MediaBox from the Pages node
    fn inherited_box_document() -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..2)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), Object::Real(841.5)],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_open_nonexistent_file() {
        let result = SourceDocument::open(Path::new("nonexistent.pdf"));
        assert!(matches!(result, Err(Error::InputNotFound(_))));
    }

    #[test]
    fn test_inherited_media_box() {
        let source =
            SourceDocument::from_document(PathBuf::from("mem.pdf"), inherited_box_document()).unwrap();
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.media_box(1).unwrap(), Rect::new(0.0, 0.0, 595.0, 841.5));
    }

    #[test]
    fn test_page_index_out_of_range() {
        let source =
            SourceDocument::from_document(PathBuf::from("mem.pdf"), inherited_box_document()).unwrap();
        assert!(matches!(source.page_id(2), Err(Error::UnsupportedDocument(_))));
    }

    #[test]
    fn test_rect_from_object_rejects_short_array() {
        let obj = Object::Array(vec![0.into(), 0.into(), 100.into()]);
        assert!(matches!(rect_from_object(&obj), Err(Error::UnsupportedDocument(_))));
    }

    #[test]
    fn test_document_without_pages() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let result = SourceDocument::from_document(PathBuf::from("empty.pdf"), doc);
        assert!(matches!(result, Err(Error::UnsupportedDocument(_))));
    }

    #[test]
    fn test_encrypted_document_rejected() {
        let mut doc = inherited_box_document();
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
            "O" => Object::string_literal(vec![0u8; 32]),
            "U" => Object::string_literal(vec![0u8; 32]),
            "P" => -4,
        });
        doc.trailer.set("Encrypt", encrypt_id);

        let result = SourceDocument::from_document(PathBuf::from("locked.pdf"), doc);
        match result {
            Err(Error::UnsupportedDocument(msg)) => assert!(msg.contains("encrypted")),
            other => panic!("expected UnsupportedDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_open_unreadable_path() {
        // A directory exists but cannot be read as a file
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let result = SourceDocument::open(temp_dir.path());
        assert!(matches!(result, Err(Error::InputNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_open_file_without_read_permission() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("locked.pdf");
        let mut doc = inherited_box_document();
        doc.save(&path).expect("Failed to write fixture");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read it anyway
        if std::fs::File::open(&path).is_ok() {
            eprintln!("Skipping permission test: file is still readable");
            return;
        }

        let result = SourceDocument::open(&path);
        assert!(matches!(result, Err(Error::InputNotFound(_))));
    }
}
