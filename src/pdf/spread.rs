//! Spread cropping using lopdf
//!
//! Turns a printer's spread PDF into one page per logical page: every sheet is
//! emitted twice, each copy restricted by `/CropBox` to one half, in the order
//! computed by [`crate::remap`].

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, warn};
use crate::error::{Error, Result};
use crate::layout::{MarginOffset, Rect, SpreadCrops};
use crate::naming::output_path_for;
use crate::pdf::source::{rect_from_object, resolve_inherited, SourceDocument};
use crate::remap::CropPlan;

/// Attributes copied onto each duplicated page, since the copy gets a new parent
const INHERITED_ATTRIBUTES: [&[u8]; 3] = [b"MediaBox", b"Resources", b"Rotate"];

/// Annotation entries that reference other objects of the sheet's page graph
const DETACHED_ANNOTATION_KEYS: [&[u8]; 4] = [b"Popup", b"Parent", b"IRT", b"Dest"];

/// Trailer entries only meaningful for a cross-reference stream
const XREF_STREAM_KEYS: [&[u8]; 8] = [
    b"Type", b"W", b"Index", b"Filter", b"DecodeParms", b"Length", b"Prev", b"XRefStm",
];

/// Options for cropping a spread PDF
#[derive(Debug, Clone)]
pub struct SpreadOptions {
    /// Input PDF in printer's spread layout
    pub input_path: PathBuf,
    /// Output PDF path; `None` writes `name.out.ext` next to the input
    pub output_path: Option<PathBuf>,
    /// Inward shrink of both crop rectangles
    pub margin_offset: MarginOffset,
}

impl SpreadOptions {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: None,
            margin_offset: MarginOffset::default(),
        }
    }

    /// Output path that will be written
    pub fn resolved_output_path(&self) -> Result<PathBuf> {
        match &self.output_path {
            Some(path) => Ok(path.clone()),
            None => output_path_for(&self.input_path),
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadReport {
    pub output_path: PathBuf,
    /// Sheets read from the input
    pub source_pages: usize,
    /// Pages written to the output
    pub output_pages: usize,
}

/// Compute the output path and page plan without writing anything
pub fn plan_spread(options: &SpreadOptions) -> Result<(PathBuf, CropPlan)> {
    let (_, output_path, plan) = prepare(options)?;
    Ok((output_path, plan))
}

/// Crop a printer's spread PDF into single pages in reading order
///
/// # Example
///
/// ```no_run
/// use pdf_spread_crop::pdf::{crop_spread, SpreadOptions};
///
/// let report = crop_spread(&SpreadOptions::new("booklet.pdf")).expect("Failed to crop");
/// assert_eq!(report.output_pages, 2 * report.source_pages);
/// ```
pub fn crop_spread(options: &SpreadOptions) -> Result<SpreadReport> {
    let (source, output_path, plan) = prepare(options)?;
    let source_pages = source.page_count();

    let mut doc = assemble(source, &plan)?;
    save_atomically(&mut doc, &output_path)?;

    info!(
        output = %output_path.display(),
        source_pages,
        output_pages = plan.len(),
        "wrote cropped document"
    );

    Ok(SpreadReport {
        output_path,
        source_pages,
        output_pages: plan.len(),
    })
}

fn prepare(options: &SpreadOptions) -> Result<(SourceDocument, PathBuf, CropPlan)> {
    let output_path = options.resolved_output_path()?;
    let source = SourceDocument::open(&options.input_path)?;

    // Every sheet is assumed to share the first sheet's size
    let media_box = source.media_box(0)?;
    let crops = SpreadCrops::split(media_box, options.margin_offset)?;
    debug!(
        media_box = ?media_box.to_array(),
        bottom = ?crops.bottom.to_array(),
        top = ?crops.top.to_array(),
        "computed crop rectangles"
    );

    let plan = CropPlan::new(source.page_count(), crops)?;
    Ok((source, output_path, plan))
}

/// Replace the page tree with one cropped copy per planned page
fn assemble(source: SourceDocument, plan: &CropPlan) -> Result<Document> {
    let source_ids = (0..source.page_count())
        .map(|i| source.page_id(i))
        .collect::<Result<Vec<ObjectId>>>()?;
    let mut doc = source.doc;

    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(plan.len());

    for (position, (source_index, crop)) in plan.pages().enumerate() {
        let page_id = doc.new_object_id();
        let page = cropped_page(&mut doc, source_ids[source_index], page_id, pages_id, crop)?;
        doc.objects.insert(page_id, Object::Dictionary(page));
        debug!(page = position + 1, sheet = source_index + 1, "added cropped page");
        kids.push(Object::Reference(page_id));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(kids.len() as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    // A fresh catalog drops outlines and named destinations that point at sheets
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    // Leftovers from an xref-stream source; the output is written with a classic trailer
    for key in XREF_STREAM_KEYS {
        doc.trailer.remove(key);
    }

    let pruned = doc.prune_objects();
    debug!(pruned = pruned.len(), "removed unreachable objects");

    Ok(doc)
}

/// Independent copy of a sheet's page dictionary restricted to `crop`
fn cropped_page(
    doc: &mut Document,
    source_id: ObjectId,
    page_id: ObjectId,
    parent: ObjectId,
    crop: Rect,
) -> Result<Dictionary> {
    let mut page = doc.get_object(source_id)?.as_dict()?.clone();

    for key in INHERITED_ATTRIBUTES {
        if page.get(key).is_err() {
            if let Some(value) = resolve_inherited(doc, source_id, key)? {
                page.set(key.to_vec(), value.clone());
            }
        }
    }

    // Article beads link back to the sheet
    page.remove(b"B");

    if let Some(annots) = page.remove(b"Annots") {
        let copies = copy_annotations(doc, &annots, page_id, &crop)?;
        if !copies.is_empty() {
            page.set("Annots", Object::Array(copies));
        }
    }

    page.set("Parent", Object::Reference(parent));
    page.set("CropBox", rect_to_object(&crop));
    Ok(page)
}

/// Per-page copies of the annotations visible inside `crop`
///
/// Each copy belongs to `page_id` alone. Popups, form field parents, reply
/// chains and internal destinations point at the original sheets and are
/// left out.
fn copy_annotations(
    doc: &mut Document,
    annots: &Object,
    page_id: ObjectId,
    crop: &Rect,
) -> Result<Vec<Object>> {
    let entries = match annots {
        Object::Reference(id) => doc.get_object(*id)?.as_array()?.clone(),
        other => other.as_array()?.clone(),
    };

    let mut copies = Vec::new();
    for entry in &entries {
        let mut annot = match entry {
            Object::Reference(id) => match doc.get_object(*id).and_then(Object::as_dict) {
                Ok(dict) => dict.clone(),
                Err(e) => {
                    warn!(annotation = ?id, error = %e, "skipping unreadable annotation");
                    continue;
                }
            },
            Object::Dictionary(dict) => dict.clone(),
            _ => continue,
        };

        if matches!(annot.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Popup") {
            continue;
        }
        let visible = annot
            .get(b"Rect")
            .ok()
            .and_then(|rect| rect_from_object(rect).ok())
            .map_or(false, |rect| overlaps(&rect, crop));
        if !visible {
            continue;
        }

        for key in DETACHED_ANNOTATION_KEYS {
            annot.remove(key);
        }
        // Only web links survive; other actions target sheets or form fields
        let keeps_action = match annot.get(b"A") {
            Ok(Object::Reference(id)) => doc.get_object(*id).and_then(Object::as_dict).map_or(false, is_uri_action),
            Ok(Object::Dictionary(action)) => is_uri_action(action),
            _ => false,
        };
        if !keeps_action {
            annot.remove(b"A");
        }
        annot.set("P", Object::Reference(page_id));

        copies.push(Object::Reference(doc.add_object(Object::Dictionary(annot))));
    }

    Ok(copies)
}

fn is_uri_action(action: &Dictionary) -> bool {
    matches!(action.get(b"S"), Ok(Object::Name(kind)) if kind == b"URI")
}

fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

fn rect_to_object(rect: &Rect) -> Object {
    Object::Array(rect.to_array().iter().map(|&v| Object::from(v)).collect())
}

/// Write `doc` to a temporary file beside `output`, then rename it into place
///
/// A failed write leaves any existing `output` untouched and removes the
/// temporary file when it is dropped. An existing `output` keeps its
/// permissions; a new one gets the usual umask-filtered mode.
fn save_atomically(doc: &mut Document, output: &Path) -> Result<()> {
    let write_failure = |reason: String| Error::WriteFailure {
        path: output.to_path_buf(),
        reason,
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".pdf-spread-crop-").suffix(".tmp");
    #[cfg(unix)]
    {
        // Requested at open(2), so the process umask still applies
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    let mut temp = builder
        .tempfile_in(dir)
        .map_err(|e| write_failure(e.to_string()))?;

    if let Ok(existing) = std::fs::metadata(output) {
        temp.as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| write_failure(e.to_string()))?;
    }

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        doc.save_to(&mut writer)
            .map_err(|e| write_failure(e.to_string()))?;
        writer.flush().map_err(|e| write_failure(e.to_string()))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| write_failure(e.to_string()))?;

    temp.persist(output)
        .map_err(|e| write_failure(e.error.to_string()))?;

    Ok(())
}
