//! PDF accumulator backed by `lopdf`
//!
//! Each appended document is renumbered past every id already taken, its
//! pages are detached from their page tree (inheriting `Resources`,
//! `MediaBox`, `CropBox` and `Rotate` on the way), and its remaining objects
//! are kept as-is. Catalogs, page-tree nodes and outlines are dropped; one
//! fresh catalog and a flat page tree are built on render.

use crate::merge::traits::Accumulator;
use crate::MergeError;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in broken files
const MAX_TREE_DEPTH: usize = 64;

/// Object types rebuilt on render instead of copied
const STRUCTURAL_TYPES: [&[u8]; 5] = [b"Catalog", b"Pages", b"Page", b"Outlines", b"Outline"];

/// Merges PDFs page-set by page-set, preserving append order
#[derive(Debug)]
pub struct PdfAccumulator {
    version: String,
    pages: Vec<(ObjectId, Dictionary)>,
    objects: BTreeMap<ObjectId, Object>,
    next_id: u32,
    page_sets: usize,
}

impl PdfAccumulator {
    pub fn new() -> Self {
        Self {
            version: "1.5".to_string(),
            pages: Vec::new(),
            objects: BTreeMap::new(),
            next_id: 1,
            page_sets: 0,
        }
    }
}

impl Default for PdfAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator for PdfAccumulator {
    fn append(&mut self, path: &Path) -> Result<usize, MergeError> {
        let mut doc = Document::load(path).map_err(|source| MergeError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        doc.renumber_objects_with(self.next_id);

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(MergeError::NoPages {
                path: path.to_path_buf(),
            });
        }

        let mut pages = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            let Ok(page) = doc.get_dictionary(page_id) else {
                continue;
            };
            let mut page = page.clone();
            inherit_attributes(&doc, &mut page);
            page.remove(b"Parent");
            pages.push((page_id, page));
        }

        if pages.is_empty() {
            return Err(MergeError::NoPages {
                path: path.to_path_buf(),
            });
        }

        let appended = pages.len();
        if version_key(&doc.version) > version_key(&self.version) {
            self.version = doc.version.clone();
        }
        self.next_id = doc.max_id + 1;
        self.objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_structural(object)),
        );
        self.pages.extend(pages);
        self.page_sets += 1;

        Ok(appended)
    }

    fn len(&self) -> usize {
        self.page_sets
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render(&mut self) -> Result<Vec<u8>, MergeError> {
        let mut document = Document::with_version(self.version.as_str());
        document.objects = self.objects.clone();

        let pages_id = (self.next_id, 0);
        let catalog_id = (self.next_id + 1, 0);

        for (page_id, page) in &self.pages {
            let mut page = page.clone();
            page.set("Parent", pages_id);
            document.objects.insert(*page_id, Object::Dictionary(page));
        }

        let kids: Vec<Object> = self
            .pages
            .iter()
            .map(|(page_id, _)| Object::Reference(*page_id))
            .collect();

        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.pages.len() as i64,
            }),
        );
        document.objects.insert(
            catalog_id,
            Object::Dictionary(dictionary! {
                "Type" => "Catalog",
                "Pages" => pages_id,
            }),
        );
        document.trailer.set("Root", catalog_id);
        document.max_id = catalog_id.0;
        document.renumber_objects();

        let mut buffer = Vec::new();
        document
            .save_to(&mut buffer)
            .map_err(|e| MergeError::Encode(e.to_string()))?;
        Ok(buffer)
    }
}

/// Orders `major.minor` header versions numerically; unparsable parts count as 0
fn version_key(version: &str) -> (u32, u32) {
    let mut parts = version
        .trim()
        .split('.')
        .map(|part| part.parse::<u32>().unwrap_or(0));
    (parts.next().unwrap_or(0), parts.next().unwrap_or(0))
}

/// Copies inheritable attributes from the page-tree ancestors of `page`
fn inherit_attributes(doc: &Document, page: &mut Dictionary) {
    let mut parent = page.get(b"Parent").and_then(|p| p.as_reference()).ok();
    let mut depth = 0;

    while let Some(node_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            tracing::debug!("Page tree deeper than {}, stopping", MAX_TREE_DEPTH);
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok();
        depth += 1;
    }
}

fn is_structural(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return false,
    };
    dict.get(b"Type")
        .and_then(|t| t.as_name())
        .map(|name| STRUCTURAL_TYPES.iter().any(|t| *t == name))
        .unwrap_or(false)
}
