//! Page geometry extraction using lopdf

use lopdf::{Dictionary, Document, Object, ObjectId};
use shared_types::{PageInfo, PageSize};

use crate::error::PdfError;

/// Parent chains deeper than this are treated as malformed
const MAX_TREE_DEPTH: usize = 32;

/// A parsed PDF, kept only for reading page geometry
pub struct PdfDocument {
    doc: Document,
}

impl PdfDocument {
    /// Load a PDF from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
        Ok(Self { doc })
    }

    /// Get the number of pages
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get page object ID for a given page number (1-indexed)
    fn page_id(&self, page_num: u32) -> Result<ObjectId, PdfError> {
        self.doc
            .get_pages()
            .get(&page_num)
            .copied()
            .ok_or(PdfError::PageNotFound(page_num))
    }

    /// MediaBox of a page as [x, y, width, height]
    pub fn media_box(&self, page_num: u32) -> Result<[f64; 4], PdfError> {
        let page_id = self.page_id(page_num)?;
        let mut dict = self.dictionary(page_id)?;

        // MediaBox is inheritable: walk up the page tree until one is found
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(media_box) = dict.get(b"MediaBox") {
                return self.parse_rect(media_box);
            }
            match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent_id) => dict = self.dictionary(parent_id)?,
                Err(_) => break,
            }
        }

        // Default to US Letter size
        let letter = PageSize::letter();
        Ok([0.0, 0.0, letter.width, letter.height])
    }

    /// Native size of a page (1-indexed)
    pub fn page_size(&self, page_num: u32) -> Result<PageSize, PdfError> {
        let [_, _, width, height] = self.media_box(page_num)?;
        if width <= 0.0 || height <= 0.0 {
            return Err(PdfError::InvalidMediaBox(format!(
                "page {} has non-positive size {}x{}",
                page_num, width, height
            )));
        }
        Ok(PageSize::new(width, height))
    }

    /// Geometry of every page, in page order
    pub fn page_sizes(&self) -> Result<Vec<PageInfo>, PdfError> {
        (1..=self.page_count())
            .map(|page_number| {
                let size = self.page_size(page_number)?;
                Ok(PageInfo {
                    page_number,
                    width: size.width,
                    height: size.height,
                })
            })
            .collect()
    }

    fn dictionary(&self, id: ObjectId) -> Result<&Dictionary, PdfError> {
        self.doc
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|e| PdfError::Parse(format!("object {:?}: {}", id, e)))
    }

    /// Parse a PDF rectangle array into [x, y, width, height]
    fn parse_rect(&self, obj: &Object) -> Result<[f64; 4], PdfError> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .and_then(Object::as_array)
                .map_err(|_| PdfError::InvalidMediaBox("reference is not an array".into()))?,
            _ => return Err(PdfError::InvalidMediaBox("not an array".into())),
        };

        if arr.len() != 4 {
            return Err(PdfError::InvalidMediaBox(format!(
                "{} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (i, obj) in arr.iter().enumerate() {
            values[i] = self.extract_number(obj)?;
        }

        // Corners may be given in any order
        let (x1, x2) = (values[0].min(values[2]), values[0].max(values[2]));
        let (y1, y2) = (values[1].min(values[3]), values[1].max(values[3]));
        Ok([x1, y1, x2 - x1, y2 - y1])
    }

    /// Extract a number from a PDF object
    fn extract_number(&self, obj: &Object) -> Result<f64, PdfError> {
        match obj {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r as f64),
            Object::Reference(id) => {
                let resolved = self
                    .doc
                    .get_object(*id)
                    .map_err(|e| PdfError::Parse(format!("Failed to resolve: {}", e)))?;
                self.extract_number(resolved)
            }
            _ => Err(PdfError::InvalidMediaBox(
                "expected number in rectangle".into(),
            )),
        }
    }
}
