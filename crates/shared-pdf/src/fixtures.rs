//! Minimal PDFs for tests

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use shared_types::PageSize;

fn media_box(size: PageSize) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(size.width as _),
        Object::Real(size.height as _),
    ])
}

fn finish(mut doc: Document, pages_id: ObjectId, pages: Dictionary) -> Vec<u8> {
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .expect("in-memory PDF serialization cannot fail");
    buffer
}

fn blank_page(doc: &mut Document, pages_id: ObjectId, size: Option<PageSize>) -> ObjectId {
    let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
    let mut page = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
    ]);
    if let Some(size) = size {
        page.set("MediaBox", media_box(size));
    }
    doc.add_object(page)
}

/// A PDF with one blank page per entry, each carrying its own MediaBox
pub fn blank_pdf(sizes: &[PageSize]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let page_ids: Vec<ObjectId> = sizes
        .iter()
        .map(|size| blank_page(&mut doc, pages_id, Some(*size)))
        .collect();

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    finish(doc, pages_id, pages)
}

/// A single-page PDF whose page inherits its MediaBox from the page tree root
pub fn pdf_with_inherited_media_box(size: PageSize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = blank_page(&mut doc, pages_id, None);

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(1)),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ("MediaBox", media_box(size)),
    ]);
    finish(doc, pages_id, pages)
}
