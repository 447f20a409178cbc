//! Annotation editor state
//!
//! Holds the field areas of one template, the loaded signatories and the
//! page currently on screen. Areas live in document points; screen pixels
//! only appear at the edges (drag, resize, marker rendering).

use std::collections::HashSet;

use shared_pdf::{clamp_move, clamp_to_page, Viewport};
use shared_types::{
    AnnotationArea, AnnotationRecord, AnnotationUpsert, AreaId, DocRect, FieldKind, PageSize,
    ScreenRect, Signatory,
};
use thiserror::Error;

use crate::store::StoreError;

/// Placement of a newly added area, in points
pub const NEW_AREA_X: f64 = 50.0;
pub const NEW_AREA_TOP_OFFSET: f64 = 100.0;
pub const NEW_AREA_WIDTH: f64 = 100.0;
pub const NEW_AREA_HEIGHT: f64 = 50.0;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Document pages are not loaded yet")]
    PageNotLoaded,

    #[error("Page {0} does not exist")]
    PageOutOfRange(u32),

    #[error("Unknown annotation area: {0}")]
    UnknownArea(String),

    #[error("Unknown signatory: {0}")]
    UnknownSignatory(String),

    #[error("Save returned {got} rows for a batch of {expected}")]
    BatchMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persistence state of one area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaState {
    /// Has a temporary id; the next save creates it
    UnsavedNew,
    Saved,
    /// Persisted, with edits the next save will send
    SavedModified,
}

/// Property edits from the side panel. `None` leaves a property untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
    pub kind: Option<FieldKind>,
    /// `Some(None)` unassigns the signatory
    pub signatory_id: Option<Option<String>>,
}

/// An area as drawn over the current page
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: AreaId,
    pub rect: ScreenRect,
    pub label: String,
    pub kind: FieldKind,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct AnnotationEditor {
    template_id: String,
    pages: Vec<PageSize>,
    page_number: u32,
    container_width: f64,
    signatories: Vec<Signatory>,
    areas: Vec<AnnotationArea>,
    modified: HashSet<String>,
    selected: Option<AreaId>,
    next_temp: u64,
}

impl AnnotationEditor {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            pages: Vec::new(),
            page_number: 1,
            container_width: 0.0,
            signatories: Vec::new(),
            areas: Vec::new(),
            modified: HashSet::new(),
            selected: None,
            next_temp: 1,
        }
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    // ------------------------------------------------------------
    // Pages and viewport
    // ------------------------------------------------------------

    /// Document geometry is available; the first page is shown
    pub fn load_pages(&mut self, pages: Vec<PageSize>) {
        self.pages = pages;
        self.page_number = 1;
    }

    pub fn is_loading(&self) -> bool {
        self.pages.is_empty()
    }

    /// Adding fields is disabled until the document has loaded
    pub fn can_add_fields(&self) -> bool {
        !self.is_loading()
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    pub fn current_page(&self) -> u32 {
        self.page_number
    }

    fn page_size(&self, page_number: u32) -> Option<PageSize> {
        page_number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .copied()
    }

    /// Width of the element the page is rendered into
    pub fn set_container_width(&mut self, width_px: f64) {
        self.container_width = width_px;
    }

    /// Viewport of the current page, once loaded
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport_for(self.page_number)
    }

    fn viewport_for(&self, page_number: u32) -> Option<Viewport> {
        self.page_size(page_number)
            .map(|page| Viewport::fit_width(page, self.container_width))
    }

    /// Advance one page, stopping at the last one
    pub fn next_page(&mut self) -> u32 {
        if self.page_number < self.page_count() {
            self.page_number += 1;
        }
        self.page_number
    }

    /// Go back one page, stopping at the first one
    pub fn prev_page(&mut self) -> u32 {
        if self.page_number > 1 {
            self.page_number -= 1;
        }
        self.page_number
    }

    pub fn go_to_page(&mut self, page_number: u32) -> Result<(), EditorError> {
        if self.is_loading() {
            return Err(EditorError::PageNotLoaded);
        }
        if self.page_size(page_number).is_none() {
            return Err(EditorError::PageOutOfRange(page_number));
        }
        self.page_number = page_number;
        Ok(())
    }

    // ------------------------------------------------------------
    // Loaded data
    // ------------------------------------------------------------

    pub fn signatories(&self) -> &[Signatory] {
        &self.signatories
    }

    pub fn replace_signatories(&mut self, signatories: Vec<Signatory>) {
        self.signatories = signatories;
    }

    pub fn areas(&self) -> &[AnnotationArea] {
        &self.areas
    }

    pub fn area(&self, id: &AreaId) -> Option<&AnnotationArea> {
        self.areas.iter().find(|a| &a.id == id)
    }

    /// Replace all areas with stored records; nothing is left unsaved
    pub fn replace_areas(&mut self, records: Vec<AnnotationRecord>) {
        self.areas = records.into_iter().map(AnnotationArea::from).collect();
        self.modified.clear();
        if self
            .selected
            .as_ref()
            .is_some_and(|id| self.area(id).is_none())
        {
            self.selected = None;
        }
    }

    // ------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------

    /// Add a field of `kind` to the current page and select it.
    ///
    /// The area sits 50pt from the left edge with its bottom 100pt below the top,
    /// assigned to the first signatory if any.
    pub fn add_area(&mut self, kind: FieldKind) -> Result<AreaId, EditorError> {
        let page = self
            .page_size(self.page_number)
            .ok_or(EditorError::PageNotLoaded)?;

        let id = AreaId::temporary(self.next_temp);
        self.next_temp += 1;

        let rect = clamp_move(
            DocRect::new(
                NEW_AREA_X,
                page.height - NEW_AREA_TOP_OFFSET,
                NEW_AREA_WIDTH,
                NEW_AREA_HEIGHT,
            ),
            page,
        );

        self.areas.push(AnnotationArea {
            id: id.clone(),
            name: None,
            description: None,
            required: false,
            template_id: None,
            signatory_id: self.signatories.first().map(|s| s.id.clone()),
            kind,
            page_number: self.page_number,
            rect,
        });
        self.selected = Some(id.clone());
        Ok(id)
    }

    /// Select one area; any previous selection is dropped
    pub fn select(&mut self, id: &AreaId) -> Result<(), EditorError> {
        if self.area(id).is_none() {
            return Err(EditorError::UnknownArea(id.to_string()));
        }
        self.selected = Some(id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&AnnotationArea> {
        self.selected.as_ref().and_then(|id| self.area(id))
    }

    pub fn is_selected(&self, id: &AreaId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    /// Drag stopped with the marker's top-left corner at (`left_px`, `top_px`).
    ///
    /// The size is kept; the position is clamped to the page.
    pub fn drag_to(
        &mut self,
        id: &AreaId,
        left_px: f64,
        top_px: f64,
    ) -> Result<DocRect, EditorError> {
        let (index, viewport) = self.locate(id)?;
        let current = viewport.to_screen(self.areas[index].rect);
        let moved = viewport.to_document(ScreenRect::new(
            left_px,
            top_px,
            current.width,
            current.height,
        ));
        let rect = clamp_move(moved, viewport.page());
        self.set_rect(index, rect);
        Ok(rect)
    }

    /// Resize stopped with the marker at `screen`.
    ///
    /// The size is clamped to the page first, then the position.
    pub fn resize_to(&mut self, id: &AreaId, screen: ScreenRect) -> Result<DocRect, EditorError> {
        let (index, viewport) = self.locate(id)?;
        let rect = clamp_to_page(viewport.to_document(screen), viewport.page());
        self.set_rect(index, rect);
        Ok(rect)
    }

    /// Apply side-panel edits to one area
    pub fn update(&mut self, id: &AreaId, patch: AreaPatch) -> Result<(), EditorError> {
        if let Some(Some(signatory_id)) = &patch.signatory_id {
            if !self.signatories.iter().any(|s| &s.id == signatory_id) {
                return Err(EditorError::UnknownSignatory(signatory_id.clone()));
            }
        }

        let index = self.index_of(id)?;
        let area = &mut self.areas[index];
        if let Some(name) = patch.name {
            area.name = Some(name);
        }
        if let Some(description) = patch.description {
            area.description = Some(description);
        }
        if let Some(required) = patch.required {
            area.required = required;
        }
        if let Some(kind) = patch.kind {
            area.kind = kind;
        }
        if let Some(signatory_id) = patch.signatory_id {
            area.signatory_id = signatory_id;
        }
        self.mark_modified(index);
        Ok(())
    }

    /// Drop an area from the editor.
    ///
    /// Only the in-memory list changes; a persisted row stays in the store.
    pub fn remove_area(&mut self, id: &AreaId) -> Result<AnnotationArea, EditorError> {
        let index = self.index_of(id)?;
        let area = self.areas.remove(index);
        if let Some(persisted) = area.id.persisted() {
            self.modified.remove(persisted);
        }
        if self.is_selected(id) {
            self.selected = None;
        }
        Ok(area)
    }

    // ------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------

    pub fn current_page_areas(&self) -> Vec<&AnnotationArea> {
        self.areas
            .iter()
            .filter(|a| a.page_number == self.page_number)
            .collect()
    }

    /// Markers for the current page in container pixels; empty while loading
    pub fn markers(&self) -> Vec<Marker> {
        let Some(viewport) = self.viewport() else {
            return Vec::new();
        };
        self.current_page_areas()
            .into_iter()
            .map(|area| Marker {
                id: area.id.clone(),
                rect: viewport.to_screen(area.rect),
                label: area.label().to_string(),
                kind: area.kind,
                selected: self.is_selected(&area.id),
            })
            .collect()
    }

    // ------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------

    pub fn area_state(&self, id: &AreaId) -> Option<AreaState> {
        let area = self.area(id)?;
        Some(match area.id.persisted() {
            None => AreaState::UnsavedNew,
            Some(persisted) if self.modified.contains(persisted) => AreaState::SavedModified,
            Some(_) => AreaState::Saved,
        })
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.modified.is_empty() || self.areas.iter().any(|a| a.id.is_temporary())
    }

    /// One row per area, in editor order, with rectangles rounded.
    ///
    /// Every area is sent, so saved rows are rewritten with their current values.
    pub fn save_batch(&self) -> Vec<AnnotationUpsert> {
        self.areas.iter().map(|area| self.save_row(area)).collect()
    }

    /// Rounded row kept inside the whole units of its page
    fn save_row(&self, area: &AnnotationArea) -> AnnotationUpsert {
        let mut row = AnnotationUpsert::from_area(area, &self.template_id);
        if let Some(page) = self.page_size(area.page_number) {
            let max_x = page.width.floor() as i64;
            let max_y = page.height.floor() as i64;
            row.width = row.width.clamp(0, max_x);
            row.height = row.height.clamp(0, max_y);
            row.x = row.x.clamp(0, max_x - row.width);
            row.y = row.y.clamp(0, max_y - row.height);
        }
        row
    }

    /// Take the ids the store assigned to the last batch.
    ///
    /// `records` must line up with [`save_batch`](Self::save_batch).
    pub fn apply_saved(&mut self, records: Vec<AnnotationRecord>) -> Result<(), EditorError> {
        if records.len() != self.areas.len() {
            return Err(EditorError::BatchMismatch {
                expected: self.areas.len(),
                got: records.len(),
            });
        }

        for (area, record) in self.areas.iter_mut().zip(records) {
            let id = AreaId::Persisted(record.id);
            if self.selected.as_ref() == Some(&area.id) {
                self.selected = Some(id.clone());
            }
            area.id = id;
            area.template_id = Some(record.template_id);
        }
        self.modified.clear();
        Ok(())
    }

    fn index_of(&self, id: &AreaId) -> Result<usize, EditorError> {
        self.areas
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| EditorError::UnknownArea(id.to_string()))
    }

    fn locate(&self, id: &AreaId) -> Result<(usize, Viewport), EditorError> {
        let index = self.index_of(id)?;
        let viewport = self
            .viewport_for(self.areas[index].page_number)
            .ok_or(EditorError::PageNotLoaded)?;
        Ok((index, viewport))
    }

    fn set_rect(&mut self, index: usize, rect: DocRect) {
        self.areas[index].rect = rect;
        self.mark_modified(index);
    }

    fn mark_modified(&mut self, index: usize) {
        if let Some(persisted) = self.areas[index].id.persisted() {
            self.modified.insert(persisted.to_string());
        }
    }
}
