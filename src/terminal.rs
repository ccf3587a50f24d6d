//! The operator terminal as an explicit state machine.
//!
//! Each method is one transition. Network work happens outside: the caller
//! takes the request returned by [`Terminal::begin_submission`], runs it
//! against a [`Backend`](crate::backend::Backend), and feeds the result back
//! through [`Terminal::finish_submission`], which hands out the [`Repoll`]
//! the caller then owes. Every transition that changes what is on screen
//! ends in exactly one render.

use crate::backend::{Reply, TransportError};
use crate::interpret::{interpret, Panels, StatusBanner};
use crate::request::{self, OutboundRequest};
use crate::selector::{ImageSourceSelector, SelectorView};
use crate::snapshot::{self, ParkingSnapshot, ParkingTables};
use crate::types::{ActionType, LabeledImage, UploadedFile};
use log::{error, info, warn};

const POLL_FAILED_TEXT: &str = "Gagal memuat data parkir.";
const CATALOGUE_FAILED_TEXT: &str = "Gagal memuat daftar gambar berlabel.";
const BUSY_TEXT: &str = "Permintaan sebelumnya masih diproses.";

/// Everything on screen at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub selector: SelectorView,
    pub catalogue: Vec<LabeledImage>,
    pub panels: Panels,
    pub tables: ParkingTables,
    pub busy: bool,
}

pub trait Renderer {
    fn render(&mut self, frame: &Frame);

    /// A one-off message that is not part of the frame.
    fn notice(&mut self, _text: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting(ActionType),
}

/// Handed out when a submission finishes. The snapshot may have changed
/// server-side whatever the outcome, so the holder must poll it.
#[must_use = "a finished submission must be followed by a parking data poll"]
#[derive(Debug, PartialEq, Eq)]
pub struct Repoll;

pub struct Terminal<R> {
    selector: ImageSourceSelector,
    catalogue: Vec<LabeledImage>,
    panels: Panels,
    tables: ParkingTables,
    phase: Phase,
    renderer: R,
}

impl<R: Renderer> Terminal<R> {
    pub fn new(renderer: R) -> Terminal<R> {
        Terminal {
            selector: ImageSourceSelector::default(),
            catalogue: vec![],
            panels: Panels::default(),
            tables: ParkingTables::default(),
            phase: Phase::Idle,
            renderer,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn notice(&mut self, text: &str) {
        self.renderer.notice(text);
    }

    pub fn catalogue(&self) -> &[LabeledImage] {
        &self.catalogue
    }

    pub fn select_upload(&mut self, file: UploadedFile) {
        self.selector.select_upload(file);
        self.render();
    }

    pub fn select_labeled(&mut self, path: &str) {
        self.selector.select_labeled(path);
        self.render();
    }

    pub fn clear_selection(&mut self) {
        self.selector.clear();
        self.render();
    }

    /// Shows a failure that happened before anything reached the terminal,
    /// such as an unreadable file.
    pub fn show_error(&mut self, text: String) {
        self.panels.status = Some(StatusBanner::error(text));
        self.render();
    }

    /// Idle -> Submitting. Returns the request to send, or `None` when the
    /// action was refused. Result panels are cleared before this returns.
    pub fn begin_submission(&mut self, action: ActionType) -> Option<OutboundRequest> {
        if let Phase::Submitting(pending) = self.phase {
            warn!(
                "Ignoring '{}' while '{}' is still being processed",
                action, pending
            );
            self.renderer.notice(BUSY_TEXT);
            return None;
        }
        match request::build(action, self.selector.current()) {
            Ok(request) => {
                info!("Processing vehicle '{}'", action);
                self.phase = Phase::Submitting(action);
                self.panels = Panels::pending();
                self.render();
                Some(request)
            }
            Err(e) => {
                warn!("Not submitting '{}': {}", action, e);
                self.panels.status = Some(StatusBanner::error(e.to_string()));
                self.render();
                None
            }
        }
    }

    /// Submitting -> Idle, through whichever outcome the reply maps to.
    pub fn finish_submission(&mut self, result: Result<Reply, TransportError>) -> Repoll {
        let interpretation = interpret(&result);
        info!("Submission finished: {:?}", interpretation.outcome);
        self.phase = Phase::Idle;
        self.panels = interpretation.panels;
        self.render();
        Repoll
    }

    /// Replaces both tables on success. On failure the old tables stay and
    /// only the status banner changes.
    pub fn finish_poll(&mut self, result: Result<ParkingSnapshot, TransportError>) {
        match result {
            Ok(snapshot) => self.tables = snapshot::render(&snapshot),
            Err(e) => {
                error!("Error fetching parking data: {}", e);
                self.panels.status = Some(StatusBanner::error(POLL_FAILED_TEXT));
            }
        }
        self.render();
    }

    pub fn finish_labeled_images(&mut self, result: Result<Vec<String>, TransportError>) {
        match result {
            Ok(paths) => {
                info!("Loaded {} labeled images", paths.len());
                self.catalogue = paths.into_iter().map(LabeledImage::new).collect();
            }
            Err(e) => {
                error!("Error loading labeled images: {}", e);
                self.panels.status = Some(StatusBanner::error(CATALOGUE_FAILED_TEXT));
            }
        }
        self.render();
    }

    pub fn frame(&self) -> Frame {
        Frame {
            selector: self.selector.view(),
            catalogue: self.catalogue.clone(),
            panels: self.panels.clone(),
            tables: self.tables.clone(),
            busy: self.is_busy(),
        }
    }

    fn render(&mut self) {
        let frame = self.frame();
        self.renderer.render(&frame);
    }
}
