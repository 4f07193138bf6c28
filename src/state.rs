//! UI-side owner of the conversion session.
//!
//! The session lives inside one coroutine. Everything that touches it goes
//! through [`UiCommand`]s, and conversion completions are posted back into
//! the same inbox, so the session is never borrowed from two places.

use conversion_session::{
    export_archive, run_platform_job, yield_now, ArchiveCompression, ArchiveEntry,
    ConversionSession, ExportError, GenerationWatch, ImageCardView, Notice, NoticeBoard, Quality,
    SessionCommand, SessionEvent,
};
use dioxus::prelude::*;
use futures::StreamExt;
use std::time::Duration;

use crate::bridge;
use crate::config::AppConfig;
use crate::error::AppError;

pub enum UiCommand {
    Session(SessionCommand),
    Export,
}

/// Reactive state shared with all components through the context
#[derive(Clone, Copy)]
pub struct UiState {
    pub cards: Signal<Vec<ImageCardView>>,
    pub notices: Signal<NoticeBoard>,
    pub quality: Signal<Quality>,
    pub export_ready: Signal<bool>,
    pub exporting: Signal<bool>,
}

impl UiState {
    pub fn new(default_quality: Quality) -> Self {
        Self {
            cards: Signal::new(Vec::new()),
            notices: Signal::new(NoticeBoard::new()),
            quality: Signal::new(default_quality),
            export_ready: Signal::new(false),
            exporting: Signal::new(false),
        }
    }

    /// Shows a notice and schedules its removal
    pub fn notify(&mut self, notice: Notice) {
        let timeout = notice.timeout;
        let id = self.notices.write().push(notice);
        let mut notices = self.notices;
        spawn(expire_notice(timeout, move || {
            notices.write().dismiss(id);
        }));
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Notice(notice) => self.notify(notice),
            SessionEvent::CardCreated(card) => {
                let mut cards = self.cards.write();
                match cards.iter_mut().find(|c| c.id == card.id) {
                    Some(existing) => *existing = card,
                    None => cards.push(card),
                }
            }
            SessionEvent::CardUpdated { id, converted } => {
                if let Some(card) = self.cards.write().iter_mut().find(|c| c.id == id) {
                    card.refresh(id, converted);
                }
            }
            SessionEvent::QualityChanged(quality) => self.quality.set(quality),
            SessionEvent::ExportAvailability(ready) => self.export_ready.set(ready),
        }
    }
}

/// Runs `dismiss` once `timeout` has passed
async fn expire_notice(timeout: Duration, dismiss: impl FnOnce()) {
    bridge::delay(timeout).await;
    dismiss();
}

/// One export from the session's entries to the offered download.
///
/// `busy` is raised for the whole run and lowered again whatever the
/// outcome. A failure comes back as the notice to show.
pub async fn run_export(
    entries: Result<Vec<ArchiveEntry>, ExportError>,
    compression: ArchiveCompression,
    download_dir: &str,
    notice_timeout: Duration,
    mut busy: impl FnMut(bool),
) -> Option<Notice> {
    busy(true);
    let result = export_and_offer(entries, compression, download_dir).await;
    busy(false);

    match result {
        Ok(()) => None,
        Err(e) => {
            log::error!("Export failed: {}", e);
            Some(Notice::export_failed(e.user_message(), notice_timeout))
        }
    }
}

async fn export_and_offer(
    entries: Result<Vec<ArchiveEntry>, ExportError>,
    compression: ArchiveCompression,
    download_dir: &str,
) -> Result<(), AppError> {
    let archive = export_archive(entries?, compression).await?;
    bridge::offer_download(&archive, download_dir).await
}

/// Body of the session coroutine
pub async fn run_session(
    commands: UnboundedReceiver<UiCommand>,
    mut state: UiState,
    config: AppConfig,
) {
    let mut session = ConversionSession::new(config.session());
    let watch = GenerationWatch::new();
    let (done_tx, done_rx) = futures::channel::mpsc::unbounded::<UiCommand>();
    let mut inbox = futures::stream::select(commands, done_rx);

    while let Some(command) = inbox.next().await {
        match command {
            UiCommand::Session(command) => {
                let step = session.handle(command);
                watch.publish(session.generation());
                for job in step.jobs {
                    let watch = watch.clone();
                    let done = done_tx.clone();
                    spawn(async move {
                        // Further slider ticks may already be queued
                        yield_now().await;
                        if watch.is_superseded(&job) {
                            log::debug!("Skipping superseded conversion of {}", job.name);
                            return;
                        }
                        let result = run_platform_job(job).await;
                        let _ = done.unbounded_send(UiCommand::Session(SessionCommand::Completed(
                            result,
                        )));
                    });
                }
                for event in step.events {
                    state.apply(event);
                }
            }
            UiCommand::Export => {
                if *state.exporting.peek() {
                    continue;
                }

                // Raised before the task starts so a second click is ignored
                state.exporting.set(true);

                let entries = session.export_entries();
                let config = config.clone();
                let mut exporting = state.exporting;
                spawn(async move {
                    let notice = run_export(
                        entries,
                        config.compression,
                        &config.download_dir,
                        config.notice_timeout(),
                        |busy| exporting.set(busy),
                    )
                    .await;
                    if let Some(notice) = notice {
                        state.notify(notice);
                    }
                });
            }
        }
    }
}
