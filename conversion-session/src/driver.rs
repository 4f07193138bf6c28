//! Tokio actor that owns a [`ConversionSession`].
//!
//! Commands arrive through a [`SessionHandle`]; conversions run through
//! [`run_job`] and their completions are fed back into the same loop, so the
//! session is only ever touched by the actor task.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::convert::{run_job, ConversionJob, ConversionResult, WebpEncoder};
use crate::error::{ExportError, SessionError};
use crate::export::{export_archive, ExportedArchive};
use crate::models::{CandidateFile, Quality};
use crate::session::{ConversionSession, SessionCommand, SessionEvent};

enum DriverCommand {
    Session(SessionCommand),
    Export(oneshot::Sender<Result<ExportedArchive, ExportError>>),
    Shutdown,
}

/// Cloneable handle for talking to a running [`SessionDriver`]
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<DriverCommand>,
}

impl SessionHandle {
    pub fn ingest(&self, batch: Vec<CandidateFile>) -> Result<(), SessionError> {
        self.send(DriverCommand::Session(SessionCommand::Ingest(batch)))
    }

    pub fn set_quality(&self, quality: Quality) -> Result<(), SessionError> {
        self.send(DriverCommand::Session(SessionCommand::SetQuality(quality)))
    }

    /// Packages every converted image; fails with `NotReady` until all are done
    pub async fn export(&self) -> Result<ExportedArchive, ExportError> {
        let closed = || ExportError::Worker(SessionError::DriverClosed.to_string());
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(DriverCommand::Export(reply_tx))
            .map_err(|_| closed())?;
        reply_rx.await.map_err(|_| closed())?
    }

    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.send(DriverCommand::Shutdown)
    }

    fn send(&self, command: DriverCommand) -> Result<(), SessionError> {
        self.tx.send(command).map_err(|_| SessionError::DriverClosed)
    }
}

pub struct SessionDriver {
    session: ConversionSession,
    encoder: Arc<dyn WebpEncoder>,
    commands: mpsc::UnboundedReceiver<DriverCommand>,
    completions_tx: mpsc::UnboundedSender<ConversionResult>,
    completions_rx: mpsc::UnboundedReceiver<ConversionResult>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionDriver {
    /// Starts the actor on the current tokio runtime
    pub fn spawn(
        session: ConversionSession,
        encoder: Arc<dyn WebpEncoder>,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, commands) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let driver = SessionDriver {
            session,
            encoder,
            commands,
            completions_tx,
            completions_rx,
            events,
        };
        tokio::spawn(driver.run());

        (SessionHandle { tx }, events_rx)
    }

    async fn run(mut self) {
        log::debug!("Session driver started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(DriverCommand::Session(command)) => self.step(command),
                    Some(DriverCommand::Export(reply)) => self.export(reply),
                    Some(DriverCommand::Shutdown) | None => break,
                },
                Some(result) = self.completions_rx.recv() => {
                    self.step(SessionCommand::Completed(result));
                }
            }
        }
        log::debug!("Session driver stopped");
    }

    fn step(&mut self, command: SessionCommand) {
        let step = self.session.handle(command);
        for job in step.jobs {
            self.dispatch(job);
        }
        for event in step.events {
            // Nobody listening is not an error for the session itself
            let _ = self.events.send(event);
        }
    }

    fn dispatch(&self, job: ConversionJob) {
        let encoder = Arc::clone(&self.encoder);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = run_job(job, encoder).await;
            let _ = completions.send(result);
        });
    }

    fn export(&self, reply: oneshot::Sender<Result<ExportedArchive, ExportError>>) {
        let entries = self.session.export_entries();
        let compression = self.session.config().compression;
        let timeout = self.session.config().notice_timeout;
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = match entries {
                Ok(entries) => export_archive(entries, compression).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                log::error!("Export failed: {}", e);
                let _ = events.send(SessionEvent::Notice(crate::notice::Notice::export_failed(
                    e, timeout,
                )));
            }
            let _ = reply.send(result);
        });
    }
}
