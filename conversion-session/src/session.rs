//! The conversion session state machine.
//!
//! `ConversionSession` owns every record and the global quality. It never
//! runs conversions itself: each command returns a [`Step`] with the jobs to
//! execute and the events to display, and job completions come back in as
//! [`SessionCommand::Completed`]. Whoever owns the session (the UI coroutine
//! or the tokio driver) decides how the jobs run.
//!
//! Re-conversions are tagged with a generation. A completion older than the
//! newest request for its record is dropped, so the last *requested* quality
//! always wins regardless of completion order.

use std::sync::Arc;

use crate::convert::{ConversionJob, ConversionResult};
use crate::error::{ConvertError, ExportError};
use crate::export::{archive_entry_name, dedupe_entry_names, ArchiveEntry};
use crate::ingest::partition_candidates;
use crate::models::{CandidateFile, ImageId, ImageRecord, Quality, SessionConfig};
use crate::notice::{Notice, NoticeKind};
use crate::view::{ConvertedView, ImageCardView};

#[derive(Debug, Clone)]
pub enum SessionCommand {
    Ingest(Vec<CandidateFile>),
    SetQuality(Quality),
    Completed(ConversionResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Notice(Notice),
    /// First successful conversion of a record
    CardCreated(ImageCardView),
    /// A later conversion of an already shown record
    CardUpdated { id: ImageId, converted: ConvertedView },
    QualityChanged(Quality),
    ExportAvailability(bool),
}

/// What the owner has to do after a command
#[derive(Debug, Default)]
pub struct Step {
    pub jobs: Vec<ConversionJob>,
    pub events: Vec<SessionEvent>,
}

#[derive(Debug, Clone)]
pub struct ConversionSession {
    config: SessionConfig,
    records: Vec<ImageRecord>,
    quality: Quality,
    generation: u64,
    export_ready: bool,
}

impl ConversionSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            quality: config.default_quality,
            config,
            records: Vec::new(),
            generation: 0,
            export_ready: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Records in arrival order
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn record(&self, id: ImageId) -> Option<&ImageRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// True once there is at least one record and all are converted
    pub fn export_ready(&self) -> bool {
        !self.records.is_empty() && self.records.iter().all(ImageRecord::is_converted)
    }

    pub fn handle(&mut self, command: SessionCommand) -> Step {
        let mut step = match command {
            SessionCommand::Ingest(batch) => self.ingest(batch),
            SessionCommand::SetQuality(quality) => self.set_quality(quality),
            SessionCommand::Completed(result) => self.apply(result),
        };
        self.sync_export_availability(&mut step);
        step
    }

    fn ingest(&mut self, batch: Vec<CandidateFile>) -> Step {
        let (accepted, rejected) = partition_candidates(batch);
        let mut step = Step::default();

        for candidate in rejected {
            log::warn!(
                "Skipping {} with unsupported type {:?}",
                candidate.name,
                candidate.media_type
            );
            step.events.push(SessionEvent::Notice(Notice::unsupported_input(
                &candidate.name,
                self.config.notice_timeout,
            )));
        }

        for candidate in accepted {
            let mut record = ImageRecord::new(candidate.name, candidate.bytes);
            record.requested_generation = self.generation;
            log::info!(
                "Accepted {} as {} ({} bytes)",
                record.name,
                record.id,
                record.original_size()
            );
            step.jobs.push(self.job_for(&record));
            self.records.push(record);
        }

        step
    }

    fn set_quality(&mut self, quality: Quality) -> Step {
        let mut step = Step::default();
        if quality == self.quality {
            return step;
        }

        self.quality = quality;
        self.generation += 1;
        step.events.push(SessionEvent::QualityChanged(quality));

        if self.records.is_empty() {
            return step;
        }

        log::debug!(
            "Quality changed to {}, re-converting {} images [gen {}]",
            quality,
            self.records.len(),
            self.generation
        );
        let generation = self.generation;
        for record in &mut self.records {
            record.requested_generation = generation;
        }
        step.jobs = self.records.iter().map(|r| self.job_for(r)).collect();
        step
    }

    fn apply(&mut self, result: ConversionResult) -> Step {
        let mut step = Step::default();
        let timeout = self.config.notice_timeout;

        let Some(record) = self.records.iter_mut().find(|r| r.id == result.id) else {
            log::warn!("Dropping result for unknown image {}", result.id);
            return step;
        };

        if result.generation < record.requested_generation {
            log::debug!(
                "Discarding stale result for {} [gen {} < {}]",
                record.name,
                result.generation,
                record.requested_generation
            );
            return step;
        }

        match result.outcome {
            Ok(encoded) => {
                let first = record.converted.is_none();
                log::debug!(
                    "Converted {}: {} -> {} bytes",
                    record.name,
                    record.original_size(),
                    encoded.len()
                );
                record.converted = Some(encoded);
                let event = if first {
                    ImageCardView::project(record).map(SessionEvent::CardCreated)
                } else {
                    ConvertedView::project(record).map(|converted| SessionEvent::CardUpdated {
                        id: record.id,
                        converted,
                    })
                };
                step.events.extend(event);
            }
            Err(e) => {
                log::error!("Conversion of {} failed: {}", record.name, e);
                let message = match e {
                    ConvertError::Decode(_) => format!("Failed to load image: {}", record.name),
                    other => format!("Error converting {}: {}", record.name, other),
                };
                step.events.push(SessionEvent::Notice(Notice::transient(
                    NoticeKind::Decode,
                    message,
                    timeout,
                )));
            }
        }

        step
    }

    /// One archive entry per record, in arrival order
    pub fn export_entries(&self) -> Result<Vec<ArchiveEntry>, ExportError> {
        if !self.export_ready() {
            return Err(ExportError::NotReady);
        }

        let mut entries = self
            .records
            .iter()
            .map(|record| {
                let converted = record.converted.as_ref().ok_or(ExportError::NotReady)?;
                Ok(ArchiveEntry {
                    name: archive_entry_name(&record.name),
                    bytes: Arc::clone(&converted.bytes),
                })
            })
            .collect::<Result<Vec<_>, ExportError>>()?;
        dedupe_entry_names(&mut entries);
        Ok(entries)
    }

    fn job_for(&self, record: &ImageRecord) -> ConversionJob {
        ConversionJob {
            id: record.id,
            name: record.name.clone(),
            source: Arc::clone(record.original()),
            quality: self.quality,
            generation: record.requested_generation,
        }
    }

    fn sync_export_availability(&mut self, step: &mut Step) {
        let ready = self.export_ready();
        if ready != self.export_ready {
            self.export_ready = ready;
            step.events.push(SessionEvent::ExportAvailability(ready));
        }
    }
}

impl Default for ConversionSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::tests::{jpeg_bytes, png_bytes, RecordingEncoder};
    use crate::convert::{GenerationWatch, LibwebpEncoder, WebpEncoder};
    use crate::models::EncodedImage;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    fn png(name: &str) -> CandidateFile {
        CandidateFile::new(name, "image/png", png_bytes(8, 8))
    }

    fn run_all(session: &mut ConversionSession, jobs: Vec<ConversionJob>, encoder: &dyn WebpEncoder) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for job in jobs {
            let result = job.run(encoder);
            events.extend(session.handle(SessionCommand::Completed(result)).events);
        }
        events
    }

    fn notices(events: &[SessionEvent]) -> Vec<&Notice> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_ingest_creates_one_record_per_png() {
        let mut session = ConversionSession::default();
        let a = png("a.png");
        let b = png("b.png");
        let (len_a, len_b) = (a.len() as u64, b.len() as u64);

        let step = session.handle(SessionCommand::Ingest(vec![a, b]));

        assert_eq!(step.jobs.len(), 2);
        assert!(notices(&step.events).is_empty());
        assert_eq!(session.records().len(), 2);
        assert_eq!(session.records()[0].name, "a.png");
        assert_eq!(session.records()[0].original_size(), len_a);
        assert_eq!(session.records()[1].original_size(), len_b);

        let ids: HashSet<_> = session.records().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(session.records().iter().all(|r| r.converted.is_none()));
    }

    #[test]
    fn test_ingest_rejects_other_types() {
        let mut session = ConversionSession::default();
        let step = session.handle(SessionCommand::Ingest(vec![
            CandidateFile::new("photo.jpg", "image/jpeg", jpeg_bytes(4, 4)),
            CandidateFile::new("notes.txt", "text/plain", b"hi".to_vec()),
        ]));

        assert!(step.jobs.is_empty());
        assert!(session.records().is_empty());
        let notices = notices(&step.events);
        assert_eq!(notices.len(), 2);
        assert!(notices[0].message.contains("photo.jpg"));
        assert!(notices[1].message.contains("notes.txt"));
        assert!(notices.iter().all(|n| n.kind == NoticeKind::UnsupportedInput));
    }

    #[test]
    fn test_quality_change_without_records_is_noop() {
        let mut session = ConversionSession::default();
        let step = session.handle(SessionCommand::SetQuality(Quality::new(30).unwrap()));
        assert!(step.jobs.is_empty());
        assert_eq!(session.quality().value(), 30);
        assert_eq!(
            step.events,
            vec![SessionEvent::QualityChanged(Quality::new(30).unwrap())]
        );

        // Same value again: nothing at all
        let step = session.handle(SessionCommand::SetQuality(Quality::new(30).unwrap()));
        assert!(step.jobs.is_empty());
        assert!(step.events.is_empty());
    }

    #[test]
    fn test_quality_change_reconverts_every_record() {
        let encoder = RecordingEncoder::default();
        let mut session = ConversionSession::default();
        let step = session.handle(SessionCommand::Ingest(vec![png("a.png"), png("b.png"), png("c.png")]));
        run_all(&mut session, step.jobs, &encoder);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 3);

        let new_quality = Quality::new(42).unwrap();
        let step = session.handle(SessionCommand::SetQuality(new_quality));
        assert_eq!(step.jobs.len(), 3);
        assert!(step.jobs.iter().all(|j| j.quality == new_quality));

        let events = run_all(&mut session, step.jobs, &encoder);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 6);
        assert_eq!(&encoder.qualities.lock().unwrap()[3..], &[new_quality; 3]);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, SessionEvent::CardUpdated { .. }))
                .count(),
            3
        );
        assert!(session
            .records()
            .iter()
            .all(|r| r.converted.as_ref().unwrap().quality == new_quality));
    }

    #[test]
    fn test_first_conversion_creates_card_then_updates() {
        let mut session = ConversionSession::default();
        let step = session.handle(SessionCommand::Ingest(vec![png("a.png")]));
        let events = run_all(&mut session, step.jobs, &LibwebpEncoder);
        assert!(matches!(events[0], SessionEvent::CardCreated(_)));

        let step = session.handle(SessionCommand::SetQuality(Quality::new(10).unwrap()));
        let events = run_all(&mut session, step.jobs, &LibwebpEncoder);
        assert!(matches!(events[0], SessionEvent::CardUpdated { .. }));
    }

    #[test]
    fn test_export_gated_until_last_conversion() {
        let mut session = ConversionSession::default();
        assert!(!session.export_ready());

        let step = session.handle(SessionCommand::Ingest(vec![png("a.png"), png("b.PNG")]));
        let mut jobs = step.jobs.into_iter();

        let first = jobs.next().unwrap().run(&LibwebpEncoder);
        let step = session.handle(SessionCommand::Completed(first));
        assert!(!session.export_ready());
        assert!(!step.events.contains(&SessionEvent::ExportAvailability(true)));
        assert!(matches!(session.export_entries(), Err(ExportError::NotReady)));

        let second = jobs.next().unwrap().run(&LibwebpEncoder);
        let step = session.handle(SessionCommand::Completed(second));
        assert!(session.export_ready());
        assert!(step.events.contains(&SessionEvent::ExportAvailability(true)));

        let entries = session.export_entries().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.webp", "b.webp"]);

        // A new image hides the export again until it is converted
        let step = session.handle(SessionCommand::Ingest(vec![png("c.png")]));
        assert!(step.events.contains(&SessionEvent::ExportAvailability(false)));
    }

    #[test]
    fn test_stale_results_are_discarded() {
        let mut session = ConversionSession::default();
        let step = session.handle(SessionCommand::Ingest(vec![png("a.png")]));
        let initial_job = step.jobs.into_iter().next().unwrap();

        let step = session.handle(SessionCommand::SetQuality(Quality::new(20).unwrap()));
        let mid_job = step.jobs.into_iter().next().unwrap();
        let step = session.handle(SessionCommand::SetQuality(Quality::new(90).unwrap()));
        let latest_job = step.jobs.into_iter().next().unwrap();

        // Latest lands first, older ones arrive afterwards
        session.handle(SessionCommand::Completed(latest_job.run(&LibwebpEncoder)));
        let late_mid = session.handle(SessionCommand::Completed(mid_job.run(&LibwebpEncoder)));
        let late_initial = session.handle(SessionCommand::Completed(initial_job.run(&LibwebpEncoder)));

        assert!(late_mid.events.is_empty());
        assert!(late_initial.events.is_empty());
        let converted = session.records()[0].converted.as_ref().unwrap();
        assert_eq!(converted.quality.value(), 90);
    }

    #[test]
    fn test_skipping_superseded_jobs_still_converts_everything() {
        let encoder = RecordingEncoder::default();
        let watch = GenerationWatch::new();
        let mut session = ConversionSession::default();

        // A slider drag: ingest, then three ticks before anything runs
        let mut pending = session
            .handle(SessionCommand::Ingest(vec![png("a.png"), png("b.png")]))
            .jobs;
        for q in [70, 60, 50] {
            pending.extend(session.handle(SessionCommand::SetQuality(Quality::new(q).unwrap())).jobs);
        }
        watch.publish(session.generation());
        assert_eq!(pending.len(), 8);

        let current: Vec<_> = pending
            .into_iter()
            .filter(|job| !watch.is_superseded(job))
            .collect();
        assert_eq!(current.len(), 2);

        run_all(&mut session, current, &encoder);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 2);
        assert!(session.export_ready());
        assert!(session
            .records()
            .iter()
            .all(|r| r.converted.as_ref().unwrap().quality.value() == 50));
    }

    #[test]
    fn test_decode_failure_reports_and_leaves_record_unset() {
        let mut session = ConversionSession::default();
        let step = session.handle(SessionCommand::Ingest(vec![
            CandidateFile::new("broken.png", "image/png", b"garbage".to_vec()),
            png("fine.png"),
        ]));

        let events = run_all(&mut session, step.jobs, &LibwebpEncoder);
        let notices = notices(&events);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Decode);
        assert_eq!(notices[0].message, "Failed to load image: broken.png");

        assert!(session.records()[0].converted.is_none());
        assert!(session.records()[1].converted.is_some());
        assert!(!session.export_ready());
    }

    #[test]
    fn test_encode_failure_message() {
        let mut session = ConversionSession::default();
        let step = session.handle(SessionCommand::Ingest(vec![png("a.png")]));
        let job = step.jobs.into_iter().next().unwrap();
        let result = ConversionResult {
            id: job.id,
            name: job.name,
            generation: job.generation,
            outcome: Err(ConvertError::Encode("boom".to_string())),
        };
        let step = session.handle(SessionCommand::Completed(result));
        let notices = notices(&step.events);
        assert_eq!(notices[0].message, "Error converting a.png: Encode error: boom");
    }

    #[test]
    fn test_unknown_result_is_ignored() {
        let mut session = ConversionSession::default();
        let step = session.handle(SessionCommand::Completed(ConversionResult {
            id: ImageId::new(),
            name: "ghost.png".to_string(),
            generation: 0,
            outcome: Ok(EncodedImage {
                bytes: Arc::from(vec![1u8]),
                quality: Quality::default(),
                width: 1,
                height: 1,
            }),
        }));
        assert!(step.events.is_empty());
    }

    #[test]
    fn test_duplicate_names_are_disambiguated_on_export() {
        let mut session = ConversionSession::default();
        let step = session.handle(SessionCommand::Ingest(vec![png("same.png"), png("SAME.png")]));
        run_all(&mut session, step.jobs, &LibwebpEncoder);
        let entries = session.export_entries().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["same.webp", "SAME (2).webp"]);
    }
}
