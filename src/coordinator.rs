//! Batch coordination: run state machine, bounded worker pool, event stream.
//!
//! A run moves through `Scanning -> Converting -> Done`, or ends in
//! `Cancelled` when a cancellation request arrives mid-run. Scanning
//! resolves the source list and validates job-level configuration; any
//! problem there is a `Job` error and aborts before dispatch. Once
//! converting, per-task failures are downgraded into failed item events and
//! the batch always runs to a final tally.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::encode;
use crate::error::ConvertError;
use crate::inspect::{self, is_svg, svg_entries};
use crate::job::{
    parse_background, resolve_destination, ConversionJob, ConversionTask, InputMode, PixelSize,
    Rgb, SizeMode,
};
use crate::plan;
use crate::render;

/// Default worker pool size.
pub const DEFAULT_CONCURRENCY: usize = 4;

const RENDERER_ID: &str = "resvg";

/// Run phase, as reported in progress snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Scanning,
    Converting,
    Done,
    Cancelled,
}

/// A read-only view of one run's progress counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub phase: Phase,
    pub total: u32,
    /// Completed task count, ok + failed. Monotonic within one run.
    pub current: u32,
    /// In-flight task count.
    pub active: u32,
    pub ok: u32,
    pub failed: u32,
    pub last_source: Option<String>,
}

/// Per-task result payload, emitted once per completed task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome {
    pub index: u32,
    pub total: u32,
    pub source: String,
    pub dest: String,
    pub out_width: Option<u32>,
    pub out_height: Option<u32>,
    pub ok: bool,
    pub renderer: Option<String>,
    pub error: Option<String>,
}

/// Streamed run events. Item event order across sources is unspecified.
#[derive(Debug, Clone)]
pub enum Event {
    Progress(ProgressSnapshot),
    Item(ItemOutcome),
}

/// Final tally for one run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: u32,
    pub ok: u32,
    pub failed: u32,
    pub cancelled: bool,
}

/// One run's mutable progress state. Owned exclusively by the coordinator
/// loop; workers report through a channel, so counter updates are
/// serialized and consumers only ever see whole snapshots.
struct ProgressState {
    phase: Phase,
    total: u32,
    active: u32,
    ok: u32,
    failed: u32,
    last_source: Option<String>,
}

impl ProgressState {
    fn new(total: u32) -> Self {
        Self {
            phase: Phase::Scanning,
            total,
            active: 0,
            ok: 0,
            failed: 0,
            last_source: None,
        }
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            phase: self.phase,
            total: self.total,
            current: self.ok + self.failed,
            active: self.active,
            ok: self.ok,
            failed: self.failed,
            last_source: self.last_source.clone(),
        }
    }
}

struct TaskDone {
    index: u32,
    source: PathBuf,
    dest: PathBuf,
    result: Result<PixelSize, ConvertError>,
}

/// Runs one conversion job to completion.
///
/// Emits progress and item events on `events` (at least one progress event
/// at scan start and one after every completed task) and returns the final
/// summary. Configuration problems detected during scanning fail with
/// [`ConvertError::Job`] before any task is dispatched; per-task failures
/// never abort the batch.
///
/// Cancellation is cooperative: once `cancel` fires, undispatched tasks are
/// skipped and excluded from the tally, while in-flight tasks run to
/// completion and are reported normally.
pub async fn run_job(
    job: ConversionJob,
    concurrency: usize,
    events: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
) -> Result<RunSummary, ConvertError> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let concurrency = concurrency.max(1);

    // Scanning: validate configuration, resolve the source list.
    let background = resolve_job_background(&job)?;
    let sources = resolve_sources(&job)?;
    if let Some(dir) = &job.output_dir {
        fs::create_dir_all(dir).map_err(|e| {
            ConvertError::Job(format!(
                "cannot create output directory {}: {e}",
                dir.display()
            ))
        })?;
    }

    let planned_total = sources.len() as u32;
    let mut state = ProgressState::new(planned_total);
    let _ = events.send(Event::Progress(state.snapshot()));
    info!(
        run_id = %run_id,
        total = planned_total,
        concurrency,
        "starting conversion run"
    );

    // Converting: bounded pool, one task per source.
    state.phase = Phase::Converting;
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<TaskDone>();

    let mut queue = sources.into_iter();
    let mut next = queue.next();
    let mut dispatched: u32 = 0;
    let mut completed: u32 = 0;
    let mut cancelled = false;

    loop {
        if next.is_none() && completed == dispatched {
            break;
        }
        tokio::select! {
            biased;

            _ = cancel.cancelled(), if !cancelled && next.is_some() => {
                cancelled = true;
                let skipped = planned_total - dispatched;
                next = None;
                state.total = dispatched;
                warn!(
                    run_id = %run_id,
                    skipped,
                    "cancellation requested, skipping undispatched tasks"
                );
            }

            permit = semaphore.clone().acquire_owned(), if next.is_some() => {
                let permit = permit.expect("run semaphore is never closed");
                let source = next.take().expect("dispatch branch requires a source");
                next = queue.next();
                dispatched += 1;
                state.active += 1;

                let task = ConversionTask {
                    index: dispatched,
                    source: source.clone(),
                    dest: resolve_destination(&source, job.output_dir.as_deref()),
                    size_mode: job.size_mode,
                    crop: job.crop,
                    background,
                };
                debug!(run_id = %run_id, source = %task.source.display(), "dispatching task");

                let tx = done_tx.clone();
                tokio::spawn(async move {
                    let index = task.index;
                    let source = task.source.clone();
                    let dest = task.dest.clone();
                    let result = match tokio::task::spawn_blocking(move || convert_task(&task)).await {
                        Ok(result) => result,
                        Err(e) => Err(ConvertError::Render {
                            reason: format!("conversion worker panicked: {e}"),
                        }),
                    };
                    let _ = tx.send(TaskDone { index, source, dest, result });
                    drop(permit);
                });
            }

            done = done_rx.recv() => {
                let done = done.expect("coordinator holds a done sender");
                completed += 1;
                state.active -= 1;
                state.last_source = Some(done.source.display().to_string());

                let outcome = match done.result {
                    Ok(size) => {
                        state.ok += 1;
                        info!(
                            run_id = %run_id,
                            source = %done.source.display(),
                            dest = %done.dest.display(),
                            size = %size,
                            "converted"
                        );
                        ItemOutcome {
                            index: done.index,
                            total: state.total,
                            source: done.source.display().to_string(),
                            dest: done.dest.display().to_string(),
                            out_width: Some(size.width),
                            out_height: Some(size.height),
                            ok: true,
                            renderer: Some(RENDERER_ID.to_string()),
                            error: None,
                        }
                    }
                    Err(err) => {
                        state.failed += 1;
                        warn!(
                            run_id = %run_id,
                            source = %done.source.display(),
                            error = %err,
                            "conversion failed"
                        );
                        ItemOutcome {
                            index: done.index,
                            total: state.total,
                            source: done.source.display().to_string(),
                            dest: done.dest.display().to_string(),
                            out_width: None,
                            out_height: None,
                            ok: false,
                            renderer: Some(RENDERER_ID.to_string()),
                            error: Some(err.to_string()),
                        }
                    }
                };
                let _ = events.send(Event::Item(outcome));
                let _ = events.send(Event::Progress(state.snapshot()));
            }
        }
    }

    state.phase = if cancelled { Phase::Cancelled } else { Phase::Done };
    let _ = events.send(Event::Progress(state.snapshot()));

    let finished_at = Utc::now();
    info!(
        run_id = %run_id,
        total = state.total,
        ok = state.ok,
        failed = state.failed,
        cancelled,
        "conversion run finished"
    );

    Ok(RunSummary {
        run_id,
        started_at,
        finished_at,
        total: state.total,
        ok: state.ok,
        failed: state.failed,
        cancelled,
    })
}

/// Re-validates the job's background string; the engine never trusts
/// upstream validation here.
fn resolve_job_background(job: &ConversionJob) -> Result<Option<Rgb>, ConvertError> {
    match job.background.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_background(s)
            .map(Some)
            .ok_or_else(|| ConvertError::Job(format!("invalid background color {s:?}, expected RRGGBB or #RRGGBB"))),
        None => Ok(None),
    }
}

/// Expands the job's input into the concrete task source list.
fn resolve_sources(job: &ConversionJob) -> Result<Vec<PathBuf>, ConvertError> {
    let sources = match job.input_mode {
        InputMode::Folder => {
            let dir = job
                .sources
                .first()
                .ok_or_else(|| ConvertError::Job("folder mode requires a directory path".into()))?;
            if !dir.is_dir() {
                return Err(ConvertError::Job(format!(
                    "not a directory: {}",
                    dir.display()
                )));
            }
            svg_entries(dir)
                .map_err(|e| ConvertError::Job(format!("cannot read folder: {e}")))?
                .collect()
        }
        InputMode::File => {
            for path in &job.sources {
                if !path.is_file() || !is_svg(path) {
                    return Err(ConvertError::Job(format!(
                        "not an SVG file: {}",
                        path.display()
                    )));
                }
            }
            job.sources.clone()
        }
    };
    if sources.is_empty() {
        return Err(ConvertError::Job("no SVG documents to convert".into()));
    }
    Ok(sources)
}

/// The blocking per-task pipeline: read, parse, plan, rasterize, encode,
/// persist. Runs on the blocking pool; every error here belongs to this
/// task alone.
fn convert_task(task: &ConversionTask) -> Result<PixelSize, ConvertError> {
    let data = fs::read(&task.source).map_err(|source| ConvertError::NotFound {
        path: task.source.clone(),
        source,
    })?;
    let tree = render::parse_document(&data, &task.source)?;
    let intrinsic = inspect::size_of_tree(&tree);
    let target = plan::plan_target(&task.size_mode, intrinsic)?;
    // Cover-crop only applies in exact mode; with matching aspect ratios
    // the cover transform degenerates to a plain uniform scale.
    let cover = task.crop && matches!(task.size_mode, SizeMode::Exact { .. });
    let pixmap = render::rasterize(&tree, target, cover, task.background)?;
    let bytes = encode::encode_png(&pixmap, task.background.is_some())?;
    encode::persist(&task.dest, &bytes)?;
    Ok(target)
}
