//! The annotation store.
//!
//! Owns the annotation table, the navigation cursor, the traversal mode
//! flags, and the undo history. On startup it loads a previously persisted
//! table, falling back to a fresh scan of the frame tree; thereafter every
//! field mutation re-persists the table (and, when something actually
//! changed, the history log) before returning.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::discover::{self, DiscoverError};
use crate::history::{HistoryEntry, HistoryLog};
use crate::model::{AnnotationRecord, CRITERIA_COUNT, TraversalModes};
use crate::storage::{self, StorageError};

/// Seed of the fixed shuffle permutation, so shuffled traversal order is
/// reproducible across sessions.
pub const SHUFFLE_SEED: u64 = 42;

/// Direction of a cursor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the next frame in traversal order.
    Forward,
    /// Towards the previous frame in traversal order.
    Backward,
}

/// Errors that can occur in the annotation store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Frame discovery failed at bootstrap
    #[error("frame discovery failed: {0}")]
    Discover(#[from] DiscoverError),

    /// Persisting the table or history failed; the mutation is interrupted
    #[error("failed to persist annotations: {0}")]
    Persist(#[from] StorageError),

    /// A goto target frame id was not numeric
    #[error("frame id '{0}' is not numeric")]
    InvalidFrameId(String),
}

/// The annotation record store.
///
/// Single-threaded and synchronous: every operation runs on the caller's
/// thread, and no mutation is observable until both the in-memory table and
/// the on-disk copies are updated.
#[derive(Debug)]
pub struct AnnotationStore {
    frames_root: PathBuf,
    table_path: PathBuf,
    history_path: PathBuf,

    records: Vec<AnnotationRecord>,
    extension: String,

    cursor: usize,
    shuffled_indices: Vec<usize>,
    modes: TraversalModes,

    history: HistoryLog,
}

impl AnnotationStore {
    /// Open the store: load the persisted table from `table_path`, or
    /// bootstrap it by scanning `frames_root` and persist it immediately.
    ///
    /// Fails with [`DiscoverError::EmptyDataset`] if neither path yields any
    /// rows, and with [`DiscoverError::FileNotFound`] if a loaded table's
    /// image extension cannot be recovered from the frame tree.
    pub fn open(
        frames_root: impl Into<PathBuf>,
        table_path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let frames_root = frames_root.into();
        let table_path = table_path.into();
        let history_path = storage::history_path(&table_path);

        let loaded = match storage::load_table(&table_path) {
            Ok(records) if records.is_empty() => {
                log::warn!(
                    "annotation table {:?} has no rows, rebuilding from frames",
                    table_path
                );
                None
            }
            Ok(records) => {
                log::info!("loaded {} annotations from {:?}", records.len(), table_path);
                Some(records)
            }
            Err(e) => {
                log::info!(
                    "no usable annotation table at {:?} ({}), scanning {:?}",
                    table_path,
                    e,
                    frames_root
                );
                None
            }
        };

        let (records, extension) = match loaded {
            Some(records) => {
                // The table does not store the image extension; recover it by
                // probing the first record's video folder.
                let first = &records[0];
                let extension =
                    discover::find_extension(&frames_root.join(&first.video_id), &first.frame_id)?;
                (records, extension)
            }
            None => {
                let (records, extension) = discover::scan(&frames_root)?;
                storage::save_table(&table_path, &records)?;
                log::info!(
                    "bootstrapped {} annotations from {:?}",
                    records.len(),
                    frames_root
                );
                (records, extension)
            }
        };

        let history = match storage::load_history(&history_path) {
            Ok(entries) => {
                log::info!("loaded {} history entries from {:?}", entries.len(), history_path);
                HistoryLog::from_entries(entries)
            }
            Err(e) => {
                log::debug!("starting empty history log ({})", e);
                HistoryLog::new()
            }
        };

        let mut shuffled_indices: Vec<usize> = (0..records.len()).collect();
        let mut rng = StdRng::seed_from_u64(SHUFFLE_SEED);
        shuffled_indices.shuffle(&mut rng);

        Ok(Self {
            frames_root,
            table_path,
            history_path,
            records,
            extension,
            cursor: 0,
            shuffled_indices,
            modes: TraversalModes::default(),
            history,
        })
    }

    /// Stable index of the record under the cursor.
    fn resolved_index(&self) -> usize {
        if self.modes.shuffled {
            self.shuffled_indices[self.cursor]
        } else {
            self.cursor
        }
    }

    /// Whether a record passes all active traversal filters.
    fn accepts(&self, record: &AnnotationRecord) -> bool {
        !(self.modes.skip_seen && record.seen)
            && !(self.modes.only_difficult && !record.difficult)
            && !(self.modes.only_seen && !record.seen)
    }

    /// The record under the cursor.
    pub fn current(&self) -> &AnnotationRecord {
        &self.records[self.resolved_index()]
    }

    /// Step the cursor until a record passes all active traversal filters.
    ///
    /// The cursor wraps modulo the table size in both directions. If a full
    /// lap completes without an accepted record, the loop stops on the last
    /// visited position. That guard bounds the search; it makes no promise
    /// about which row is returned when the filters exclude every row.
    pub fn advance(&mut self, direction: Direction) -> &AnnotationRecord {
        let n = self.records.len();
        let mut visited = 0;
        loop {
            self.cursor = match direction {
                Direction::Forward => (self.cursor + 1) % n,
                Direction::Backward => (self.cursor + n - 1) % n,
            };

            if self.accepts(&self.records[self.resolved_index()]) {
                break;
            }
            visited += 1;
            if visited >= n {
                log::debug!("advance: no record passes the active filters, stopping after one lap");
                break;
            }
        }
        self.current()
    }

    /// Move the cursor directly to `(video_id, frame_id)`, bypassing all
    /// traversal filters.
    ///
    /// A non-numeric `frame_id` fails with [`StoreError::InvalidFrameId`];
    /// an id that is not in the table is a silent no-op. The cursor is
    /// unchanged in both cases.
    pub fn goto(&mut self, video_id: &str, frame_id: &str) -> Result<(), StoreError> {
        let frame_id_int: u64 = frame_id
            .parse()
            .map_err(|_| StoreError::InvalidFrameId(frame_id.to_string()))?;

        let Some(stable) = self
            .records
            .iter()
            .position(|r| r.video_id == video_id && r.frame_id_int == frame_id_int)
        else {
            log::debug!("goto: no frame {}/{} in table", video_id, frame_id_int);
            return Ok(());
        };

        let target = if self.modes.shuffled {
            self.shuffled_indices.iter().position(|&i| i == stable)
        } else {
            Some(stable)
        };
        if let Some(position) = target {
            self.cursor = position;
        }
        Ok(())
    }

    /// Apply a mutation to the record under the cursor, record it in the
    /// history log if it changed anything, and persist.
    ///
    /// The table is re-persisted unconditionally; the history file is only
    /// rewritten when an entry was appended. A persistence failure
    /// interrupts the call and is returned to the caller.
    fn update<F>(&mut self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut AnnotationRecord),
    {
        let index = self.resolved_index();
        let before = self.records[index].clone();
        mutate(&mut self.records[index]);
        let after = self.records[index].clone();

        if self.history.record(before, after) {
            storage::save_history(&self.history_path, self.history.entries())?;
        }
        storage::save_table(&self.table_path, &self.records)?;
        Ok(())
    }

    /// Set the three criterion scores in fixed order.
    ///
    /// A no-op unless exactly three values are supplied.
    pub fn set_labels(&mut self, labels: &[bool]) -> Result<(), StoreError> {
        if labels.len() != CRITERIA_COUNT {
            log::warn!(
                "set_labels: expected {} values, got {}",
                CRITERIA_COUNT,
                labels.len()
            );
            return Ok(());
        }
        let (c1, c2, c3) = (labels[0], labels[1], labels[2]);
        self.update(|r| {
            r.cvs_cri_1 = c1;
            r.cvs_cri_2 = c2;
            r.cvs_cri_3 = c3;
        })
    }

    /// Set the seen flag of the current record.
    pub fn set_seen_flag(&mut self, state: bool) -> Result<(), StoreError> {
        self.update(|r| r.seen = state)
    }

    /// Set the difficult flag of the current record.
    pub fn set_difficult_flag(&mut self, state: bool) -> Result<(), StoreError> {
        self.update(|r| r.difficult = state)
    }

    /// Set the out-of-body flag of the current record.
    pub fn set_out_of_body_flag(&mut self, state: bool) -> Result<(), StoreError> {
        self.update(|r| r.out_of_body = state)
    }

    /// Set the posterior view flag of the current record.
    pub fn set_post_view_flag(&mut self, state: bool) -> Result<(), StoreError> {
        self.update(|r| r.post_view = state)
    }

    /// Set the anatomical variation flag of the current record.
    pub fn set_anatomical_variation_flag(&mut self, state: bool) -> Result<(), StoreError> {
        self.update(|r| r.anatomical_variation = state)
    }

    /// Set the ROI-not-seen flag of the current record.
    pub fn set_roi_not_seen_flag(&mut self, state: bool) -> Result<(), StoreError> {
        self.update(|r| r.roi_not_seen = state)
    }

    /// Set the artifact flag of the current record.
    pub fn set_artifact_flag(&mut self, state: bool) -> Result<(), StoreError> {
        self.update(|r| r.artifact = state)
    }

    /// Set the ROI-partially-visible flag of the current record.
    pub fn set_roi_visible_partially_flag(&mut self, state: bool) -> Result<(), StoreError> {
        self.update(|r| r.roi_visible_partially = state)
    }

    /// Set the instrument-in-ROI flag of the current record.
    pub fn set_instr_in_roi_flag(&mut self, state: bool) -> Result<(), StoreError> {
        self.update(|r| r.instr_in_roi = state)
    }

    /// Set the free-text comment of the current record.
    pub fn set_comment(&mut self, comment: &str) -> Result<(), StoreError> {
        let comment = comment.to_string();
        self.update(move |r| r.comment = comment)
    }

    /// Switch between canonical and shuffled traversal order.
    ///
    /// Takes effect on the next `current`/`advance` call; no persistence
    /// side effect.
    pub fn toggle_shuffle(&mut self, shuffled: bool) {
        self.modes.shuffled = shuffled;
    }

    /// Skip frames already marked as seen while advancing.
    pub fn toggle_skip_seen(&mut self, skip_seen: bool) {
        self.modes.skip_seen = skip_seen;
    }

    /// Visit only frames already marked as seen while advancing.
    pub fn toggle_only_seen(&mut self, only_seen: bool) {
        self.modes.only_seen = only_seen;
    }

    /// Visit only frames marked as difficult while advancing.
    pub fn toggle_only_difficult(&mut self, only_difficult: bool) {
        self.modes.only_difficult = only_difficult;
    }

    /// Identity of the current record as `(video_id, frame_id_int)`.
    pub fn current_id(&self) -> (&str, u64) {
        let record = self.current();
        (record.video_id.as_str(), record.frame_id_int)
    }

    /// Comment of the current record (empty string if unset).
    pub fn comment(&self) -> &str {
        &self.current().comment
    }

    /// The three criterion scores of the current record in fixed order.
    pub fn labels(&self) -> [bool; CRITERIA_COUNT] {
        self.current().labels()
    }

    /// Path of the current record's image file on disk.
    pub fn frame_path(&self) -> PathBuf {
        let record = self.current();
        self.frames_root
            .join(&record.video_id)
            .join(format!("{}.{}", record.frame_id, self.extension))
    }

    /// 1-based cursor position and total row count.
    pub fn progress(&self) -> (usize, usize) {
        (self.cursor + 1, self.records.len())
    }

    /// Number of rows in the table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty (never true for an opened store).
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Active traversal modes.
    pub fn modes(&self) -> TraversalModes {
        self.modes
    }

    /// Detected image file extension of the deployment.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Recorded history entries in append order.
    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    /// The frame root this store resolves image paths against.
    pub fn frames_root(&self) -> &Path {
        &self.frames_root
    }
}
