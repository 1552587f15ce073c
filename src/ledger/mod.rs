//! The persistent schedule ledger: a durable, CSV-backed store of dock reservations
//! shared by all three pathways. Grounded in `common.py::load_and_prepare_schedule`,
//! `calculate_busy_times_and_windows`, and `save_schedule_to_file`, using the teacher's
//! `csv`+`serde` CSV-loading idiom (`model::read_csv`).

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::{DockId, OrderId, WarehouseId};
use crate::timefmt::{format_ledger_timestamp, parse_ledger_timestamp};
use crate::SchedulingError;

pub const RETENTION: Duration = Duration::days(7);

fn csv_err(e: csv::Error) -> SchedulingError {
    SchedulingError::LedgerIo(io::Error::new(io::ErrorKind::Other, e))
}

/// How `merge` deduplicates concurrent writes — see spec §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Dedup by `(order, warehouse, dock)` — the external/internal queueing pathways,
    /// which replan a whole order's reservations at once.
    Queue,
    /// Dedup by the full `(order, warehouse, dock, start, end)` tuple — drop-pull, which
    /// may legitimately reserve the same dock for the same order more than once.
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub order_id: OrderId,
    pub warehouse_id: WarehouseId,
    pub dock_id: DockId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// On-disk row shape: plain strings so malformed timestamps produce a readable parse
/// error rather than a silent `serde` type mismatch.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    #[serde(rename = "Order ID")]
    order_id: String,
    #[serde(rename = "Warehouse ID")]
    warehouse_id: String,
    #[serde(rename = "Dock ID")]
    dock_id: String,
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "End Time")]
    end_time: String,
}

impl LedgerEntry {
    fn to_row(&self) -> LedgerRow {
        LedgerRow {
            order_id: self.order_id.to_string(),
            warehouse_id: self.warehouse_id.to_string(),
            dock_id: self.dock_id.to_string(),
            start_time: format_ledger_timestamp(self.start),
            end_time: format_ledger_timestamp(self.end),
        }
    }

    fn from_row(row: LedgerRow) -> Result<Self, SchedulingError> {
        Ok(LedgerEntry {
            order_id: OrderId::new(row.order_id),
            warehouse_id: WarehouseId::new(row.warehouse_id),
            dock_id: DockId::new(row.dock_id),
            start: parse_ledger_timestamp(&row.start_time)
                .map_err(|e| SchedulingError::ResponseShaping(e.to_string()))?,
            end: parse_ledger_timestamp(&row.end_time)
                .map_err(|e| SchedulingError::ResponseShaping(e.to_string()))?,
        })
    }
}

/// A busy interval on some dock, in minutes relative to the planning clock's `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyWindow {
    pub start: i64,
    pub end: i64,
}

/// A handle onto one pathway's ledger file (`local_schedule.csv`, `internal_schedule.csv`,
/// or `DropPull_schedule.csv`).
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads every entry currently on disk. Missing file → empty ledger, matching
    /// spec §4.1's stated failure mode.
    pub fn load_raw(&self) -> Result<Vec<LedgerEntry>, SchedulingError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(csv_err)?;
        let mut entries = Vec::new();
        for row in reader.deserialize::<LedgerRow>() {
            entries.push(LedgerEntry::from_row(row.map_err(csv_err)?)?);
        }
        Ok(entries)
    }

    /// Loads the ledger, drops entries that have already ended, drops entries for the
    /// orders currently being replanned, and groups the rest into busy windows rebased
    /// to minutes-from-now per `(warehouse, dock)`.
    pub fn load_and_prepare(
        &self,
        exclude_orders: &[OrderId],
        now: NaiveDateTime,
    ) -> Result<BTreeMap<(WarehouseId, DockId), Vec<BusyWindow>>, SchedulingError> {
        let raw = self.load_raw()?;
        let mut windows: BTreeMap<(WarehouseId, DockId), Vec<BusyWindow>> = BTreeMap::new();
        for entry in raw {
            if entry.end <= now {
                continue;
            }
            if exclude_orders.contains(&entry.order_id) {
                continue;
            }
            let start = (entry.start - now).num_minutes().max(0);
            let end = (entry.end - now).num_minutes().max(0);
            windows
                .entry((entry.warehouse_id.clone(), entry.dock_id.clone()))
                .or_default()
                .push(BusyWindow { start, end });
        }
        Ok(windows)
    }

    /// Total busy minutes and the window list per dock, from an already-loaded set of
    /// windows. `total_busy` feeds stage-1's capacity constraint; `windows` feeds
    /// stage-2's non-overlap constraint.
    pub fn compute_busy(
        loaded: &BTreeMap<(WarehouseId, DockId), Vec<BusyWindow>>,
    ) -> BTreeMap<(WarehouseId, DockId), (i64, Vec<BusyWindow>)> {
        loaded
            .iter()
            .map(|(key, windows)| {
                let total: i64 = windows.iter().map(|w| w.end - w.start).sum();
                (key.clone(), (total, windows.clone()))
            })
            .collect()
    }

    /// Concatenates `existing` and `new`, deduplicates per `mode`, and purges entries
    /// whose `end` is older than `retention` relative to `now`. Callers pass
    /// [`RETENTION`] directly unless a [`crate::dispatch::SchedulingContext`] overrides it.
    pub fn merge(
        existing: Vec<LedgerEntry>,
        new: Vec<LedgerEntry>,
        mode: LedgerMode,
        now: NaiveDateTime,
        retention: Duration,
    ) -> Vec<LedgerEntry> {
        let mut seen: Vec<(String, String, String, Option<String>, Option<String>)> = Vec::new();
        let mut merged = Vec::new();
        for entry in existing.into_iter().chain(new) {
            if entry.end < now - retention {
                continue;
            }
            let key = match mode {
                LedgerMode::Queue => (
                    entry.order_id.to_string(),
                    entry.warehouse_id.to_string(),
                    entry.dock_id.to_string(),
                    None,
                    None,
                ),
                LedgerMode::Drop => (
                    entry.order_id.to_string(),
                    entry.warehouse_id.to_string(),
                    entry.dock_id.to_string(),
                    Some(format_ledger_timestamp(entry.start)),
                    Some(format_ledger_timestamp(entry.end)),
                ),
            };
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            merged.push(entry);
        }
        merged
    }

    /// Atomically rewrites the ledger file: the new content is written to a temp file
    /// in the same directory, then renamed over the target, so a crash mid-write never
    /// exposes a half-written ledger to a concurrent reader.
    pub fn save(&self, entries: &[LedgerEntry]) -> Result<(), SchedulingError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(&mut tmp);
            for entry in entries {
                writer.serialize(entry.to_row()).map_err(csv_err)?;
            }
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.persist(&self.path)
            .map_err(|e| SchedulingError::LedgerIo(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        parse_ledger_timestamp(s).unwrap()
    }

    fn entry(order: &str, warehouse: &str, dock: &str, start: &str, end: &str) -> LedgerEntry {
        LedgerEntry {
            order_id: OrderId::new(order),
            warehouse_id: WarehouseId::new(warehouse),
            dock_id: DockId::new(dock),
            start: dt(start),
            end: dt(end),
        }
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let ledger = Ledger::new("/nonexistent/path/for/ledger/test.csv");
        assert!(ledger.load_raw().unwrap().is_empty());
    }

    #[test]
    fn load_and_prepare_clamps_start_and_excludes_replanned_orders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_schedule.csv");
        let ledger = Ledger::new(&path);
        let now = dt("2026-01-01 12:00:00");
        let entries = vec![
            entry("1", "10", "100", "2026-01-01 11:30:00", "2026-01-01 12:30:00"),
            entry("2", "10", "100", "2026-01-01 13:00:00", "2026-01-01 14:00:00"),
            entry("3", "10", "100", "2026-01-01 09:00:00", "2026-01-01 10:00:00"),
        ];
        ledger.save(&entries).unwrap();

        let prepared = ledger
            .load_and_prepare(&[OrderId::new("2")], now)
            .unwrap();
        let windows = &prepared[&(WarehouseId::new("10"), DockId::new("100"))];
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, 0);
        assert_eq!(windows[0].end, 30);
    }

    #[test]
    fn merge_dedups_by_mode_and_purges_stale_entries() {
        let now = dt("2026-01-10 00:00:00");
        let old = entry(
            "1",
            "10",
            "100",
            "2025-12-01 00:00:00",
            "2025-12-01 01:00:00",
        );
        let fresh = entry(
            "2",
            "10",
            "100",
            "2026-01-09 00:00:00",
            "2026-01-09 01:00:00",
        );
        let dup = fresh.clone();

        let merged = Ledger::merge(vec![old, fresh], vec![dup], LedgerMode::Queue, now, RETENTION);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].order_id, OrderId::new("2"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.csv");
        let ledger = Ledger::new(&path);
        let entries = vec![entry(
            "1",
            "10",
            "100",
            "2026-01-01 00:00:00",
            "2026-01-01 01:00:00",
        )];
        ledger.save(&entries).unwrap();
        let loaded = ledger.load_raw().unwrap();
        assert_eq!(loaded, entries);
    }
}
