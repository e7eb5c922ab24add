//! Cycle record plumbing and the remote control boundary.
//!
//! Control threads publish one [`CycleRecord`] per cycle into a
//! [`TelemetrySink`]; the supervisor drains each side's queue at a slow
//! cadence and appends to per-side CSV files. The sink also keeps the
//! most recent record per side so remote clients can poll any column by
//! name without touching the queues.
//!
//! [`SessionHandle`] is the only surface handed to remote transports.
//! Every directive is vetted here, at the boundary, so the control
//! threads can trust what they read from the shared cells.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use exo_common::record::CycleRecord;
use exo_common::state::{SessionMode, SessionSignals, Side, SIDE_COUNT};

// ─── Record Sink ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SideBuffer {
    pending: Mutex<Vec<CycleRecord>>,
    latest: Mutex<Option<CycleRecord>>,
}

/// Per-side record buffers between the control threads and the drain loop.
///
/// `latest` is refreshed on every push; the pending queue only grows
/// while record logging is enabled, so a session that never logs never
/// accumulates records.
#[derive(Debug, Default)]
pub struct TelemetrySink {
    sides: [SideBuffer; SIDE_COUNT],
}

impl TelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one cycle. `enqueue` also appends it to the to-disk queue.
    pub fn push(&self, side: Side, record: CycleRecord, enqueue: bool) {
        let buffer = &self.sides[side.index()];
        *buffer.latest.lock() = Some(record);
        if enqueue {
            buffer.pending.lock().push(record);
        }
    }

    /// Take everything queued since the last drain.
    pub fn drain(&self, side: Side) -> Vec<CycleRecord> {
        std::mem::take(&mut *self.sides[side.index()].pending.lock())
    }

    /// Most recent record published for a side.
    pub fn latest(&self, side: Side) -> Option<CycleRecord> {
        *self.sides[side.index()].latest.lock()
    }

    /// Records currently queued for disk.
    pub fn pending_len(&self, side: Side) -> usize {
        self.sides[side.index()].pending.lock().len()
    }
}

// ─── CSV Persistence ────────────────────────────────────────────────

/// Append-only CSV sink for one side's records.
pub struct CsvRecordWriter {
    writer: BufWriter<File>,
}

impl CsvRecordWriter {
    /// Create (or truncate) `path` and write the header line. Missing
    /// parent directories are created.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", CycleRecord::csv_header())?;
        Ok(Self { writer })
    }

    pub fn append_all(&mut self, records: &[CycleRecord]) -> io::Result<()> {
        for record in records {
            writeln!(self.writer, "{}", record.csv_row())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

// ─── Remote Boundary ────────────────────────────────────────────────

/// One vetted instruction from a remote client or the operator console.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlDirective {
    /// Switch the session mode. Shutdown is sticky.
    SetMode(SessionMode),
    /// Enable or disable record logging.
    SetLogging(bool),
    /// Cap one side's peak assistance torque for the rest of the session
    /// (or until raised again).
    SetPeakTorqueCeiling { side: Side, nm: f64 },
    /// Ask one side to clear its thermal shutdown latch.
    ResetThermalLatch { side: Side },
}

/// The only session surface exposed to remote transports.
///
/// Directives funnel through [`SessionHandle::apply`]; reads go through
/// [`SessionHandle::read_field`]. The per-side cells are plain atomics,
/// so the control threads poll them without blocking.
#[derive(Debug)]
pub struct SessionHandle {
    signals: Arc<SessionSignals>,
    sink: Arc<TelemetrySink>,
    /// Peak torque ceilings as f64 bit patterns; infinity means uncapped.
    ceilings_nm: [AtomicU64; SIDE_COUNT],
    thermal_resets: [AtomicBool; SIDE_COUNT],
}

impl SessionHandle {
    pub fn new(signals: Arc<SessionSignals>, sink: Arc<TelemetrySink>) -> Self {
        Self {
            signals,
            sink,
            ceilings_nm: std::array::from_fn(|_| AtomicU64::new(f64::INFINITY.to_bits())),
            thermal_resets: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }

    /// Apply one directive, vetting its payload first.
    pub fn apply(&self, directive: ControlDirective) -> Result<(), &'static str> {
        match directive {
            ControlDirective::SetMode(mode) => {
                if self.signals.mode() == SessionMode::Shutdown && mode != SessionMode::Shutdown {
                    return Err("shutdown is sticky; the session cannot be resumed");
                }
                self.signals.set_mode(mode);
                Ok(())
            }
            ControlDirective::SetLogging(enabled) => {
                self.signals.set_log_enabled(enabled);
                Ok(())
            }
            ControlDirective::SetPeakTorqueCeiling { side, nm } => {
                if !nm.is_finite() || nm < 0.0 {
                    return Err("peak torque ceiling must be finite and non-negative");
                }
                self.ceilings_nm[side.index()].store(nm.to_bits(), Ordering::SeqCst);
                info!("peak torque ceiling for {side} set to {nm:.2} Nm");
                Ok(())
            }
            ControlDirective::ResetThermalLatch { side } => {
                self.thermal_resets[side.index()].store(true, Ordering::SeqCst);
                info!("thermal latch reset requested for {side}");
                Ok(())
            }
        }
    }

    /// Session coordination signals behind this handle.
    #[inline]
    pub fn signals(&self) -> &SessionSignals {
        &self.signals
    }

    /// Record sink behind this handle.
    #[inline]
    pub fn sink(&self) -> &TelemetrySink {
        &self.sink
    }

    /// Current peak torque ceiling for a side [Nm].
    #[inline]
    pub fn peak_ceiling_nm(&self, side: Side) -> f64 {
        f64::from_bits(self.ceilings_nm[side.index()].load(Ordering::SeqCst))
    }

    /// Consume a pending thermal reset request, if any.
    #[inline]
    pub fn take_thermal_reset(&self, side: Side) -> bool {
        self.thermal_resets[side.index()].swap(false, Ordering::SeqCst)
    }

    /// Read one column of a side's most recent record by name.
    ///
    /// Returns `None` before the side's first cycle or for names that
    /// are not columns.
    pub fn read_field(&self, side: Side, name: &str) -> Option<f64> {
        self.sink.latest(side)?.field(name)
    }
}
