//! Per-cycle fault flags for the actuator control threads.
//!
//! Uses the `bitflags` crate for compact bitflag representation. Flags
//! marked CRITICAL end the owning thread with a controlled stop; all
//! other flags are warnings that ride along in the cycle record.

use bitflags::bitflags;

bitflags! {
    /// Fault flags raised during a single control cycle.
    ///
    /// CRITICAL flags (→ controlled stop): THERMAL_HARD_CASE,
    /// THERMAL_HARD_WINDING, DEVICE_IO_FAILED.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CycleFault: u16 {
        /// Ankle angle left the characterized range; ratio was clamped.
        const RATIO_OUT_OF_RANGE   = 0x0001;
        /// Raw current command left [bias, max] and was clamped.
        const COMMAND_CLAMPED      = 0x0002;
        /// Case temperature crossed its soft limit.
        const THERMAL_SOFT_CASE    = 0x0004;
        /// Winding temperature estimate crossed its soft limit.
        const THERMAL_SOFT_WINDING = 0x0008;
        /// Case temperature crossed its hard limit. **CRITICAL**.
        const THERMAL_HARD_CASE    = 0x0010;
        /// Winding estimate crossed its hard limit. **CRITICAL**.
        const THERMAL_HARD_WINDING = 0x0020;
        /// A device call failed or blew its deadline and was retried.
        const DEVICE_IO_RETRY      = 0x0040;
        /// Device I/O still failing after the retry budget. **CRITICAL**.
        const DEVICE_IO_FAILED     = 0x0080;
        /// The previous cycle finished past its deadline.
        const SCHEDULER_OVERRUN    = 0x0100;
    }
}

impl CycleFault {
    /// Mask of all CRITICAL flags that end the thread.
    pub const CRITICAL_MASK: Self = Self::from_bits_truncate(
        Self::THERMAL_HARD_CASE.bits()
            | Self::THERMAL_HARD_WINDING.bits()
            | Self::DEVICE_IO_FAILED.bits(),
    );

    /// Mask of the two hard thermal flags.
    pub const THERMAL_HARD_MASK: Self =
        Self::from_bits_truncate(Self::THERMAL_HARD_CASE.bits() | Self::THERMAL_HARD_WINDING.bits());

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }
}

impl Default for CycleFault {
    fn default() -> Self {
        Self::empty()
    }
}

/// Running totals of warning events across a session, one set per thread.
///
/// Updated once per cycle from that cycle's [`CycleFault`] flags and
/// reported in the session summary at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultCounters {
    /// Cycles whose current command had to be clamped.
    pub commands_clamped: u64,
    /// Cycles whose ankle angle left the characterized range.
    pub ratio_clamps: u64,
    /// Device calls retried after a failure or deadline miss.
    pub io_retries: u64,
    /// Cycles that finished past their deadline.
    pub overruns: u64,
}

impl FaultCounters {
    /// Fold one cycle's flags into the totals.
    pub fn absorb(&mut self, faults: CycleFault) {
        if faults.contains(CycleFault::COMMAND_CLAMPED) {
            self.commands_clamped += 1;
        }
        if faults.contains(CycleFault::RATIO_OUT_OF_RANGE) {
            self.ratio_clamps += 1;
        }
        if faults.contains(CycleFault::DEVICE_IO_RETRY) {
            self.io_retries += 1;
        }
        if faults.contains(CycleFault::SCHEDULER_OVERRUN) {
            self.overruns += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_flags_are_exactly_thermal_hard_and_io_failed() {
        for flag in [
            CycleFault::THERMAL_HARD_CASE,
            CycleFault::THERMAL_HARD_WINDING,
            CycleFault::DEVICE_IO_FAILED,
        ] {
            assert!(flag.has_critical(), "{flag:?} should be critical");
        }
        for flag in [
            CycleFault::RATIO_OUT_OF_RANGE,
            CycleFault::COMMAND_CLAMPED,
            CycleFault::THERMAL_SOFT_CASE,
            CycleFault::THERMAL_SOFT_WINDING,
            CycleFault::DEVICE_IO_RETRY,
            CycleFault::SCHEDULER_OVERRUN,
        ] {
            assert!(!flag.has_critical(), "{flag:?} should NOT be critical");
        }
    }

    #[test]
    fn mixed_flags_detect_critical() {
        let warnings = CycleFault::COMMAND_CLAMPED | CycleFault::SCHEDULER_OVERRUN;
        assert!(!warnings.has_critical());

        let mixed = warnings | CycleFault::THERMAL_HARD_WINDING;
        assert!(mixed.has_critical());
        assert!(mixed.intersects(CycleFault::THERMAL_HARD_MASK));
    }

    #[test]
    fn cycle_fault_bits_roundtrip() {
        for flag in [
            CycleFault::RATIO_OUT_OF_RANGE,
            CycleFault::COMMAND_CLAMPED,
            CycleFault::THERMAL_SOFT_CASE,
            CycleFault::THERMAL_SOFT_WINDING,
            CycleFault::THERMAL_HARD_CASE,
            CycleFault::THERMAL_HARD_WINDING,
            CycleFault::DEVICE_IO_RETRY,
            CycleFault::DEVICE_IO_FAILED,
            CycleFault::SCHEDULER_OVERRUN,
        ] {
            let bits = flag.bits();
            let back = CycleFault::from_bits(bits).unwrap();
            assert_eq!(back, flag, "round-trip failed for CycleFault 0x{bits:04x}");
        }
        let combo = CycleFault::COMMAND_CLAMPED | CycleFault::DEVICE_IO_RETRY;
        assert_eq!(CycleFault::from_bits(combo.bits()).unwrap(), combo);
    }

    #[test]
    fn counters_absorb_per_cycle_flags() {
        let mut counters = FaultCounters::default();
        counters.absorb(CycleFault::COMMAND_CLAMPED | CycleFault::RATIO_OUT_OF_RANGE);
        counters.absorb(CycleFault::COMMAND_CLAMPED);
        counters.absorb(CycleFault::SCHEDULER_OVERRUN | CycleFault::DEVICE_IO_RETRY);
        counters.absorb(CycleFault::empty());

        assert_eq!(counters.commands_clamped, 2);
        assert_eq!(counters.ratio_clamps, 1);
        assert_eq!(counters.io_retries, 1);
        assert_eq!(counters.overruns, 1);
    }

    #[test]
    fn critical_flags_do_not_disturb_counters() {
        let mut counters = FaultCounters::default();
        counters.absorb(CycleFault::THERMAL_HARD_CASE | CycleFault::DEVICE_IO_FAILED);
        assert_eq!(counters, FaultCounters::default());
    }
}
