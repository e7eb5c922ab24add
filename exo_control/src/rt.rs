//! Real-time setup for the control threads.
//!
//! Setup sequence, run once per actuator thread before its first cycle:
//!
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)` — lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` — pin to the assigned CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)` — RT priority.
//!
//! All system calls are gated behind the `rt` cargo feature and become
//! no-ops without it, so development hosts run the full session at
//! normal priority.

use crate::error::ControlError;

/// Lock all current and future memory pages (prevent page faults in the
/// control loop).
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), ControlError> {
    let ret = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(ControlError::RtSetup(format!("mlockall failed: {err}")));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), ControlError> {
    Ok(()) // No-op in simulation mode
}

/// Prefault stack pages to prevent page faults during RT execution.
///
/// Touches a large stack allocation to force page allocation.
fn prefault_stack() {
    // Touch 1 MB of stack to prefault pages.
    let mut buf = [0u8; 1024 * 1024];
    // Prevent compiler from optimizing away the write.
    for byte in buf.iter_mut() {
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

/// Pin the current thread to a specific CPU core.
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), ControlError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| ControlError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| ControlError::RtSetup(format!("sched_setaffinity failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), ControlError> {
    Ok(()) // No-op in simulation mode
}

/// Set SCHED_FIFO with the given RT priority.
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), ControlError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(ControlError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), ControlError> {
    Ok(()) // No-op in simulation mode
}

/// Perform the full RT setup sequence.
///
/// Must be called on the control thread itself, before its first cycle.
/// In simulation mode (no `rt` feature), all RT calls are no-ops.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), ControlError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}
