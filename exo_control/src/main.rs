//! # Exo Session Runner
//!
//! Launches one control thread per configured ankle actuator, arms the
//! shared session signals once every joint has zeroed, and drains
//! per-cycle telemetry into per-side CSV logs until the session ends.
//!
//! The binary drives deterministic simulated boots with a scripted
//! treadmill cadence; a vendor transport slots in through the same
//! `AnkleTransport` trait without touching the control loops.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use exo_common::config::{ConfigError, ConfigLoader, SessionConfig};
use exo_common::consts::{DEFAULT_CALIBRATION_DIR, DEFAULT_CONFIG_PATH};
use exo_common::estimate::{EstimateSlot, GaitEstimate, SessionClock};
use exo_common::state::{LifecycleCell, LifecycleState, SessionMode, SessionSignals, Side};
use exo_control::actuator::ActuatorControlThread;
use exo_control::error::ControlError;
use exo_control::rt;
use exo_control::scheduler::CycleStats;
use exo_control::telemetry::{CsvRecordWriter, SessionHandle, TelemetrySink};
use exo_hal::identity::IdentityRegistry;
use exo_hal::sim::SimulatedExo;

/// Stride period of the scripted gait estimate [s].
const DEMO_STRIDE_S: f64 = 1.2;

/// Sim read count after which the scripted boot starts walking. Leaves
/// the donning wiggle and the zeroing pull well behind.
const WALK_FROM_SAMPLE: u64 = 4_000;

/// Exo Session Runner — ankle assistance control loops
#[derive(Parser, Debug)]
#[command(name = "exo_control")]
#[command(author = "GaitWorks")]
#[command(version)]
#[command(about = "Soft real-time ankle exoskeleton session runner")]
struct Args {
    /// Path to the session configuration TOML.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory holding per-side calibration offsets.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CALIBRATION_DIR)]
    calibration_dir: PathBuf,

    /// Directory for per-side session logs.
    #[arg(long, value_name = "DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Run a single side ('left' or 'right') instead of both.
    #[arg(long, value_name = "SIDE")]
    side: Option<String>,

    /// End the session this many seconds after launch.
    #[arg(long, value_name = "SECONDS")]
    session_s: Option<f64>,

    /// Peak torque published by the scripted gait estimator [Nm].
    #[arg(long, default_value_t = 15.0)]
    peak_torque_nm: f64,

    /// Disable CSV session logging.
    #[arg(long)]
    no_log: bool,

    /// CPU core of the first actuator thread; the second takes the
    /// next core up.
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority for the actuator threads.
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Exo session runner v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Exo session closed");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_session_config(&args.config)?;
    config.validate()?;
    info!(
        service = %config.shared.service_name,
        control_rate_hz = config.rates.control_rate_hz,
        devices = config.devices.len(),
        "config OK"
    );

    let registry = IdentityRegistry::from_config(&config.devices)?;
    let signals = Arc::new(SessionSignals::new());
    signals.set_log_enabled(!args.no_log);
    let sink = Arc::new(TelemetrySink::new());
    let handle = Arc::new(SessionHandle::new(Arc::clone(&signals), Arc::clone(&sink)));
    let clock = SessionClock::start();

    {
        let signals = Arc::clone(&signals);
        ctrlc::set_handler(move || {
            info!("shutdown signal received");
            signals.request_shutdown();
        })?;
    }

    let mut actuators = Vec::new();
    for (index, side) in selected_sides(args)?.into_iter().enumerate() {
        let Some(device_id) = registry.first_id_for_side(side) else {
            warn!("no device configured for the {side} side; skipping");
            continue;
        };
        actuators.push(spawn_actuator(
            args, &config, side, index, device_id, clock, &handle,
        )?);
    }
    if actuators.is_empty() {
        return Err("no actuators configured for the selected sides".into());
    }

    let estimator = spawn_estimator(&actuators, Arc::clone(&signals), clock, args.peak_torque_nm)?;

    drain_session(args, &actuators, &signals, &sink, clock)?;

    let mut failure: Option<ControlError> = None;
    for runtime in actuators {
        let SideRuntime { side, join, .. } = runtime;
        match join.join() {
            Ok(Ok(stats)) => info!(
                side = %side,
                cycles = stats.cycle_count,
                overruns = stats.overruns,
                avg_cycle_us = stats.avg_cycle_ns() / 1_000,
                "actuator finished"
            ),
            Ok(Err(err)) => {
                error!(side = %side, "actuator failed: {err}");
                if failure.is_none() {
                    failure = Some(err);
                }
            }
            Err(_) => {
                return Err(format!("actuator thread for the {side} side panicked").into());
            }
        }
    }
    if estimator.join().is_err() {
        warn!("gait estimator thread panicked");
    }

    match failure {
        Some(err) => Err(Box::new(err)),
        None => Ok(()),
    }
}

/// Load the session config, falling back to built-in defaults when the
/// default path has no file yet.
fn load_session_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    match SessionConfig::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound) if path == Path::new(DEFAULT_CONFIG_PATH) => {
            warn!(
                "no session config at '{}'; running on built-in defaults",
                path.display()
            );
            Ok(SessionConfig::default())
        }
        Err(err) => Err(err),
    }
}

fn selected_sides(args: &Args) -> Result<Vec<Side>, Box<dyn std::error::Error>> {
    match &args.side {
        Some(text) => Ok(vec![text.parse::<Side>()?]),
        None => Ok(vec![Side::Left, Side::Right]),
    }
}

/// One spawned actuator and the shared state the session keeps with it.
struct SideRuntime {
    side: Side,
    estimates: Arc<EstimateSlot>,
    lifecycle: Arc<LifecycleCell>,
    join: thread::JoinHandle<Result<CycleStats, ControlError>>,
}

fn spawn_actuator(
    args: &Args,
    config: &SessionConfig,
    side: Side,
    index: usize,
    device_id: u32,
    clock: SessionClock,
    handle: &Arc<SessionHandle>,
) -> Result<SideRuntime, Box<dyn std::error::Error>> {
    let estimates = Arc::new(EstimateSlot::new());
    let lifecycle = Arc::new(LifecycleCell::new());

    // Scripted boot: donning wiggle, stillness for zeroing, then steady
    // walking. A vendor transport plugs in here instead.
    let transport = SimulatedExo::new(device_id).with_walking(WALK_FROM_SAMPLE, DEMO_STRIDE_S);

    let thread_config = config.clone();
    let thread_estimates = Arc::clone(&estimates);
    let thread_lifecycle = Arc::clone(&lifecycle);
    let thread_handle = Arc::clone(handle);
    let calibration_dir = args.calibration_dir.clone();
    let cpu_core = args.cpu_core + index;
    let rt_priority = args.rt_priority;

    let join = thread::Builder::new()
        .name(format!("actuator-{side}"))
        .spawn(move || {
            rt::rt_setup(cpu_core, rt_priority)?;
            let mut actuator = ActuatorControlThread::new(
                &thread_config,
                Box::new(transport),
                clock,
                thread_estimates,
                thread_handle,
                thread_lifecycle,
                &calibration_dir,
            )?;
            actuator.run()
        })?;

    Ok(SideRuntime {
        side,
        estimates,
        lifecycle,
        join,
    })
}

/// Scripted treadmill cadence published into every actuator's estimate
/// slot. A live gait estimator publishes into the same slots.
fn spawn_estimator(
    actuators: &[SideRuntime],
    signals: Arc<SessionSignals>,
    clock: SessionClock,
    peak_torque_nm: f64,
) -> std::io::Result<thread::JoinHandle<()>> {
    let slots: Vec<Arc<EstimateSlot>> = actuators
        .iter()
        .map(|runtime| Arc::clone(&runtime.estimates))
        .collect();

    thread::Builder::new()
        .name("gait-estimator".into())
        .spawn(move || {
            while signals.should_continue() {
                let now_s = clock.now_s();
                let phase_s = now_s % DEMO_STRIDE_S;
                let estimate = GaitEstimate {
                    heel_strike_s: now_s - phase_s,
                    stride_period_s: DEMO_STRIDE_S,
                    peak_torque_nm,
                    in_swing: phase_s > 0.62 * DEMO_STRIDE_S,
                };
                for slot in &slots {
                    slot.publish(estimate);
                }
                thread::sleep(Duration::from_millis(10));
            }
        })
}

/// Arm assistance once every joint is zeroed, then move records from
/// the sink into the CSV logs until every lifecycle reaches `Stopped`.
fn drain_session(
    args: &Args,
    actuators: &[SideRuntime],
    signals: &SessionSignals,
    sink: &TelemetrySink,
    clock: SessionClock,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writers = Vec::new();
    if !args.no_log {
        for runtime in actuators {
            let path = args.log_dir.join(format!("session_{}.csv", runtime.side));
            writers.push((runtime.side, CsvRecordWriter::create(&path)?));
            info!(side = %runtime.side, path = %path.display(), "session log open");
        }
    }

    let mut armed = false;
    loop {
        let all_stopped = actuators
            .iter()
            .all(|runtime| runtime.lifecycle.load() == LifecycleState::Stopped);

        for (side, writer) in &mut writers {
            let records = sink.drain(*side);
            if !records.is_empty() {
                writer.append_all(&records)?;
            }
        }

        if !armed
            && actuators
                .iter()
                .all(|runtime| runtime.lifecycle.load() == LifecycleState::Paused)
        {
            info!("all joints zeroed; starting assistance");
            signals.set_mode(SessionMode::Running);
            armed = true;
        }

        if let Some(limit_s) = args.session_s {
            if clock.now_s() >= limit_s {
                signals.request_shutdown();
            }
        }

        if all_stopped {
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }

    for (_, writer) in &mut writers {
        writer.flush()?;
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
