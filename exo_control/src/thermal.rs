//! Lumped thermal model of the motor winding.
//!
//! The winding temperature is not measurable on this motor, so it is
//! integrated every cycle from the commanded current and the measured
//! case temperature: resistive heating (with the copper resistance
//! rising as the winding heats) minus conduction into the case, over
//! the winding heat capacity. The integration step comes from the
//! measured loop cadence, not the wall clock, so the estimate stays
//! consistent with the control loop that feeds it.
//!
//! Crossing a soft threshold raises a warning flag; crossing a hard
//! threshold latches a shutdown that the control thread turns into a
//! zero command every cycle. The latch survives cooling and clears only
//! through [`ThermalSafetyModel::reset`], which refuses while either
//! measurement is still over its hard limit.

use tracing::{error, info, warn};

use exo_common::config::ThermalConfig;
use exo_common::fault::CycleFault;

/// Winding temperature estimator and threshold supervisor for one motor.
#[derive(Debug)]
pub struct ThermalSafetyModel {
    config: ThermalConfig,
    winding_temp_c: f64,
    case_temp_c: f64,
    /// Flags that latched a shutdown; sticky until reset.
    latched: CycleFault,
    /// Soft excursions currently active, for edge-triggered logging.
    soft_active: CycleFault,
    seeded: bool,
}

impl ThermalSafetyModel {
    pub fn new(config: ThermalConfig) -> Self {
        Self {
            winding_temp_c: config.reference_temp_c,
            case_temp_c: config.reference_temp_c,
            config,
            latched: CycleFault::empty(),
            soft_active: CycleFault::empty(),
            seeded: false,
        }
    }

    /// Advance the winding estimate by one cycle and evaluate limits.
    ///
    /// Returns the thermal flags for this cycle's record: soft flags
    /// while a measurement sits over its warning threshold, hard flags
    /// from the moment they latch until reset.
    pub fn update(&mut self, case_temp_c: f64, commanded_ma: i32, dt_s: f64) -> CycleFault {
        self.case_temp_c = case_temp_c;
        if !self.seeded {
            // Power-on: the winding has had time to equalize with the case.
            self.winding_temp_c = case_temp_c;
            self.seeded = true;
        }

        if dt_s > 0.0 && dt_s.is_finite() {
            let amps = commanded_ma as f64 / 1000.0;
            let resistance_ohm = self.config.winding_resistance_ohm
                * (1.0
                    + self.config.resistance_temp_coeff_per_k
                        * (self.winding_temp_c - self.config.reference_temp_c));
            let heating_w = amps * amps * resistance_ohm;
            let loss_w =
                (self.winding_temp_c - case_temp_c) / self.config.winding_to_case_resistance_k_per_w;
            self.winding_temp_c +=
                dt_s * (heating_w - loss_w) / self.config.winding_heat_capacity_j_per_k;
        }

        self.latch_if_hard(
            case_temp_c >= self.config.case_hard_c,
            CycleFault::THERMAL_HARD_CASE,
            "case",
            case_temp_c,
            self.config.case_hard_c,
        );
        self.latch_if_hard(
            self.winding_temp_c >= self.config.winding_hard_c,
            CycleFault::THERMAL_HARD_WINDING,
            "winding",
            self.winding_temp_c,
            self.config.winding_hard_c,
        );

        let mut faults = self.latched;
        faults |= self.soft_flag(
            case_temp_c >= self.config.case_soft_c,
            CycleFault::THERMAL_SOFT_CASE,
            "case",
            case_temp_c,
            self.config.case_soft_c,
        );
        faults |= self.soft_flag(
            self.winding_temp_c >= self.config.winding_soft_c,
            CycleFault::THERMAL_SOFT_WINDING,
            "winding",
            self.winding_temp_c,
            self.config.winding_soft_c,
        );
        faults
    }

    fn latch_if_hard(&mut self, over: bool, flag: CycleFault, what: &str, value: f64, limit: f64) {
        if over && !self.latched.contains(flag) {
            self.latched |= flag;
            error!("{what} temperature {value:.1} °C crossed the {limit:.1} °C hard limit, shutdown latched");
        }
    }

    fn soft_flag(
        &mut self,
        over: bool,
        flag: CycleFault,
        what: &str,
        value: f64,
        limit: f64,
    ) -> CycleFault {
        if over {
            if !self.soft_active.contains(flag) {
                self.soft_active |= flag;
                warn!("{what} temperature {value:.1} °C over the {limit:.1} °C warning threshold");
            }
            flag
        } else {
            self.soft_active &= !flag;
            CycleFault::empty()
        }
    }

    /// Whether a hard limit has latched a shutdown.
    #[inline]
    pub fn is_latched(&self) -> bool {
        !self.latched.is_empty()
    }

    #[inline]
    pub fn winding_temp_c(&self) -> f64 {
        self.winding_temp_c
    }

    #[inline]
    pub fn case_temp_c(&self) -> f64 {
        self.case_temp_c
    }

    /// Operator-initiated latch clear.
    ///
    /// Refused while either measurement still sits over its hard limit;
    /// returns whether the latch is clear afterwards.
    pub fn reset(&mut self) -> bool {
        if self.case_temp_c >= self.config.case_hard_c
            || self.winding_temp_c >= self.config.winding_hard_c
        {
            warn!(
                "thermal reset refused: case {:.1} °C, winding estimate {:.1} °C still over limit",
                self.case_temp_c, self.winding_temp_c
            );
            return false;
        }
        if !self.latched.is_empty() {
            info!("thermal shutdown latch cleared");
        }
        self.latched = CycleFault::empty();
        true
    }
}
