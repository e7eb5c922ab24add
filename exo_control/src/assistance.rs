//! Stance-phase assistance torque profile.
//!
//! The desired ankle torque over one stride is a spline through four
//! configured knots, all in percent of stride: flat holding torque from
//! heel strike, a smooth rise starting `rise_pct` before the peak
//! instant, the peak at `peak_pct`, a smooth fall over `fall_pct`, then
//! holding torque through toe-off and swing. The normalized shape is
//! precomputed into a table once; per cycle the sample is scaled
//! between the holding floor and the live peak-torque setting.

use tracing::debug;

use exo_common::config::ProfileConfig;

/// Cubic ease with zero slope at both ends.
fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Precomputed assistance torque shape for one actuator.
#[derive(Debug, Clone)]
pub struct AssistanceProfile {
    /// Normalized shape over [0, 100] percent of stride, 0 = holding,
    /// 1 = peak.
    table: Vec<f64>,
    holding_torque_nm: f64,
    peak_torque_limit_nm: f64,
}

impl AssistanceProfile {
    pub fn from_config(config: &ProfileConfig) -> Self {
        let onset_pct = config.peak_pct - config.rise_pct;
        let settle_pct = config.peak_pct + config.fall_pct;

        let mut table = Vec::with_capacity(config.granularity);
        for i in 0..config.granularity {
            let pct = 100.0 * i as f64 / (config.granularity - 1) as f64;
            let shape = if pct < onset_pct || pct >= config.toe_off_pct {
                0.0
            } else if pct < config.peak_pct {
                smoothstep((pct - onset_pct) / config.rise_pct)
            } else if pct < settle_pct {
                1.0 - smoothstep((pct - config.peak_pct) / config.fall_pct)
            } else {
                0.0
            };
            table.push(shape);
        }

        debug!(
            "assistance profile: rise {}%..{}%, fall to {}%, toe-off {}%, {} samples",
            onset_pct,
            config.peak_pct,
            settle_pct,
            config.toe_off_pct,
            table.len(),
        );

        Self {
            table,
            holding_torque_nm: config.holding_torque_nm,
            peak_torque_limit_nm: config.peak_torque_limit_nm,
        }
    }

    /// Torque held through swing and outside the assistance window [Nm].
    #[inline]
    pub fn holding_torque_nm(&self) -> f64 {
        self.holding_torque_nm
    }

    /// Desired ankle torque for this instant of the stride [Nm].
    ///
    /// `peak_torque_nm` is the live setting from the gait estimate; it
    /// is capped by the session ceiling, and a peak below the holding
    /// floor flattens the profile rather than dipping under it. Stale
    /// estimates (elapsed past one stride) fall back to holding torque.
    pub fn torque_nm(
        &self,
        elapsed_s: f64,
        stride_period_s: f64,
        peak_torque_nm: f64,
        in_swing: bool,
    ) -> f64 {
        if in_swing || stride_period_s <= 0.0 {
            return self.holding_torque_nm;
        }

        let pct = 100.0 * elapsed_s / stride_period_s;
        if !(0.0..=100.0).contains(&pct) {
            return self.holding_torque_nm;
        }

        let index = (pct / 100.0 * (self.table.len() - 1) as f64).round() as usize;
        let index = index.min(self.table.len() - 1);

        let peak = peak_torque_nm.min(self.peak_torque_limit_nm);
        let span = (peak - self.holding_torque_nm).max(0.0);
        self.holding_torque_nm + span * self.table[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 101 samples puts the table exactly on whole stride percents.
    fn profile() -> AssistanceProfile {
        AssistanceProfile::from_config(&ProfileConfig {
            granularity: 101,
            ..ProfileConfig::default()
        })
    }

    #[test]
    fn swing_holds_the_floor() {
        let profile = profile();
        assert_eq!(profile.torque_nm(0.3, 1.0, 10.0, true), 2.0);
    }

    #[test]
    fn early_stance_holds_the_floor() {
        let profile = profile();
        // 20% of stride, before the 39% onset.
        assert_eq!(profile.torque_nm(0.20, 1.0, 10.0, false), 2.0);
    }

    #[test]
    fn peak_instant_reaches_the_peak() {
        let profile = profile();
        let torque = profile.torque_nm(0.54, 1.0, 10.0, false);
        assert!((torque - 10.0).abs() < 1e-9);
    }

    #[test]
    fn rise_is_monotone() {
        let profile = profile();
        let a = profile.torque_nm(0.42, 1.0, 10.0, false);
        let b = profile.torque_nm(0.47, 1.0, 10.0, false);
        let c = profile.torque_nm(0.52, 1.0, 10.0, false);
        assert!(2.0 < a && a < b && b < c && c <= 10.0);
    }

    #[test]
    fn late_stance_returns_to_the_floor() {
        let profile = profile();
        // Past peak + fall (66%), before and after toe-off.
        assert_eq!(profile.torque_nm(0.66, 1.0, 10.0, false), 2.0);
        assert_eq!(profile.torque_nm(0.80, 1.0, 10.0, false), 2.0);
    }

    #[test]
    fn stale_estimate_holds_the_floor() {
        let profile = profile();
        // A stride past its own period means the estimate went stale.
        assert_eq!(profile.torque_nm(1.5, 1.0, 10.0, false), 2.0);
        assert_eq!(profile.torque_nm(0.5, 0.0, 10.0, false), 2.0);
    }

    #[test]
    fn session_ceiling_caps_the_peak() {
        let profile = profile();
        let torque = profile.torque_nm(0.54, 1.0, 40.0, false);
        assert!((torque - 25.0).abs() < 1e-9);
    }

    #[test]
    fn peak_below_holding_never_dips() {
        let profile = profile();
        for pct in [0.40, 0.54, 0.60] {
            assert_eq!(profile.torque_nm(pct, 1.0, 0.0, false), 2.0);
        }
    }

    #[test]
    fn shape_scales_with_stride_period() {
        let profile = profile();
        // The same stride fraction at two different cadences.
        let slow = profile.torque_nm(0.54 * 1.4, 1.4, 10.0, false);
        let fast = profile.torque_nm(0.54 * 0.8, 0.8, 10.0, false);
        assert!((slow - fast).abs() < 1e-9);
    }
}
