//! Device id → side/sign registry.
//!
//! A physical boot announces itself only by its transport id. The
//! registry maps that id to the side it is worn on and the sign
//! conventions that make its encoders read in the anatomical frame.

use serde::{Deserialize, Serialize};
use tracing::debug;

use exo_common::config::{ConfigError, DeviceIdentityConfig};
use exo_common::state::Side;

/// Identity of one physical device: where it is worn and how its
/// sensors are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub side: Side,
    /// +1/-1 mapping motor rotation to plantarflexion torque.
    pub motor_sign: i32,
    /// +1/-1 mapping the ankle encoder to dorsiflexion-positive angles.
    pub ankle_encoder_sign: i32,
}

/// Lookup table from transport id to [`DeviceIdentity`].
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    entries: Vec<(u32, DeviceIdentity)>,
}

impl IdentityRegistry {
    /// Build the registry from the configured device table.
    ///
    /// The table is assumed to have passed config validation; this
    /// re-checks the invariants that would corrupt lookups.
    pub fn from_config(rows: &[DeviceIdentityConfig]) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();
        for row in rows {
            if row.motor_sign.abs() != 1 || row.ankle_encoder_sign.abs() != 1 {
                return Err(ConfigError::ValidationError(format!(
                    "device signs for side '{}' must be +1 or -1",
                    row.side
                )));
            }
            let identity = DeviceIdentity {
                side: row.side,
                motor_sign: row.motor_sign,
                ankle_encoder_sign: row.ankle_encoder_sign,
            };
            for id in &row.ids {
                if entries.iter().any(|(known, _)| known == id) {
                    return Err(ConfigError::ValidationError(format!(
                        "device id {id} appears more than once"
                    )));
                }
                debug!("identity registry: device {id} -> {}", row.side);
                entries.push((*id, identity));
            }
        }
        Ok(Self { entries })
    }

    /// Identity for a transport id, if the table knows it.
    pub fn lookup(&self, device_id: u32) -> Option<&DeviceIdentity> {
        self.entries
            .iter()
            .find(|(id, _)| *id == device_id)
            .map(|(_, identity)| identity)
    }

    /// First configured id for a side, used when a backend must be
    /// constructed before any hardware announces itself.
    pub fn first_id_for_side(&self, side: Side) -> Option<u32> {
        self.entries
            .iter()
            .find(|(_, identity)| identity.side == side)
            .map(|(id, _)| *id)
    }

    /// Number of known transport ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rows() -> Vec<DeviceIdentityConfig> {
        vec![
            DeviceIdentityConfig {
                ids: vec![77, 17584],
                side: Side::Right,
                motor_sign: -1,
                ankle_encoder_sign: -1,
            },
            DeviceIdentityConfig {
                ids: vec![888, 48390],
                side: Side::Left,
                motor_sign: -1,
                ankle_encoder_sign: 1,
            },
        ]
    }

    #[test]
    fn lookup_finds_every_configured_id() {
        let registry = IdentityRegistry::from_config(&test_rows()).unwrap();
        assert_eq!(registry.len(), 4);

        let right = registry.lookup(17584).unwrap();
        assert_eq!(right.side, Side::Right);
        assert_eq!(right.ankle_encoder_sign, -1);

        let left = registry.lookup(888).unwrap();
        assert_eq!(left.side, Side::Left);
        assert_eq!(left.ankle_encoder_sign, 1);
    }

    #[test]
    fn unknown_id_yields_none() {
        let registry = IdentityRegistry::from_config(&test_rows()).unwrap();
        assert!(registry.lookup(12345).is_none());
    }

    #[test]
    fn first_id_for_side_follows_table_order() {
        let registry = IdentityRegistry::from_config(&test_rows()).unwrap();
        assert_eq!(registry.first_id_for_side(Side::Right), Some(77));
        assert_eq!(registry.first_id_for_side(Side::Left), Some(888));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut rows = test_rows();
        rows[1].ids.push(77);
        let result = IdentityRegistry::from_config(&rows);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn bad_sign_rejected() {
        let mut rows = test_rows();
        rows[0].motor_sign = 0;
        let result = IdentityRegistry::from_config(&rows);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn empty_registry_has_no_sides() {
        let registry = IdentityRegistry::from_config(&[]).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.first_id_for_side(Side::Left), None);
    }
}
