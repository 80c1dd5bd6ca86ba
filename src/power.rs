//! Connector power control through the standard DPMS property

use tracing::{debug, error};

use crate::kms::{Connector, KmsDevice};
use crate::outputs::DisplayDevice;
use crate::{Error, Result};

/// DPMS property values (drm_mode.h)
pub const DRM_MODE_DPMS_ON: u64 = 0;
pub const DRM_MODE_DPMS_OFF: u64 = 3;

const DPMS_PROPERTY: &str = "DPMS";

/// Display power modes as numbered by the host compositor
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPower {
    Off = 0,
    On = 1,
    Standby = 2,
}

impl TryFrom<i32> for DisplayPower {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(DisplayPower::Off),
            1 => Ok(DisplayPower::On),
            2 => Ok(DisplayPower::Standby),
            _ => Err(Error::InvalidMode(value)),
        }
    }
}

impl DisplayPower {
    /// Kernel DPMS value; only on and off can be driven through the connector
    pub fn dpms_value(self) -> Option<u64> {
        match self {
            DisplayPower::On => Some(DRM_MODE_DPMS_ON),
            DisplayPower::Off => Some(DRM_MODE_DPMS_OFF),
            DisplayPower::Standby => None,
        }
    }
}

/// Find the connector's DPMS property and set it to `value`.
///
/// Every property descriptor looked up here is dropped before the next one is
/// queried, whether or not it matched.
pub(crate) fn set_connector_dpms<D: KmsDevice>(
    device: &D,
    output: DisplayDevice,
    connector: &Connector,
    value: u64,
) -> Result<()> {
    for &prop_id in &connector.props {
        let prop = match device.property(prop_id) {
            Ok(prop) => prop,
            Err(err) => {
                debug!("skipping property {} of connector {}: {}", prop_id, connector.id, err);
                continue;
            }
        };

        if prop.name != DPMS_PROPERTY {
            continue;
        }

        return device
            .set_connector_property(connector.id, prop.id, value)
            .map_err(|err| {
                error!("unable to set DPMS {} on connector {}: {}", value, connector.id, err);
                Error::kms("DPMS property", err)
            });
    }

    error!("connector {} has no DPMS property", connector.id);
    Err(Error::NoDpmsProperty(output))
}
