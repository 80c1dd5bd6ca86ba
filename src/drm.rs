//! DRM device used by the hardware composer
//!
//! Owns the kernel handle and the output registry. One lock serializes the
//! probe, every registry access, power changes and driver-private ioctls;
//! callers holding an output borrow through [`Drm::with_output`] must not call
//! back into the same `Drm`.

use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error, info, trace};

use crate::config::DrmConfig;
use crate::kms::{DrmCard, KmsDevice};
use crate::outputs::{DisplayDevice, Output, OutputRegistry};
use crate::power::{self, DisplayPower};
use crate::{Error, Result};

pub struct Drm<D: KmsDevice = DrmCard> {
    device: Option<D>,
    config: DrmConfig,
    outputs: Mutex<OutputRegistry<D>>,
}

impl Drm<DrmCard> {
    /// Open the configured DRM node.
    ///
    /// Failing to open is not fatal here: the returned device reports
    /// [`Error::NotInitialized`] from every operation.
    pub fn open(config: &DrmConfig) -> Self {
        let device = match DrmCard::open(&config.device) {
            Ok(card) => Some(card),
            Err(err) => {
                error!("drmOpen {} failed: {}", config.device.display(), err);
                None
            }
        };
        Self::with_device(device, config)
    }
}

impl<D: KmsDevice> Drm<D> {
    pub fn with_device(device: Option<D>, config: &DrmConfig) -> Self {
        debug!("drm fd = {:?}", device.as_ref().map(AsRawFd::as_raw_fd));
        Self {
            device,
            config: config.clone(),
            outputs: Mutex::new(OutputRegistry::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, OutputRegistry<D>>> {
        self.outputs.lock().map_err(|_| Error::Poisoned)
    }

    fn device(&self) -> Result<&D> {
        self.device.as_ref().ok_or_else(|| {
            error!("drm is not initialized");
            Error::NotInitialized
        })
    }

    /// Query the kernel and rebuild the state of every output whose
    /// connector is present.
    ///
    /// Connectors that cannot be queried or whose type is not configured are
    /// skipped. For a configured connector the previous descriptors are
    /// released, then encoder, CRTC and framebuffer are resolved in turn; the
    /// first failure leaves the rest empty and the output disconnected.
    pub fn detect(&self) -> Result<()> {
        let mut outputs = self.lock()?;
        let card = self.device()?;

        let resources = card.resources().map_err(|err| {
            error!("fail to get drm resources, error: {}", err);
            Error::kms("resources", err)
        })?;

        for &connector_id in &resources.connectors {
            let connector = match card.connector(connector_id) {
                Ok(connector) => connector,
                Err(err) => {
                    error!("failed to get drm connector {}: {}", connector_id, err);
                    continue;
                }
            };

            let Some(device) = self.config.display_for_connector(connector.connector_type) else {
                trace!(
                    "ignoring connector {} of type {}",
                    connector_id,
                    connector.connector_type
                );
                continue;
            };
            trace!("got {:?} connector {}", device, connector_id);

            let Some(output) = outputs.get_mut(device) else {
                continue;
            };

            let encoder_id = connector.encoder_id;
            output.reset(connector);
            Self::resolve(card, output, encoder_id);
            output.update_connected();

            debug!("{:?} output connected: {}", device, output.connected());
        }

        info!(
            "drm detect: primary connected {}, external connected {}",
            outputs.is_connected(DisplayDevice::Primary),
            outputs.is_connected(DisplayDevice::External)
        );
        Ok(())
    }

    fn resolve(device: &D, output: &mut Output<D>, encoder_id: u32) {
        let encoder = match device.encoder(encoder_id) {
            Ok(encoder) => encoder,
            Err(err) => {
                error!("failed to get drm encoder {}: {}", encoder_id, err);
                return;
            }
        };
        let crtc_id = encoder.crtc_id;
        output.set_encoder(encoder);

        let crtc = match device.crtc(crtc_id) {
            Ok(crtc) => crtc,
            Err(err) => {
                error!("failed to get drm crtc {}: {}", crtc_id, err);
                return;
            }
        };
        let fb_id = crtc.buffer_id;
        output.set_crtc(crtc);

        match device.framebuffer(fb_id) {
            Ok(fb) => output.set_framebuffer(fb),
            Err(err) => error!("failed to get fb info {}: {}", fb_id, err),
        }
    }

    /// Run `f` on the output of `device` while holding the lock.
    ///
    /// Returns `None` for displays without a DRM output.
    pub fn with_output<R>(&self, device: DisplayDevice, f: impl FnOnce(&Output<D>) -> R) -> Option<R> {
        let outputs = self.lock().inspect_err(|err| error!("{}", err)).ok()?;
        match outputs.get(device) {
            Some(output) => Some(f(output)),
            None => {
                error!("invalid display device {:?}", device);
                None
            }
        }
    }

    pub fn output_connected(&self, device: DisplayDevice) -> bool {
        let outputs = match self.lock() {
            Ok(outputs) => outputs,
            Err(err) => {
                error!("{}", err);
                return false;
            }
        };
        if outputs.get(device).is_none() {
            error!("invalid display device {:?}", device);
            return false;
        }
        outputs.is_connected(device)
    }

    /// Switch an output on or off through its connector's DPMS property
    pub fn set_dpms_mode(&self, device: DisplayDevice, mode: DisplayPower) -> Result<()> {
        let outputs = self.lock()?;
        let card = self.device()?;

        let Some(output) = outputs.get(device) else {
            error!("invalid display device {:?}", device);
            return Err(Error::InvalidDevice(device as i32));
        };

        let Some(value) = mode.dpms_value() else {
            error!("invalid mode {:?}", mode);
            return Err(Error::InvalidMode(mode as i32));
        };

        let Some(connector) = output.connector() else {
            error!("invalid connector");
            return Err(Error::NoConnector(device));
        };

        power::set_connector_dpms(card, device, connector, value)?;
        info!("{:?} display DPMS set to {:?}", device, mode);
        Ok(())
    }

    /// [`Drm::set_dpms_mode`] with host-numbered device and mode
    pub fn set_dpms_mode_raw(&self, device: i32, mode: i32) -> Result<()> {
        let device = DisplayDevice::try_from(device).inspect_err(|_| {
            error!("invalid display device {}", device);
        })?;
        let mode = DisplayPower::try_from(mode).inspect_err(|_| {
            error!("invalid mode {}", mode);
        })?;
        self.set_dpms_mode(device, mode)
    }

    pub fn drm_fd(&self) -> Option<RawFd> {
        self.device.as_ref().map(AsRawFd::as_raw_fd)
    }

    /// Driver-private command that only passes `data` to the kernel
    pub fn write_ioctl(&self, cmd: u32, data: &[u8]) -> Result<()> {
        let _outputs = self.lock()?;
        let device = self.device()?;

        if data.is_empty() {
            error!("invalid parameters");
            return Err(Error::InvalidParameters);
        }

        device.command_write(cmd, data).map_err(|err| {
            let errno = err.raw_os_error().unwrap_or(libc::EIO);
            error!("failed to call {} ioctl with failure {}", cmd, errno);
            Error::Ioctl { cmd, errno }
        })
    }

    /// Driver-private command; the kernel may write results back into `data`
    pub fn write_read_ioctl(&self, cmd: u32, data: &mut [u8]) -> Result<()> {
        let _outputs = self.lock()?;
        let device = self.device()?;

        if data.is_empty() {
            error!("invalid parameters");
            return Err(Error::InvalidParameters);
        }

        device.command_write_read(cmd, data).map_err(|err| {
            let errno = err.raw_os_error().unwrap_or(libc::EIO);
            error!("failed to call {} ioctl with failure {}", cmd, errno);
            Error::Ioctl { cmd, errno }
        })
    }
}
