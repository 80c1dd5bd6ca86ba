//! Per-output hardware state
//!
//! Each logical output keeps the connector, encoder, CRTC and framebuffer it
//! was last resolved to. The registry has one fixed slot per DRM-backed
//! display; it is only ever touched under the [`Drm`](crate::Drm) lock.

use crate::kms::{Connection, Connector, Crtc, Encoder, Framebuffer, KmsDevice};
use crate::Error;

/// Display devices as numbered by the host compositor
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayDevice {
    Primary = 0,
    External = 1,
    Virtual = 2,
}

impl TryFrom<i32> for DisplayDevice {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Error> {
        match value {
            0 => Ok(DisplayDevice::Primary),
            1 => Ok(DisplayDevice::External),
            2 => Ok(DisplayDevice::Virtual),
            _ => Err(Error::InvalidDevice(value)),
        }
    }
}

const OUTPUT_PRIMARY: usize = 0;
const OUTPUT_EXTERNAL: usize = 1;
pub const OUTPUT_MAX: usize = 2;

/// Registry slot of a display device. Virtual displays have no DRM output.
pub(crate) fn output_index(device: DisplayDevice) -> Option<usize> {
    match device {
        DisplayDevice::Primary => Some(OUTPUT_PRIMARY),
        DisplayDevice::External => Some(OUTPUT_EXTERNAL),
        DisplayDevice::Virtual => None,
    }
}

/// Hardware state of one display output
pub struct Output<D: KmsDevice> {
    connector: Option<D::Connector>,
    encoder: Option<D::Encoder>,
    crtc: Option<D::Crtc>,
    fb: Option<D::Framebuffer>,
    connected: bool,
}

impl<D: KmsDevice> Default for Output<D> {
    fn default() -> Self {
        Self {
            connector: None,
            encoder: None,
            crtc: None,
            fb: None,
            connected: false,
        }
    }
}

impl<D: KmsDevice> Output<D> {
    pub fn connector(&self) -> Option<&Connector> {
        self.connector.as_deref()
    }

    pub fn encoder(&self) -> Option<&Encoder> {
        self.encoder.as_deref()
    }

    pub fn crtc(&self) -> Option<&Crtc> {
        self.crtc.as_deref()
    }

    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.fb.as_deref()
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Start a new generation: drop all four old descriptors and keep only
    /// the freshly queried connector.
    pub(crate) fn reset(&mut self, connector: D::Connector) {
        self.connected = false;
        self.encoder = None;
        self.crtc = None;
        self.fb = None;
        self.connector = Some(connector);
    }

    pub(crate) fn set_encoder(&mut self, encoder: D::Encoder) {
        self.encoder = Some(encoder);
    }

    pub(crate) fn set_crtc(&mut self, crtc: D::Crtc) {
        self.crtc = Some(crtc);
    }

    pub(crate) fn set_framebuffer(&mut self, fb: D::Framebuffer) {
        self.fb = Some(fb);
    }

    pub(crate) fn update_connected(&mut self) {
        self.connected = self
            .connector()
            .is_some_and(|c| c.connection == Connection::Connected)
            && self.encoder.is_some()
            && self.crtc.is_some()
            && self.fb.is_some();
    }
}

/// Fixed set of outputs indexed by slot
pub struct OutputRegistry<D: KmsDevice> {
    outputs: [Output<D>; OUTPUT_MAX],
}

impl<D: KmsDevice> Default for OutputRegistry<D> {
    fn default() -> Self {
        Self {
            outputs: [Output::default(), Output::default()],
        }
    }
}

impl<D: KmsDevice> OutputRegistry<D> {
    pub fn get(&self, device: DisplayDevice) -> Option<&Output<D>> {
        output_index(device).map(|i| &self.outputs[i])
    }

    pub(crate) fn get_mut(&mut self, device: DisplayDevice) -> Option<&mut Output<D>> {
        output_index(device).map(move |i| &mut self.outputs[i])
    }

    pub fn is_connected(&self, device: DisplayDevice) -> bool {
        self.get(device).is_some_and(Output::connected)
    }
}
