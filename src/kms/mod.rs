//! Kernel mode-setting interface
//!
//! [`KmsDevice`] is everything this crate needs from the kernel display
//! subsystem. Queries hand back owned descriptors: dropping one releases it,
//! so replacing a stored descriptor releases the previous one.
//!
//! [`DrmCard`] talks to a real DRM node through the `drm` crate.

use std::io;
use std::ops::Deref;
use std::os::unix::io::AsRawFd;

mod card;
#[cfg(test)]
pub(crate) mod fake;

pub use card::DrmCard;

/// Connector types
pub mod connector_type {
    pub const UNKNOWN: u32 = 0;
    pub const VGA: u32 = 1;
    pub const DVII: u32 = 2;
    pub const DVID: u32 = 3;
    pub const DVIA: u32 = 4;
    pub const COMPOSITE: u32 = 5;
    pub const SVIDEO: u32 = 6;
    pub const LVDS: u32 = 7;
    pub const COMPONENT: u32 = 8;
    pub const NINE_PIN_DIN: u32 = 9;
    pub const DISPLAYPORT: u32 = 10;
    pub const HDMIA: u32 = 11;
    pub const HDMIB: u32 = 12;
    pub const TV: u32 = 13;
    pub const EDP: u32 = 14;
    pub const VIRTUAL: u32 = 15;
    pub const DSI: u32 = 16;
}

/// Connection status of a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Connected,
    Disconnected,
    Unknown,
}

/// Top-level mode-setting resources
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub fbs: Vec<u32>,
    pub crtcs: Vec<u32>,
    pub connectors: Vec<u32>,
    pub encoders: Vec<u32>,
}

/// DRM mode info (matching kernel's drm_mode_modeinfo)
#[derive(Debug, Clone, Default)]
pub struct ModeInfo {
    pub clock: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub hskew: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    pub vscan: u16,
    pub vrefresh: u32,
    pub flags: u32,
    pub mode_type: u32,
    pub name: String,
}

/// Connector descriptor
#[derive(Debug, Clone)]
pub struct Connector {
    pub id: u32,
    pub encoder_id: u32,
    pub connector_type: u32,
    pub connector_type_id: u32,
    pub connection: Connection,
    pub mm_width: u32,
    pub mm_height: u32,
    pub modes: Vec<ModeInfo>,
    pub props: Vec<u32>,
    pub prop_values: Vec<u64>,
    pub encoders: Vec<u32>,
}

/// Encoder descriptor
#[derive(Debug, Clone)]
pub struct Encoder {
    pub id: u32,
    /// Zero when the encoder drives no CRTC
    pub crtc_id: u32,
}

/// CRTC descriptor
#[derive(Debug, Clone)]
pub struct Crtc {
    pub id: u32,
    pub buffer_id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// `None` when the kernel reports no valid mode
    pub mode: Option<ModeInfo>,
    pub gamma_size: u32,
}

/// Framebuffer descriptor
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
    pub bpp: u32,
    pub depth: u32,
}

/// Property descriptor
#[derive(Debug, Clone)]
pub struct Property {
    pub id: u32,
    pub name: String,
}

/// Handle to the kernel display subsystem.
///
/// Lookups return owned descriptors. Implementations release whatever backs a
/// descriptor when it is dropped.
pub trait KmsDevice: AsRawFd + Send {
    type Resources: Deref<Target = Resources>;
    type Connector: Deref<Target = Connector> + Send;
    type Encoder: Deref<Target = Encoder> + Send;
    type Crtc: Deref<Target = Crtc> + Send;
    type Framebuffer: Deref<Target = Framebuffer> + Send;
    type Property: Deref<Target = Property>;

    fn resources(&self) -> io::Result<Self::Resources>;

    fn connector(&self, connector_id: u32) -> io::Result<Self::Connector>;

    fn encoder(&self, encoder_id: u32) -> io::Result<Self::Encoder>;

    fn crtc(&self, crtc_id: u32) -> io::Result<Self::Crtc>;

    fn framebuffer(&self, fb_id: u32) -> io::Result<Self::Framebuffer>;

    fn property(&self, property_id: u32) -> io::Result<Self::Property>;

    fn set_connector_property(
        &self,
        connector_id: u32,
        property_id: u32,
        value: u64,
    ) -> io::Result<()>;

    /// Driver-private command, data flows to the kernel only
    fn command_write(&self, index: u32, data: &[u8]) -> io::Result<()>;

    /// Driver-private command, the kernel may write results back into `data`
    fn command_write_read(&self, index: u32, data: &mut [u8]) -> io::Result<()>;
}
