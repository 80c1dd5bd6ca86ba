//! DRM node backed [`KmsDevice`]
//!
//! Mode-setting queries go through [`drm::control::Device`]. Driver-private
//! commands have no typed wrapper there and are issued as raw ioctls at
//! `DRM_COMMAND_BASE + index`.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::raw::{c_ulong, c_void};
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::path::Path;

use drm::control::{self, connector, Device as ControlDevice, RawResourceHandle};
use drm_ffi::drm_sys::DRM_COMMAND_BASE;
use tracing::{debug, info};

use super::{Connection, Connector, Crtc, Encoder, Framebuffer, KmsDevice, ModeInfo, Property, Resources};

// _IOC layout on Linux: dir in bits 30..32, size in 16..30, type 'd' in 8..16
const DRM_IOCTL_BASE: c_ulong = 0x64;
const IOC_WRITE: c_ulong = 1;
const IOC_READ_WRITE: c_ulong = 3;
const IOC_SIZEMASK: usize = (1 << 14) - 1;

const fn drm_command_request(dir: c_ulong, index: u32, size: usize) -> c_ulong {
    let nr = (DRM_COMMAND_BASE as c_ulong).wrapping_add(index as c_ulong) & 0xff;
    (dir << 30) | ((size as c_ulong) << 16) | (DRM_IOCTL_BASE << 8) | nr
}

/// Kernel object handle for a raw id. Zero never names an object.
fn handle<T: From<RawResourceHandle>>(id: u32) -> io::Result<T> {
    control::from_u32(id).ok_or_else(|| io::Error::from_raw_os_error(libc::ENOENT))
}

fn raw<T: Into<u32>>(handle: Option<T>) -> u32 {
    handle.map_or(0, Into::into)
}

impl From<connector::State> for Connection {
    fn from(state: connector::State) -> Self {
        match state {
            connector::State::Connected => Connection::Connected,
            connector::State::Disconnected => Connection::Disconnected,
            _ => Connection::Unknown,
        }
    }
}

impl From<&control::Mode> for ModeInfo {
    fn from(mode: &control::Mode) -> Self {
        let (hdisplay, vdisplay) = mode.size();
        let (hsync_start, hsync_end, htotal) = mode.hsync();
        let (vsync_start, vsync_end, vtotal) = mode.vsync();
        ModeInfo {
            clock: mode.clock(),
            hdisplay,
            hsync_start,
            hsync_end,
            htotal,
            hskew: mode.hskew(),
            vdisplay,
            vsync_start,
            vsync_end,
            vtotal,
            vscan: mode.vscan(),
            vrefresh: mode.vrefresh(),
            flags: mode.flags().bits(),
            mode_type: mode.mode_type().bits(),
            name: mode.name().to_string_lossy().into_owned(),
        }
    }
}

/// An open DRM card node
#[derive(Debug)]
pub struct DrmCard {
    file: File,
}

impl AsFd for DrmCard {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for DrmCard {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl drm::Device for DrmCard {}
impl ControlDevice for DrmCard {}

impl DrmCard {
    /// Open a DRM node read/write
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        info!("Opened drm device {} (fd {})", path.display(), file.as_raw_fd());
        Ok(Self { file })
    }

    fn command(&self, dir: c_ulong, index: u32, data: *mut c_void, size: usize) -> io::Result<()> {
        if size > IOC_SIZEMASK {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        let request = drm_command_request(dir, index, size);
        debug!("drm command {} ({:#x}), {} bytes", index, request, size);

        loop {
            let ret = unsafe { libc::ioctl(self.as_raw_fd(), request as _, data) };
            if ret != -1 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) | Some(libc::EAGAIN) => continue,
                _ => return Err(err),
            }
        }
    }
}

impl KmsDevice for DrmCard {
    type Resources = Box<Resources>;
    type Connector = Box<Connector>;
    type Encoder = Box<Encoder>;
    type Crtc = Box<Crtc>;
    type Framebuffer = Box<Framebuffer>;
    type Property = Box<Property>;

    fn resources(&self) -> io::Result<Box<Resources>> {
        let handles = self.resource_handles()?;

        Ok(Box::new(Resources {
            fbs: handles.framebuffers().iter().map(|&h| u32::from(h)).collect(),
            crtcs: handles.crtcs().iter().map(|&h| u32::from(h)).collect(),
            connectors: handles.connectors().iter().map(|&h| u32::from(h)).collect(),
            encoders: handles.encoders().iter().map(|&h| u32::from(h)).collect(),
        }))
    }

    fn connector(&self, connector_id: u32) -> io::Result<Box<Connector>> {
        let conn: connector::Handle = handle(connector_id)?;
        // Probe like drmModeGetConnector so hotplugged sinks show up
        let info = self.get_connector(conn, true)?;

        let mut props: Vec<u32> = Vec::new();
        let mut prop_values: Vec<u64> = Vec::new();
        for (prop, value) in self.get_properties(conn)? {
            props.push(u32::from(prop));
            prop_values.push(value);
        }

        let (mm_width, mm_height) = info.size().unwrap_or((0, 0));

        Ok(Box::new(Connector {
            id: connector_id,
            encoder_id: raw(info.current_encoder()),
            connector_type: info.interface().into(),
            connector_type_id: info.interface_id(),
            connection: info.state().into(),
            mm_width,
            mm_height,
            modes: info.modes().iter().map(ModeInfo::from).collect(),
            props,
            prop_values,
            encoders: info.encoders().iter().map(|&h| u32::from(h)).collect(),
        }))
    }

    fn encoder(&self, encoder_id: u32) -> io::Result<Box<Encoder>> {
        let info = self.get_encoder(handle(encoder_id)?)?;

        Ok(Box::new(Encoder {
            id: encoder_id,
            crtc_id: raw(info.crtc()),
        }))
    }

    fn crtc(&self, crtc_id: u32) -> io::Result<Box<Crtc>> {
        let info = self.get_crtc(handle(crtc_id)?)?;
        let mode = info.mode();
        let (width, height) = mode.map_or((0, 0), |m| {
            let (w, h) = m.size();
            (w as u32, h as u32)
        });
        let (x, y) = info.position();

        Ok(Box::new(Crtc {
            id: crtc_id,
            buffer_id: raw(info.framebuffer()),
            x,
            y,
            width,
            height,
            mode: mode.as_ref().map(ModeInfo::from),
            gamma_size: info.gamma_length(),
        }))
    }

    fn framebuffer(&self, fb_id: u32) -> io::Result<Box<Framebuffer>> {
        let info = self.get_framebuffer(handle(fb_id)?)?;
        let (width, height) = info.size();

        Ok(Box::new(Framebuffer {
            id: fb_id,
            width,
            height,
            pitch: info.pitch(),
            bpp: info.bpp(),
            depth: info.depth(),
        }))
    }

    fn property(&self, property_id: u32) -> io::Result<Box<Property>> {
        let info = self.get_property(handle(property_id)?)?;

        Ok(Box::new(Property {
            id: property_id,
            name: info.name().to_string_lossy().into_owned(),
        }))
    }

    fn set_connector_property(
        &self,
        connector_id: u32,
        property_id: u32,
        value: u64,
    ) -> io::Result<()> {
        let conn: connector::Handle = handle(connector_id)?;
        self.set_property(conn, handle(property_id)?, value)
    }

    fn command_write(&self, index: u32, data: &[u8]) -> io::Result<()> {
        // The kernel only reads through this pointer for write commands
        self.command(IOC_WRITE, index, data.as_ptr() as *mut c_void, data.len())
    }

    fn command_write_read(&self, index: u32, data: &mut [u8]) -> io::Result<()> {
        self.command(IOC_READ_WRITE, index, data.as_mut_ptr() as *mut c_void, data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_request_encoding() {
        // drmCommandWrite(fd, 0x10, data, 8)
        assert_eq!(drm_command_request(IOC_WRITE, 0x10, 8), 0x4008_6450);
        // drmCommandWriteRead(fd, 0x02, data, 16)
        assert_eq!(drm_command_request(IOC_READ_WRITE, 0x02, 16), 0xc010_6442);
    }

    #[test]
    fn test_zero_id_is_not_a_handle() {
        let err = handle::<connector::Handle>(0).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
        assert_eq!(u32::from(handle::<connector::Handle>(31).unwrap()), 31);
    }

    #[test]
    fn test_connection_from_state() {
        assert_eq!(Connection::from(connector::State::Connected), Connection::Connected);
        assert_eq!(Connection::from(connector::State::Disconnected), Connection::Disconnected);
        assert_eq!(Connection::from(connector::State::Unknown), Connection::Unknown);
    }

    #[test]
    fn test_open_missing_node_fails() {
        assert!(DrmCard::open(Path::new("/nonexistent/dri/card9")).is_err());
    }
}
