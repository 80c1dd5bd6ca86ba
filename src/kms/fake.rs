//! In-memory [`KmsDevice`] for tests
//!
//! Every descriptor handed out is counted in a [`Ledger`] when created and
//! again when dropped, so tests can check that nothing leaks or is released
//! twice.

use std::collections::HashMap;
use std::io;
use std::ops::Deref;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{Connection, Connector, Crtc, Encoder, Framebuffer, KmsDevice, Property, Resources};

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    acquired: AtomicUsize,
    released: AtomicUsize,
    kernel_calls: AtomicUsize,
}

impl Ledger {
    pub(crate) fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn live(&self) -> usize {
        self.acquired() - self.released()
    }

    pub(crate) fn kernel_calls(&self) -> usize {
        self.kernel_calls.load(Ordering::SeqCst)
    }
}

/// A descriptor whose release is recorded in the ledger
#[derive(Debug)]
pub(crate) struct Tracked<T> {
    inner: T,
    ledger: Arc<Ledger>,
}

impl<T> Tracked<T> {
    fn new(inner: T, ledger: &Arc<Ledger>) -> Self {
        ledger.acquired.fetch_add(1, Ordering::SeqCst);
        Self {
            inner,
            ledger: Arc::clone(ledger),
        }
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub fail_resources: bool,
    /// Enumeration order; ids without a descriptor fail to resolve
    pub connector_ids: Vec<u32>,
    pub connectors: HashMap<u32, Connector>,
    pub encoders: HashMap<u32, Encoder>,
    pub crtcs: HashMap<u32, Crtc>,
    pub framebuffers: HashMap<u32, Framebuffer>,
    pub properties: HashMap<u32, Property>,
    pub set_property_errno: Option<i32>,
    pub set_property_calls: Vec<(u32, u32, u64)>,
    pub command_errno: Option<i32>,
    pub commands: Vec<(u32, Vec<u8>)>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeCard {
    pub state: Arc<Mutex<FakeState>>,
    pub ledger: Arc<Ledger>,
}

fn missing() -> io::Error {
    io::Error::from_raw_os_error(libc::ENOENT)
}

impl FakeCard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn add_connector(
        &self,
        id: u32,
        connector_type: u32,
        connection: Connection,
        encoder_id: u32,
        props: Vec<u32>,
    ) {
        let mut state = self.state();
        state.connector_ids.push(id);
        state.connectors.insert(
            id,
            Connector {
                id,
                encoder_id,
                connector_type,
                connector_type_id: 1,
                connection,
                mm_width: 0,
                mm_height: 0,
                modes: Vec::new(),
                prop_values: vec![0; props.len()],
                props,
                encoders: vec![encoder_id],
            },
        );
    }

    /// Register encoder -> crtc -> framebuffer
    pub(crate) fn add_chain(&self, encoder_id: u32, crtc_id: u32, fb_id: u32) {
        let mut state = self.state();
        state.encoders.insert(
            encoder_id,
            Encoder {
                id: encoder_id,
                crtc_id,
            },
        );
        state.crtcs.insert(
            crtc_id,
            Crtc {
                id: crtc_id,
                buffer_id: fb_id,
                x: 0,
                y: 0,
                width: 1080,
                height: 1920,
                mode: None,
                gamma_size: 256,
            },
        );
        state.framebuffers.insert(
            fb_id,
            Framebuffer {
                id: fb_id,
                width: 1080,
                height: 1920,
                pitch: 1080 * 4,
                bpp: 32,
                depth: 24,
            },
        );
    }

    pub(crate) fn add_property(&self, id: u32, name: &str) {
        self.state().properties.insert(
            id,
            Property {
                id,
                name: name.to_string(),
            },
        );
    }

    fn lookup<T: Clone>(&self, map: impl FnOnce(&FakeState) -> Option<&T>) -> io::Result<Tracked<T>> {
        self.ledger.kernel_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        let inner = map(&*state).cloned().ok_or_else(missing)?;
        Ok(Tracked::new(inner, &self.ledger))
    }
}

impl AsRawFd for FakeCard {
    fn as_raw_fd(&self) -> RawFd {
        42
    }
}

impl KmsDevice for FakeCard {
    type Resources = Tracked<Resources>;
    type Connector = Tracked<Connector>;
    type Encoder = Tracked<Encoder>;
    type Crtc = Tracked<Crtc>;
    type Framebuffer = Tracked<Framebuffer>;
    type Property = Tracked<Property>;

    fn resources(&self) -> io::Result<Tracked<Resources>> {
        self.ledger.kernel_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.fail_resources {
            return Err(io::Error::from_raw_os_error(libc::EACCES));
        }
        let resources = Resources {
            connectors: state.connector_ids.clone(),
            encoders: state.encoders.keys().copied().collect(),
            crtcs: state.crtcs.keys().copied().collect(),
            fbs: state.framebuffers.keys().copied().collect(),
            ..Default::default()
        };
        Ok(Tracked::new(resources, &self.ledger))
    }

    fn connector(&self, connector_id: u32) -> io::Result<Tracked<Connector>> {
        self.lookup(|s| s.connectors.get(&connector_id))
    }

    fn encoder(&self, encoder_id: u32) -> io::Result<Tracked<Encoder>> {
        self.lookup(|s| s.encoders.get(&encoder_id))
    }

    fn crtc(&self, crtc_id: u32) -> io::Result<Tracked<Crtc>> {
        self.lookup(|s| s.crtcs.get(&crtc_id))
    }

    fn framebuffer(&self, fb_id: u32) -> io::Result<Tracked<Framebuffer>> {
        self.lookup(|s| s.framebuffers.get(&fb_id))
    }

    fn property(&self, property_id: u32) -> io::Result<Tracked<Property>> {
        self.lookup(|s| s.properties.get(&property_id))
    }

    fn set_connector_property(
        &self,
        connector_id: u32,
        property_id: u32,
        value: u64,
    ) -> io::Result<()> {
        self.ledger.kernel_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.set_property_calls.push((connector_id, property_id, value));
        match state.set_property_errno {
            Some(errno) => Err(io::Error::from_raw_os_error(errno)),
            None => Ok(()),
        }
    }

    fn command_write(&self, index: u32, data: &[u8]) -> io::Result<()> {
        self.ledger.kernel_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.commands.push((index, data.to_vec()));
        match state.command_errno {
            Some(errno) => Err(io::Error::from_raw_os_error(errno)),
            None => Ok(()),
        }
    }

    fn command_write_read(&self, index: u32, data: &mut [u8]) -> io::Result<()> {
        self.ledger.kernel_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.commands.push((index, data.to_vec()));
        if let Some(errno) = state.command_errno {
            return Err(io::Error::from_raw_os_error(errno));
        }
        // Echo back with every byte inverted so callers can see the write-back
        for b in data.iter_mut() {
            *b = !*b;
        }
        Ok(())
    }
}
