//! KMS backend for a hardware composer
//!
//! Discovers which physical outputs are attached through the kernel's DRM/KMS
//! interface, turns them on and off, forwards driver-private ioctls, and
//! computes the register image that shows a buffer on a sprite plane.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Hardware composer (host)                       │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                               │
//!     detect / dpms / vendor ioctl        set_data_buffer
//!                 │                               │
//! ┌───────────────────────────────────┐  ┌──────────────────────┐
//! │  Drm                              │  │  SpritePlane         │
//! │  ┌─────────────┐ ┌─────────────┐  │  │  (format, crop,      │
//! │  │ Output      │ │ Power       │  │  │   position packing)  │
//! │  │ Registry    │ │ (DPMS)      │  │  └──────────────────────┘
//! │  └─────────────┘ └─────────────┘  │
//! └───────────────────────────────────┘
//!                 │
//!          KmsDevice (DRM ioctls)
//!                 │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Kernel DRM driver (/dev/dri/cardN)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use kms_hwcomposer::{DisplayDevice, DisplayPower, Drm, DrmConfig};
//!
//! let drm = Drm::open(&DrmConfig::load()?);
//! drm.detect()?;
//! if drm.output_connected(DisplayDevice::External) {
//!     drm.set_dpms_mode(DisplayDevice::External, DisplayPower::On)?;
//! }
//! ```

pub mod config;
pub mod drm;
pub mod error;
pub mod kms;
pub mod outputs;
pub mod plane;
pub mod power;

pub use config::DrmConfig;
pub use drm::Drm;
pub use error::Error;
pub use kms::{DrmCard, KmsDevice};
pub use outputs::{DisplayDevice, Output};
pub use plane::{BufferMapper, PlaneContext, SpritePlane};
pub use power::DisplayPower;

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;
