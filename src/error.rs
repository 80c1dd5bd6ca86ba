//! Error types for the KMS hwcomposer backend

use std::io;

use thiserror::Error;

use crate::outputs::DisplayDevice;

#[derive(Error, Debug)]
pub enum Error {
    #[error("drm is not initialized")]
    NotInitialized,

    #[error("invalid display device {0}")]
    InvalidDevice(i32),

    #[error("invalid power mode {0}")]
    InvalidMode(i32),

    #[error("invalid parameters")]
    InvalidParameters,

    #[error("no connector for {0:?} display")]
    NoConnector(DisplayDevice),

    #[error("connector of {0:?} display has no DPMS property")]
    NoDpmsProperty(DisplayDevice),

    #[error("failed to get drm {what}: {source}")]
    Kms {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to call {cmd:#x} ioctl with failure {errno}")]
    Ioctl { cmd: u32, errno: i32 },

    #[error("unsupported format {0:#x}")]
    UnsupportedFormat(i32),

    #[error("invalid source crop: linear offset {linoff:#x} exceeds {limit:#x}")]
    InvalidCrop { linoff: u64, limit: u64 },

    #[error("output registry lock poisoned")]
    Poisoned,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn kms(what: &'static str, source: io::Error) -> Self {
        Error::Kms { what, source }
    }
}
