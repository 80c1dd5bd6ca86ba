//! Sprite planes
//!
//! The same register layout drives both sprite planes and the primary plane;
//! only the context tag differs.

use tracing::{error, trace};

use super::context::{
    pack_position, pack_size, PlaneContext, SpriteContext, PLANE_ENABLE, PLANE_FORCE_BOTTOM,
    SPRITE_UPDATE_ALL,
};
use super::format::convert_format;
use super::{check_position, BufferMapper, DisplayArea, PlanePosition, PlaneType};
use crate::{Error, Result};

/// GTT offsets are in 4 KiB pages
const PAGE_SHIFT: u32 = 12;

#[derive(Debug, Clone)]
pub struct SpritePlane {
    index: u32,
    pipe: u32,
    plane_type: PlaneType,
    position: PlanePosition,
    area: DisplayArea,
    force_bottom: bool,
    context: Option<PlaneContext>,
}

impl SpritePlane {
    pub fn new(index: u32, pipe: u32) -> Self {
        Self::with_type(index, pipe, PlaneType::Sprite)
    }

    pub fn new_primary(index: u32, pipe: u32) -> Self {
        Self::with_type(index, pipe, PlaneType::Primary)
    }

    fn with_type(index: u32, pipe: u32, plane_type: PlaneType) -> Self {
        Self {
            index,
            pipe,
            plane_type,
            position: PlanePosition::default(),
            area: DisplayArea::default(),
            force_bottom: false,
            context: None,
        }
    }

    pub fn plane_type(&self) -> PlaneType {
        self.plane_type
    }

    pub fn set_position(&mut self, position: PlanePosition) {
        self.position = position;
    }

    pub fn set_display_area(&mut self, area: DisplayArea) {
        self.area = area;
    }

    /// Keep this plane below every other plane of the pipe
    pub fn set_force_bottom(&mut self, force_bottom: bool) {
        self.force_bottom = force_bottom;
    }

    /// Register image showing `mapper`'s buffer at the current position.
    ///
    /// Fails with [`Error::UnsupportedFormat`] if sprites cannot scan the
    /// format out, and with [`Error::InvalidCrop`] if the crop origin lies
    /// outside the buffer.
    pub fn compute_layout(&self, mapper: &dyn BufferMapper) -> Result<PlaneContext> {
        let pos = check_position(self.position, self.area);

        let hal_format = mapper.format();
        let Some(format) = convert_format(hal_format) else {
            error!("unsupported format {:#x}", hal_format);
            return Err(Error::UnsupportedFormat(hal_format));
        };

        let crop = mapper.crop();
        let stride = mapper.stride();
        let linoff = crop.y as u64 * stride as u64 + crop.x as u64 * format.bytes_per_pixel as u64;
        let limit = stride as u64 * mapper.height() as u64;

        // A bogus crop must not become an out of range scanout offset
        let linoff = match u32::try_from(linoff) {
            Ok(linoff) if linoff as u64 <= limit => linoff,
            _ => {
                error!("invalid source crop");
                return Err(Error::InvalidCrop { linoff, limit });
            }
        };

        let mut cntr = format.code | PLANE_ENABLE;
        if self.force_bottom {
            cntr |= PLANE_FORCE_BOTTOM;
        }

        let ctx = SpriteContext {
            update_mask: SPRITE_UPDATE_ALL,
            index: self.index,
            pipe: self.pipe,
            cntr,
            linoff,
            stride,
            pos: pack_position(pos.x, pos.y),
            size: pack_size(pos.w, pos.h),
            surf: mapper.gtt_offset_in_page(0) << PAGE_SHIFT,
            ..Default::default()
        };

        trace!(
            "cntr = {:#x}, linoff = {:#x}, stride = {:#x}, surf = {:#x}, pos = {:#x}, size = {:#x}",
            ctx.cntr,
            ctx.linoff,
            ctx.stride,
            ctx.surf,
            ctx.pos,
            ctx.size
        );

        Ok(match self.plane_type {
            PlaneType::Primary => PlaneContext::Primary(ctx),
            PlaneType::Sprite => PlaneContext::Sprite(ctx),
        })
    }

    /// Recompute the register image for a new buffer. On failure the previous
    /// image is kept.
    pub fn set_data_buffer(&mut self, mapper: &dyn BufferMapper) -> Result<()> {
        self.context = Some(self.compute_layout(mapper)?);
        Ok(())
    }

    /// Image from the last successful [`SpritePlane::set_data_buffer`]
    pub fn context(&self) -> Option<&PlaneContext> {
        self.context.as_ref()
    }
}
