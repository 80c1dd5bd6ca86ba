//! Plane register images
//!
//! The field layout and bit packing mirror the display controller's sprite
//! registers and must not change.

use bytemuck::{Pod, Zeroable};

use super::PlaneType;

/// Update mask bits
pub const SPRITE_UPDATE_SURFACE: u32 = 0x0000_0001;
pub const SPRITE_UPDATE_CONTROL: u32 = 0x0000_0002;
pub const SPRITE_UPDATE_POSITION: u32 = 0x0000_0004;
pub const SPRITE_UPDATE_SIZE: u32 = 0x0000_0008;
pub const SPRITE_UPDATE_WAIT_VBLANK: u32 = 0x0000_0010;
pub const SPRITE_UPDATE_CONSTALPHA: u32 = 0x0000_0020;
pub const SPRITE_UPDATE_ALL: u32 = 0x0000_003f;

/// Control register bits
pub const PLANE_ENABLE: u32 = 0x8000_0000;
pub const PLANE_FORCE_BOTTOM: u32 = 0x0000_0004;

const FIELD_MASK: u32 = 0xfff;

/// Sprite plane registers
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SpriteContext {
    pub update_mask: u32,
    pub index: u32,
    pub pipe: u32,
    pub cntr: u32,
    pub linoff: u32,
    pub stride: u32,
    pub pos: u32,
    pub size: u32,
    pub keyminval: u32,
    pub keymask: u32,
    pub surf: u32,
    pub keymaxval: u32,
    pub tileoff: u32,
    pub contalm: u32,
}

impl SpriteContext {
    pub fn force_bottom(&self) -> bool {
        self.cntr & PLANE_FORCE_BOTTOM != 0
    }
}

/// Y in bits 16..28, x in bits 0..12
pub fn pack_position(x: i32, y: i32) -> u32 {
    ((y as u32 & FIELD_MASK) << 16) | (x as u32 & FIELD_MASK)
}

/// The hardware takes sizes as count minus one
pub fn pack_size(w: i32, h: i32) -> u32 {
    ((h.wrapping_sub(1) as u32 & FIELD_MASK) << 16) | (w.wrapping_sub(1) as u32 & FIELD_MASK)
}

/// Register image tagged with the kind of plane it programs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneContext {
    Sprite(SpriteContext),
    Primary(SpriteContext),
}

impl PlaneContext {
    pub fn plane_type(&self) -> PlaneType {
        match self {
            PlaneContext::Sprite(_) => PlaneType::Sprite,
            PlaneContext::Primary(_) => PlaneType::Primary,
        }
    }

    pub fn sprite(&self) -> &SpriteContext {
        match self {
            PlaneContext::Sprite(ctx) | PlaneContext::Primary(ctx) => ctx,
        }
    }

    /// Type word followed by the register record, in native byte order
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = (self.plane_type() as u32).to_ne_bytes().to_vec();
        bytes.extend_from_slice(bytemuck::bytes_of(self.sprite()));
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_position() {
        assert_eq!(pack_position(100, 200), 0x00c8_0064);
        assert_eq!(pack_position(0x1388, 0x2001), 0x0001_0388);
    }

    #[test]
    fn test_pack_size() {
        assert_eq!(pack_size(640, 480), 0x01df_027f);
        assert_eq!(pack_size(4097, 1), 0x0000_0000);
        // Zero wraps to the all-ones field, as in hardware
        assert_eq!(pack_size(0, 0), 0x0fff_0fff);
    }

    #[test]
    fn test_to_bytes_layout() {
        let ctx = SpriteContext {
            update_mask: SPRITE_UPDATE_ALL,
            cntr: 0xbc00_0000,
            ..Default::default()
        };
        let bytes = PlaneContext::Primary(ctx).to_bytes();

        assert_eq!(bytes.len(), 4 + 14 * 4);
        assert_eq!(&bytes[0..4], &(PlaneType::Primary as u32).to_ne_bytes());
        assert_eq!(&bytes[4..8], &SPRITE_UPDATE_ALL.to_ne_bytes());
        assert_eq!(&bytes[16..20], &0xbc00_0000_u32.to_ne_bytes());
    }

    #[test]
    fn test_force_bottom_bit() {
        let mut ctx = SpriteContext::zeroed();
        assert!(!ctx.force_bottom());
        ctx.cntr |= PLANE_FORCE_BOTTOM;
        assert!(ctx.force_bottom());
    }
}
