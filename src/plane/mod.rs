//! Hardware plane programming
//!
//! Turns "show this buffer at this rectangle" into the register image a
//! display plane consumes. Nothing here touches the output registry or the
//! kernel, so layouts can be computed from any thread.

pub mod context;
pub mod format;
pub mod sprite;

pub use context::{PlaneContext, SpriteContext};
pub use sprite::SpritePlane;

/// Plane type tag of a register image
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneType {
    Sprite = 1,
    Primary = 3,
}

/// Source crop of a buffer, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crop {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Destination rectangle of a plane on the display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanePosition {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Active area of the display a plane is shown on. Zero means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayArea {
    pub width: i32,
    pub height: i32,
}

/// Access to a graphics buffer's layout
pub trait BufferMapper {
    /// HAL pixel format
    fn format(&self) -> i32;

    fn crop(&self) -> Crop;

    /// Bytes per row of the RGB plane
    fn stride(&self) -> u32;

    fn height(&self) -> u32;

    /// GPU-visible offset of a buffer plane, in pages
    fn gtt_offset_in_page(&self, plane: usize) -> u32;
}

/// Keep a plane inside the display area. Left alone while the area is
/// unknown.
pub fn check_position(position: PlanePosition, area: DisplayArea) -> PlanePosition {
    if area.width == 0 || area.height == 0 {
        return position;
    }

    let mut pos = position;
    if pos.x < 0 {
        pos.x = 0;
    }
    if pos.y < 0 {
        pos.y = 0;
    }
    if pos.x.saturating_add(pos.w) > area.width {
        pos.w = area.width - pos.x;
    }
    if pos.y.saturating_add(pos.h) > area.height {
        pos.h = area.height - pos.y;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: DisplayArea = DisplayArea {
        width: 1080,
        height: 1920,
    };

    #[test]
    fn test_inside_is_unchanged() {
        let pos = PlanePosition { x: 10, y: 20, w: 300, h: 400 };
        assert_eq!(check_position(pos, AREA), pos);
    }

    #[test]
    fn test_clamps_to_display() {
        let pos = PlanePosition { x: -10, y: 1800, w: 500, h: 300 };
        assert_eq!(
            check_position(pos, AREA),
            PlanePosition { x: 0, y: 1800, w: 500, h: 120 }
        );
    }

    #[test]
    fn test_unknown_area_skips_clamp() {
        let pos = PlanePosition { x: -10, y: -10, w: 5000, h: 5000 };
        assert_eq!(check_position(pos, DisplayArea::default()), pos);
    }
}
