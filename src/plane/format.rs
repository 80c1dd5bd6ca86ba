//! HAL pixel formats and their sprite plane encodings

/// HAL pixel formats
pub const HAL_PIXEL_FORMAT_RGBA_8888: i32 = 1;
pub const HAL_PIXEL_FORMAT_RGBX_8888: i32 = 2;
pub const HAL_PIXEL_FORMAT_RGB_888: i32 = 3;
pub const HAL_PIXEL_FORMAT_RGB_565: i32 = 4;
pub const HAL_PIXEL_FORMAT_BGRA_8888: i32 = 5;
pub const HAL_PIXEL_FORMAT_BGRX_8888: i32 = 0x1ff;
pub const HAL_PIXEL_FORMAT_YV12: i32 = 0x3231_5659;
pub const HAL_PIXEL_FORMAT_NV12: i32 = 0x3231_564e;

/// Pixel format field of the sprite control register
pub const PLANE_PIXEL_FORMAT_BGRX565: u32 = 0x1400_0000;
pub const PLANE_PIXEL_FORMAT_BGRX8888: u32 = 0x1800_0000;
pub const PLANE_PIXEL_FORMAT_BGRA8888: u32 = 0x1c00_0000;
pub const PLANE_PIXEL_FORMAT_RGBX8888: u32 = 0x3800_0000;
pub const PLANE_PIXEL_FORMAT_RGBA8888: u32 = 0x3c00_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteFormat {
    pub code: u32,
    pub bytes_per_pixel: u32,
}

/// Sprite encoding of a HAL format; `None` if sprites cannot scan it out
pub fn convert_format(hal_format: i32) -> Option<SpriteFormat> {
    let (code, bytes_per_pixel) = match hal_format {
        HAL_PIXEL_FORMAT_RGBA_8888 => (PLANE_PIXEL_FORMAT_RGBA8888, 4),
        HAL_PIXEL_FORMAT_RGBX_8888 => (PLANE_PIXEL_FORMAT_RGBX8888, 4),
        HAL_PIXEL_FORMAT_BGRA_8888 => (PLANE_PIXEL_FORMAT_BGRA8888, 4),
        HAL_PIXEL_FORMAT_BGRX_8888 => (PLANE_PIXEL_FORMAT_BGRX8888, 4),
        HAL_PIXEL_FORMAT_RGB_565 => (PLANE_PIXEL_FORMAT_BGRX565, 2),
        _ => return None,
    };
    Some(SpriteFormat {
        code,
        bytes_per_pixel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_formats() {
        assert_eq!(
            convert_format(HAL_PIXEL_FORMAT_BGRA_8888),
            Some(SpriteFormat { code: PLANE_PIXEL_FORMAT_BGRA8888, bytes_per_pixel: 4 })
        );
        assert_eq!(convert_format(HAL_PIXEL_FORMAT_RGB_565).map(|f| f.bytes_per_pixel), Some(2));
    }

    #[test]
    fn test_unsupported_formats() {
        assert_eq!(convert_format(HAL_PIXEL_FORMAT_RGB_888), None);
        assert_eq!(convert_format(HAL_PIXEL_FORMAT_YV12), None);
        assert_eq!(convert_format(HAL_PIXEL_FORMAT_NV12), None);
        assert_eq!(convert_format(0), None);
    }
}
