//! Canvas slots that receive raster output

use image::{Rgba, RgbaImage};

/// Fill for a spread slot with no page behind it
pub const BLANK_FILL: Rgba<u8> = Rgba([0xE5, 0xE5, 0xE5, 0xFF]);

/// Named rendering target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CanvasSlot {
    Single,
    Left,
    Right,
}

impl CanvasSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanvasSlot::Single => "single",
            CanvasSlot::Left => "left",
            CanvasSlot::Right => "right",
        }
    }
}

/// What one slot currently shows
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Surface {
    /// Page drawn here; `None` for a blank slot
    pub page: Option<usize>,
    /// Layout size in CSS pixels
    pub css_width: f32,
    pub css_height: f32,
    /// Translation applied on top of layout (pan offset in custom zoom)
    pub translate: (f32, f32),
    /// Backing store, sized in device pixels
    pub raster: Option<RgbaImage>,
}

impl Surface {
    /// Size the slot for a page and drop stale pixels
    pub fn prepare(&mut self, page: usize, css_size: (f32, f32), translate: (f32, f32)) {
        self.page = Some(page);
        self.css_width = css_size.0;
        self.css_height = css_size.1;
        self.translate = translate;
        self.raster = None;
    }

    /// Flat neutral background at the given size
    pub fn fill_blank(&mut self, css_size: (f32, f32), pixel_size: (u32, u32)) {
        self.page = None;
        self.css_width = css_size.0;
        self.css_height = css_size.1;
        self.translate = (0.0, 0.0);
        self.raster = Some(RgbaImage::from_pixel(
            pixel_size.0.max(1),
            pixel_size.1.max(1),
            BLANK_FILL,
        ));
    }

    pub fn is_blank(&self) -> bool {
        self.page.is_none() && self.raster.is_some()
    }

    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        self.raster.as_ref().map(|r| r.dimensions())
    }
}

/// Place rasters next to each other, left to right, top-aligned
pub fn compose_side_by_side(rasters: &[&RgbaImage]) -> Option<RgbaImage> {
    if rasters.is_empty() {
        return None;
    }
    let width = rasters.iter().map(|r| r.width()).sum();
    let height = rasters.iter().map(|r| r.height()).max().unwrap_or(1);
    let mut out = RgbaImage::from_pixel(width, height, BLANK_FILL);
    let mut x = 0i64;
    for raster in rasters {
        image::imageops::replace(&mut out, *raster, x, 0);
        x += i64::from(raster.width());
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_places_left_then_right() {
        let left = RgbaImage::from_pixel(2, 3, Rgba([255, 0, 0, 255]));
        let right = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 255, 255]));
        let out = compose_side_by_side(&[&left, &right]).unwrap();

        assert_eq!(out.dimensions(), (6, 3));
        assert_eq!(*out.get_pixel(0, 2), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(5, 0), Rgba([0, 0, 255, 255]));
        // shorter page leaves neutral fill below it
        assert_eq!(*out.get_pixel(5, 2), BLANK_FILL);
        assert!(compose_side_by_side(&[]).is_none());
    }

    #[test]
    fn blank_fill_covers_whole_slot() {
        let mut surface = Surface::default();
        surface.prepare(3, (100.0, 150.0), (4.0, 5.0));
        surface.raster = Some(RgbaImage::new(10, 10));

        surface.fill_blank((100.0, 150.0), (200, 300));
        assert!(surface.is_blank());
        assert_eq!(surface.translate, (0.0, 0.0));
        let raster = surface.raster.as_ref().unwrap();
        assert_eq!(raster.dimensions(), (200, 300));
        assert!(raster.pixels().all(|p| *p == BLANK_FILL));
    }

    #[test]
    fn prepare_drops_stale_pixels() {
        let mut surface = Surface::default();
        surface.raster = Some(RgbaImage::new(4, 4));
        surface.prepare(2, (10.0, 20.0), (0.0, 0.0));
        assert_eq!(surface.page, Some(2));
        assert_eq!(surface.pixel_size(), None);
    }
}
