/// Drawable area in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn from_config(config: &wgpu::SurfaceConfiguration) -> Self {
        Self::new(config.width, config.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn diagonal(&self) -> f32 {
        self.width.hypot(self.height)
    }

    /// NDC (y up) to pixel coordinates (origin top-left, y down).
    pub fn ndc_to_pixels(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x + 1.0) * self.width / 2.0,
            (-y + 1.0) * self.height / 2.0,
        )
    }

    /// Pixel coordinates to NDC. Inverse of [`ndc_to_pixels`](Self::ndc_to_pixels).
    pub fn pixels_to_ndc(&self, px: f32, py: f32) -> (f32, f32) {
        (
            (px / self.width) * 2.0 - 1.0,
            -(py / self.height) * 2.0 + 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_maps_to_origin() {
        let viewport = Viewport::new(800, 600);
        assert_eq!(viewport.ndc_to_pixels(0.0, 0.0), (400.0, 300.0));
        assert_eq!(viewport.pixels_to_ndc(400.0, 300.0), (0.0, 0.0));
    }

    #[test]
    fn top_left_corner_is_minus_one_plus_one() {
        let viewport = Viewport::new(800, 600);
        assert_eq!(viewport.ndc_to_pixels(-1.0, 1.0), (0.0, 0.0));
        assert_eq!(viewport.pixels_to_ndc(800.0, 600.0), (1.0, -1.0));
    }

    #[test]
    fn diagonal_and_aspect() {
        let viewport = Viewport::new(300, 400);
        assert!((viewport.diagonal() - 500.0).abs() < 1e-3);
        assert_eq!(viewport.aspect(), 0.75);
        assert!(Viewport::new(0, 10).is_empty());
    }
}
