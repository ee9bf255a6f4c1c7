use winit::dpi::PhysicalPosition;

use crate::showcase::viewport::Viewport;

/// Last known cursor position in normalised device coordinates.
///
/// Starts at the centre and is only ever overwritten, never reset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
}

impl Cursor {
    /// Update from a window-relative pixel position.
    ///
    /// Windows report positions outside their bounds while a button is held,
    /// hence the clamp. An empty viewport keeps the previous value.
    pub fn track(&mut self, position: PhysicalPosition<f64>, viewport: &Viewport) {
        if viewport.is_empty() {
            return;
        }
        let (x, y) = viewport.pixels_to_ndc(position.x as f32, position.y as f32);
        self.x = x.clamp(-1.0, 1.0);
        self.y = y.clamp(-1.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners() {
        let viewport = Viewport::new(200, 100);
        let mut cursor = Cursor::default();
        cursor.track(PhysicalPosition::new(0.0, 0.0), &viewport);
        assert_eq!(cursor, Cursor { x: -1.0, y: 1.0 });
        cursor.track(PhysicalPosition::new(200.0, 100.0), &viewport);
        assert_eq!(cursor, Cursor { x: 1.0, y: -1.0 });
        cursor.track(PhysicalPosition::new(50.0, 75.0), &viewport);
        assert_eq!(cursor, Cursor { x: -0.5, y: -0.5 });
    }

    #[test]
    fn outside_the_window_is_clamped() {
        let viewport = Viewport::new(200, 100);
        let mut cursor = Cursor::default();
        cursor.track(PhysicalPosition::new(-500.0, 900.0), &viewport);
        assert_eq!(cursor, Cursor { x: -1.0, y: -1.0 });
    }

    #[test]
    fn empty_viewport_is_ignored() {
        let mut cursor = Cursor { x: 0.25, y: 0.5 };
        cursor.track(PhysicalPosition::new(10.0, 10.0), &Viewport::new(0, 0));
        assert_eq!(cursor, Cursor { x: 0.25, y: 0.5 });
    }
}
