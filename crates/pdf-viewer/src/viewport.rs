//! Page-space to canvas-space transform for a scaled, rotated page

/// Normalize an unbounded rotation into one of 0, 90, 180 or 270
pub fn normalize_rotation(rotation_degrees: i32) -> i32 {
    let turned = rotation_degrees.rem_euclid(360);
    turned - turned % 90
}

/// Scale + rotation transform and resulting pixel dimensions used to rasterize a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    pub scale: f32,
    /// Rotation in degrees, always 0, 90, 180 or 270
    pub rotation: i32,
    /// Affine `[a, b, c, d, e, f]` mapping page points to canvas pixels
    pub transform: [f32; 6],
}

impl Viewport {
    /// Build the viewport for a page of `page_width` x `page_height` points.
    ///
    /// Page space has its origin bottom-left with y pointing up; canvas space
    /// has its origin top-left with y pointing down.
    pub fn new(page_width: f32, page_height: f32, scale: f32, rotation_degrees: i32) -> Self {
        let rotation = normalize_rotation(rotation_degrees);
        let center_x = page_width / 2.0;
        let center_y = page_height / 2.0;

        let (a, b, c, d) = match rotation {
            90 => (0.0, 1.0, 1.0, 0.0),
            180 => (-1.0, 0.0, 0.0, 1.0),
            270 => (0.0, -1.0, -1.0, 0.0),
            _ => (1.0, 0.0, 0.0, -1.0),
        };

        let quarter_turn = rotation == 90 || rotation == 270;
        let (offset_x, offset_y, width, height) = if quarter_turn {
            (
                center_y * scale,
                center_x * scale,
                page_height * scale,
                page_width * scale,
            )
        } else {
            (
                center_x * scale,
                center_y * scale,
                page_width * scale,
                page_height * scale,
            )
        };

        let transform = [
            a * scale,
            b * scale,
            c * scale,
            d * scale,
            offset_x - a * scale * center_x - c * scale * center_y,
            offset_y - b * scale * center_x - d * scale * center_y,
        ];

        Self {
            width: to_pixels(width),
            height: to_pixels(height),
            scale,
            rotation,
            transform,
        }
    }

    /// Map a point in page space to canvas space
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.transform;
        (a * x + c * y + e, b * x + d * y + f)
    }

    pub fn is_quarter_turn(&self) -> bool {
        self.rotation == 90 || self.rotation == 270
    }
}

fn to_pixels(value: f32) -> u32 {
    (value.floor() as u32).max(1)
}
