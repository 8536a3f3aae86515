use core::convert::Infallible;

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};

/// In-memory panel the renderer draws into.
pub struct PixelGrid {
    size: Size,
    pixels: Vec<Rgb888>,
}

impl PixelGrid {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: vec![Rgb888::BLACK; (size.width * size.height) as usize],
        }
    }

    fn index(&self, point: Point) -> Option<usize> {
        let (x, y) = (u32::try_from(point.x).ok()?, u32::try_from(point.y).ok()?);
        (x < self.size.width && y < self.size.height).then(|| (y * self.size.width + x) as usize)
    }

    /// Every pixel with its position, row by row.
    #[cfg_attr(not(feature = "simulator"), allow(dead_code))]
    pub fn pixels(&self) -> impl Iterator<Item = Pixel<Rgb888>> + '_ {
        let width = self.size.width as usize;
        self.pixels.iter().enumerate().map(move |(slot, &color)| {
            Pixel(Point::new((slot % width) as i32, (slot / width) as i32), color)
        })
    }

    /// One character per pixel, shaded by brightness.
    pub fn to_ascii(&self) -> String {
        const SHADES: &[u8] = b" .:+#";
        let mut out = String::with_capacity(self.pixels.len() + self.size.height as usize);
        for row in self.pixels.chunks(self.size.width as usize) {
            for color in row {
                let brightness = color.r().max(color.g()).max(color.b()) as usize;
                let shade = if brightness == 0 {
                    0
                } else {
                    1 + brightness * (SHADES.len() - 2) / 255
                };
                out.push(SHADES[shade] as char);
            }
            out.push('\n');
        }
        out
    }
}

impl OriginDimensions for PixelGrid {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for PixelGrid {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(slot) = self.index(point) {
                self.pixels[slot] = color;
            }
        }
        Ok(())
    }
}
