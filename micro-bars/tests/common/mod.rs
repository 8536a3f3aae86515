#![allow(dead_code)]

use embedded_graphics::{mock_display::MockDisplay, pixelcolor::Rgb888, prelude::*};
use micro_bars::Instant;
use micro_spectrum::PeakSnapshot;

pub fn at(ms: u32) -> Instant {
    Instant::from_ticks(ms)
}

pub fn display() -> MockDisplay<Rgb888> {
    let mut display = MockDisplay::new();
    display.set_allow_overdraw(true);
    display
}

pub fn snapshot(bands: &[f32], vu_level: f32) -> PeakSnapshot {
    PeakSnapshot {
        bands: heapless::Vec::from_slice(bands).unwrap(),
        vu_level,
        ceiling: 1.0,
    }
}

/// Lit pixels counted upwards from the bottom row until the first dark one.
pub fn column_height(display: &MockDisplay<Rgb888>, x: i32) -> u32 {
    let height = display.bounding_box().size.height as i32;
    (0..height)
        .rev()
        .take_while(|&y| {
            display
                .get_pixel(Point::new(x, y))
                .is_some_and(|color| color != Rgb888::BLACK)
        })
        .count() as u32
}
