use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::Rectangle};

use crate::palette::{fade_to_black, Palette};
use crate::{millis_since, Duration, Instant};

/// Number of lit pixels on each side of the center for `level`.
///
/// Maps `0..=full_scale` onto `1..=half_width` and clamps anything louder.
pub fn bars_for_level(level: f32, full_scale: f32, half_width: u32) -> u32 {
    if half_width == 0 {
        return 0;
    }
    let level = level.max(0.0);
    let span = half_width.saturating_sub(1) as f32;
    let bars = if full_scale > 0.0 {
        1 + (level * span / full_scale) as u32
    } else {
        half_width
    };
    bars.min(half_width)
}

/// Symmetric one-row level meter with a peak-and-hold marker.
#[derive(Debug, Clone)]
pub struct VuMeter {
    peak: u32,
    peak_at: Instant,
    hold: Duration,
    fade: Duration,
}

impl VuMeter {
    pub fn new(hold: Duration, fade: Duration) -> Self {
        Self {
            peak: 0,
            peak_at: Instant::from_ticks(0),
            hold,
            fade,
        }
    }

    /// Held position, 0 when nothing is held.
    pub fn peak(&self) -> u32 {
        self.peak
    }

    /// Takes the live bar count. The held position jumps up to it at once
    /// and drops to zero only once it is older than the hold duration.
    pub fn update(&mut self, bars: u32, now: Instant) {
        if bars > self.peak {
            self.peak = bars;
            self.peak_at = now;
        } else if millis_since(now, self.peak_at) > self.hold.to_millis() {
            self.peak = 0;
        }
    }

    /// How far the held pixels have faded, `0..=255`.
    pub fn fade_amount(&self, now: Instant) -> u8 {
        let fade_ms = self.fade.to_millis().max(1);
        let age = millis_since(now, self.peak_at) as u64;
        (256 * age / fade_ms as u64).min(255) as u8
    }

    /// Clears `row`, draws the fading held pair, updates the hold from
    /// `bars` and lights the live bars.
    pub fn draw<D, P>(
        &mut self,
        target: &mut D,
        palette: &P,
        row: i32,
        bars: u32,
        now: Instant,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
        P: Palette,
    {
        let width = target.bounding_box().size.width;
        target.fill_solid(
            &Rectangle::new(Point::new(0, row), Size::new(width, 1)),
            Rgb888::BLACK,
        )?;

        if self.peak > 1 {
            let fade = self.fade_amount(now);
            draw_pair(target, palette, row, self.peak, fade)?;
            draw_pair(target, palette, row, self.peak - 1, fade)?;
        }

        self.update(bars, now);

        for i in 0..bars {
            draw_pair(target, palette, row, i, 0)?;
        }
        Ok(())
    }
}

/// Lights the two pixels `i` steps out from the center of `row`.
fn draw_pair<D, P>(target: &mut D, palette: &P, row: i32, i: u32, fade: u8) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
    P: Palette,
{
    let center = (target.bounding_box().size.width / 2) as i32;
    if center == 0 {
        return Ok(());
    }
    let step = 256 / center as u32;
    let color = fade_to_black(palette.color_at((i * step).min(255) as u8), fade);
    let i = i as i32;
    target.draw_iter([
        Pixel(Point::new(center - i - 1, row), color),
        Pixel(Point::new(center + i, row), color),
    ])
}
