use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::Point,
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
};
use micro_spectrum::PeakSnapshot;

use crate::config::{RendererConfig, RendererConfigError};
use crate::palette::{fade_to_black, ColorScheme, GradientPalette, Palette, VU_GRADIENT};
use crate::peak_tracks::PeakTracks;
use crate::vu_meter::{bars_for_level, VuMeter};
use crate::{millis_since, Instant};

/// Palette step between neighbouring bands.
const BAND_HUE_SPACING: usize = 16;

pub trait Renderer {
    /// Draws one frame at time `now`.
    fn draw<D: DrawTarget<Color = Rgb888>>(
        &mut self,
        target: &mut D,
        now: Instant,
    ) -> Result<(), D::Error>;
}

/// Decaying spectrum bars with peak highlights and a VU meter.
///
/// Feed it every [`PeakSnapshot`] through [`SpectrumRenderer::ingest`] and
/// call [`Renderer::draw`] once per frame; the two need not run at the same
/// rate.
pub struct SpectrumRenderer<P = ColorScheme, V = GradientPalette<5>> {
    config: RendererConfig,
    size: Size,
    tracks: PeakTracks,
    vu: VuMeter,
    palette: P,
    vu_palette: V,
    vu_level: f32,
    base_hue: u8,
    last_frame: Option<Instant>,
}

impl SpectrumRenderer {
    /// Renderer with the stock band colors and VU gradient for a display of
    /// `size` pixels.
    pub fn new(config: RendererConfig, size: Size) -> Result<Self, RendererConfigError> {
        Self::with_palettes(config, size, ColorScheme::default(), VU_GRADIENT)
    }
}

impl<P: Palette, V: Palette> SpectrumRenderer<P, V> {
    pub fn with_palettes(
        config: RendererConfig,
        size: Size,
        palette: P,
        vu_palette: V,
    ) -> Result<Self, RendererConfigError> {
        config.validate(size)?;
        info!(
            "spectrum renderer: {} bands on {}x{}",
            config.band_count,
            size.width,
            size.height
        );
        Ok(Self {
            tracks: PeakTracks::new(
                config.band_count,
                config.highlight_decay_per_sec,
                config.bar_decay_per_sec,
            ),
            vu: VuMeter::new(config.vu_hold, config.vu_fade),
            config,
            size,
            palette,
            vu_palette,
            vu_level: 0.0,
            base_hue: 0,
            last_frame: None,
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn tracks(&self) -> &PeakTracks {
        &self.tracks
    }

    pub fn vu_meter(&self) -> &VuMeter {
        &self.vu
    }

    pub fn base_hue(&self) -> u8 {
        self.base_hue
    }

    pub fn palette(&self) -> &P {
        &self.palette
    }

    /// Swaps the band palette, taking effect from the next frame.
    pub fn set_palette(&mut self, palette: P) {
        self.palette = palette;
    }

    pub fn ingest(&mut self, snapshot: &PeakSnapshot, now: Instant) {
        self.ingest_peaks(&snapshot.bands, snapshot.vu_level, now);
    }

    pub fn ingest_peaks(&mut self, peaks: &[f32], vu_level: f32, now: Instant) {
        self.tracks.ingest(peaks, now);
        self.vu_level = vu_level;
    }

    /// Live VU bar count for the current level.
    pub fn vu_bars(&self) -> u32 {
        let half = (self.size.width / 2).saturating_sub(1);
        bars_for_level(self.vu_level, self.config.vu_full_scale, half)
    }

    pub fn band_color(&self, index: usize) -> Rgb888 {
        let position = (index * BAND_HUE_SPACING % 256) as u8;
        self.palette.color_at(position.wrapping_add(self.base_hue))
    }

    fn draw_band<D>(&self, target: &mut D, index: usize, now: Instant) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let Some(band) = self.tracks.band(index) else {
            return Ok(());
        };
        let base = self.band_color(index);
        let height = self.size.height as i32;
        let band_width = self.size.width / self.config.band_count as u32;
        let x = index as i32 * band_width as i32;

        // Overshoot from a transient is clipped here.
        let highlight = ((band.highlight * (height - 1) as f32) as i32).min(height);
        let bar = ((band.bar * height as f32) as i32).min(height);

        if bar > 0 {
            Rectangle::new(Point::new(x, height - bar), Size::new(band_width, bar as u32))
                .into_styled(PrimitiveStyle::with_fill(base))
                .draw(target)?;
        }

        if self.tracks.highlight_visible() {
            let color = if bar == 0 {
                base
            } else {
                let fade_ms = self.config.highlight_fade.to_millis().max(1);
                let age = self.tracks.highlight_age(index, now).min(fade_ms);
                let fade = (age as u64 * 256 / fade_ms as u64).min(255) as u8;
                fade_to_black(Rgb888::WHITE, fade)
            };
            let y = (height - highlight - 1).max(0);
            Line::new(Point::new(x, y), Point::new(x + band_width as i32 - 1, y))
                .into_styled(PrimitiveStyle::with_stroke(color, 1))
                .draw(target)?;
        }
        Ok(())
    }
}

impl<P: Palette, V: Palette> Renderer for SpectrumRenderer<P, V> {
    fn draw<D>(&mut self, target: &mut D, now: Instant) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let elapsed_ms = self.last_frame.map_or(0, |last| millis_since(now, last));
        self.tracks.decay(elapsed_ms as f32 / 1000.0);

        target.clear(Rgb888::BLACK)?;
        for index in 0..self.config.band_count {
            self.draw_band(target, index, now)?;
        }

        let bars = self.vu_bars();
        self.vu
            .draw(target, &self.vu_palette, self.config.vu_row, bars, now)?;

        self.last_frame = Some(now);
        self.base_hue = self.base_hue.wrapping_add(self.config.hue_step);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use embedded_graphics::mock_display::MockDisplay;

    fn at(ms: u32) -> Instant {
        Instant::from_ticks(ms)
    }

    fn display() -> MockDisplay<Rgb888> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        display
    }

    fn renderer(config: RendererConfig) -> SpectrumRenderer {
        // A fixed hue keeps band colors stable across frames.
        SpectrumRenderer::new(config.with_hue_step(0), Size::new(64, 64)).unwrap()
    }

    fn peaks(band: usize, value: f32) -> [f32; 16] {
        let mut peaks = [0.0; 16];
        peaks[band] = value;
        peaks
    }

    #[test]
    fn test_bar_height_and_fresh_highlight() {
        let mut renderer = renderer(RendererConfig::default());
        let mut display = display();
        renderer.ingest_peaks(&peaks(2, 0.5), 0.0, at(0));
        renderer.draw(&mut display, at(0)).unwrap();

        let base = renderer.band_color(2);
        // Band 2 covers x 8..12, its bar rows 32..64.
        assert_eq!(display.get_pixel(Point::new(8, 63)), Some(base));
        assert_eq!(display.get_pixel(Point::new(11, 33)), Some(base));
        assert_eq!(display.get_pixel(Point::new(12, 40)), Some(Rgb888::BLACK));
        // 0.5 * 63 rounds down to 31, so the highlight sits on row 32, white
        // at age 0.
        for x in 8..12 {
            assert_eq!(display.get_pixel(Point::new(x, 32)), Some(Rgb888::WHITE));
        }
        assert_eq!(display.get_pixel(Point::new(9, 31)), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_highlight_fades_with_age() {
        let config = RendererConfig::default()
            .with_highlight_decay(0.0)
            .with_bar_decay(0.0);
        let mut renderer = renderer(config);
        let mut display = display();
        renderer.ingest_peaks(&peaks(0, 0.5), 0.0, at(0));
        renderer.draw(&mut display, at(0)).unwrap();
        renderer.draw(&mut display, at(250)).unwrap();

        let expected = fade_to_black(Rgb888::WHITE, 64);
        assert_eq!(display.get_pixel(Point::new(1, 32)), Some(expected));
    }

    #[test]
    fn test_highlight_takes_base_color_without_bar() {
        let mut renderer = renderer(RendererConfig::default());
        let mut display = display();
        renderer.draw(&mut display, at(0)).unwrap();

        // Nothing ingested: every band shows its base color on the bottom row.
        for band in [0usize, 5, 15] {
            let x = band as i32 * 4;
            assert_eq!(
                display.get_pixel(Point::new(x, 63)),
                Some(renderer.band_color(band))
            );
        }
    }

    #[test]
    fn test_negative_decay_hides_highlight() {
        let mut renderer = renderer(RendererConfig::default().with_highlight_decay(-1.0));
        let mut display = display();
        renderer.ingest_peaks(&peaks(1, 0.5), 0.0, at(0));
        renderer.draw(&mut display, at(0)).unwrap();

        let base = renderer.band_color(1);
        assert_eq!(display.get_pixel(Point::new(5, 32)), Some(base));
        assert_eq!(display.get_pixel(Point::new(5, 31)), Some(Rgb888::BLACK));
        // No base colored floor line under an empty band either.
        assert_eq!(display.get_pixel(Point::new(1, 63)), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_overshoot_is_clipped() {
        let mut renderer = renderer(RendererConfig::default());
        let mut display = display();
        renderer.ingest_peaks(&peaks(3, 1.8), 0.0, at(0));
        renderer.draw(&mut display, at(0)).unwrap();
        assert_eq!(display.get_pixel(Point::new(12, 1)), Some(renderer.band_color(3)));
    }

    #[test]
    fn test_draw_decays_by_frame_time() {
        let mut renderer = renderer(RendererConfig::default());
        let mut display = display();
        renderer.ingest_peaks(&peaks(0, 1.0), 0.0, at(0));
        renderer.draw(&mut display, at(0)).unwrap();
        assert_eq!(renderer.tracks().band(0).unwrap().bar, 1.0);

        renderer.draw(&mut display, at(100)).unwrap();
        let band = renderer.tracks().band(0).unwrap();
        assert_abs_diff_eq!(band.bar, 0.78, epsilon = 1e-4);
        assert_abs_diff_eq!(band.highlight, 0.9, epsilon = 1e-4);
    }

    #[test]
    fn test_frame_shows_tracks_decayed_to_its_time() {
        let mut renderer = renderer(RendererConfig::default());
        let mut display = display();
        renderer.ingest_peaks(&peaks(0, 1.0), 0.0, at(0));
        renderer.draw(&mut display, at(0)).unwrap();
        assert_eq!(display.get_pixel(Point::new(0, 10)), Some(renderer.band_color(0)));

        // 2.2 per second empties the bar within 500 ms; the highlight is
        // down to half height.
        renderer.draw(&mut display, at(500)).unwrap();
        let base = renderer.band_color(0);
        assert_eq!(display.get_pixel(Point::new(0, 10)), Some(Rgb888::BLACK));
        assert_eq!(display.get_pixel(Point::new(0, 63)), Some(Rgb888::BLACK));
        assert_eq!(display.get_pixel(Point::new(0, 32)), Some(base));
    }

    #[test]
    fn test_scheme_switch_recolors_bands() {
        let mut renderer = renderer(RendererConfig::default());
        let mut display = display();
        renderer.set_palette(ColorScheme::Usa);
        renderer.draw(&mut display, at(0)).unwrap();
        // Band 0 reads index 0 of the flag palette: blue.
        assert_eq!(display.get_pixel(Point::new(0, 63)), Some(Rgb888::new(0, 0, 255)));
        assert_eq!(renderer.palette(), &ColorScheme::Usa);
    }

    #[test]
    fn test_hue_advances_each_frame() {
        let mut renderer =
            SpectrumRenderer::new(RendererConfig::default().with_hue_step(3), Size::new(64, 64))
                .unwrap();
        let mut display = display();
        let before = renderer.band_color(0);
        renderer.draw(&mut display, at(0)).unwrap();
        assert_eq!(renderer.base_hue(), 3);
        assert_ne!(renderer.band_color(0), before);
    }

    #[test]
    fn test_vu_meter_follows_snapshot_level() {
        let mut renderer = renderer(RendererConfig::default().with_vu_row(0));
        let mut display = display();
        renderer.ingest_peaks(&[0.0; 16], 6_000.0, at(0));
        assert_eq!(renderer.vu_bars(), 16);
        renderer.draw(&mut display, at(0)).unwrap();

        assert_ne!(display.get_pixel(Point::new(32 + 15, 0)), Some(Rgb888::BLACK));
        assert_ne!(display.get_pixel(Point::new(32 - 16, 0)), Some(Rgb888::BLACK));
        assert_eq!(display.get_pixel(Point::new(32 + 16, 0)), Some(Rgb888::BLACK));
        assert_eq!(renderer.vu_meter().peak(), 16);
    }
}
