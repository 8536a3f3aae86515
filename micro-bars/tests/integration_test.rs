use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use fugit::HertzU32;
use micro_bars::{Renderer, RendererConfig, SpectrumRenderer};
use micro_spectrum::{
    AnalyzerConfig, BandCorrection, Sampler, SpectrumAnalyzer, WindowPair, WindowedFft,
};

pub mod common;
use common::*;

const PANEL: Size = Size::new(64, 64);

#[test]
fn test_tone_draws_tallest_bar_in_its_band() {
    const N: usize = 64;
    let rate = 8_000u32;
    let windows = WindowPair::<N>::new();
    let config = AnalyzerConfig::default()
        .with_sampling_frequency(HertzU32::from_raw(rate))
        .with_correction(BandCorrection::Flat);
    let transform = WindowedFft::new().with_dc_removal();
    let mut analyzer = SpectrumAnalyzer::new(&windows, transform, config).unwrap();

    let mut n = 0u32;
    let mut sampler = Sampler::new(&windows, || {
        let phase = 2.0 * std::f32::consts::PI * 1000.0 * n as f32 / rate as f32;
        n += 1;
        (2048.0 + 1000.0 * phase.sin()) as u16
    });
    while !windows.active().is_full() {
        sampler.on_tick();
    }
    let snapshot = analyzer.run_pass().unwrap();
    let (loudest, _) = snapshot.loudest().unwrap();

    let mut renderer = SpectrumRenderer::new(RendererConfig::default(), PANEL).unwrap();
    let mut display = display();
    renderer.ingest(&snapshot, at(0));
    renderer.draw(&mut display, at(0)).unwrap();

    let band_width = PANEL.width as i32 / 16;
    let tallest = column_height(&display, loudest as i32 * band_width);
    assert!(tallest > 50, "loudest band only {} rows tall", tallest);
    for band in (0..16).filter(|&band| band != loudest) {
        assert!(column_height(&display, band as i32 * band_width) < tallest);
    }
}

#[test]
fn test_vu_hold_outlasts_drop_for_hold_duration() {
    let mut renderer = SpectrumRenderer::new(RendererConfig::default(), PANEL).unwrap();
    let mut display = display();
    let silent = [0.0f32; 16];

    renderer.ingest(&snapshot(&silent, 0.0), at(0));
    renderer.draw(&mut display, at(0)).unwrap();
    assert_eq!(renderer.vu_meter().peak(), 1);

    // 1600 of 12000 maps to five bars on a 64 wide panel.
    renderer.ingest(&snapshot(&silent, 1_600.0), at(20));
    assert_eq!(renderer.vu_bars(), 5);
    renderer.draw(&mut display, at(20)).unwrap();
    assert_eq!(renderer.vu_meter().peak(), 5);

    renderer.ingest(&snapshot(&silent, 0.0), at(40));
    for ms in (40..=1020).step_by(20) {
        renderer.draw(&mut display, at(ms)).unwrap();
        assert_eq!(renderer.vu_meter().peak(), 5, "hold dropped early at {} ms", ms);
    }
    renderer.draw(&mut display, at(1040)).unwrap();
    assert_eq!(renderer.vu_meter().peak(), 0);
    renderer.draw(&mut display, at(1060)).unwrap();
    assert_eq!(renderer.vu_meter().peak(), 1);
}

#[test]
fn test_tracks_only_fall_between_snapshots() {
    let mut renderer = SpectrumRenderer::new(RendererConfig::default(), PANEL).unwrap();
    let mut display = display();
    renderer.ingest(&snapshot(&[1.0; 16], 0.0), at(0));

    let mut previous = renderer.tracks().bands().to_vec();
    for frame in 0..50u32 {
        renderer.draw(&mut display, at(frame * 50)).unwrap();
        for (now, before) in renderer.tracks().bands().iter().zip(&previous) {
            assert!(now.bar <= before.bar && now.bar >= 0.0);
            assert!(now.highlight <= before.highlight && now.highlight >= 0.0);
        }
        previous = renderer.tracks().bands().to_vec();
    }

    // Both tracks gone: only the base colored floor line is left.
    renderer.draw(&mut display, at(2_500)).unwrap();
    assert_eq!(column_height(&display, 0), 1);
    assert_ne!(display.get_pixel(Point::new(0, 63)), Some(Rgb888::BLACK));
}
