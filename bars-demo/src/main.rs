//! Host harness: a synthetic ADC sampled on a timer thread, analysed and
//! rendered into an in-memory panel that is dumped to the log.

mod frame;
mod source;
mod timer;

use std::{
    thread,
    time::{Duration, Instant as StdInstant},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use embedded_graphics::prelude::*;
use env_logger::Env;
use fugit::HertzU32;
use log::{debug, info};
use micro_bars::{ColorScheme, Instant, Renderer, RendererConfig, SpectrumRenderer};
use micro_spectrum::{
    config::DEFAULT_WINDOW_SIZE, AnalyzerConfig, SpectrumAnalyzer, WindowPair, WindowedFft,
};

use crate::{frame::PixelGrid, source::SyntheticAdc, timer::SampleTimer};

static WINDOWS: WindowPair<DEFAULT_WINDOW_SIZE> = WindowPair::new();

#[derive(Parser, Debug)]
#[command(version, about = "Audio spectrum bars on a simulated LED panel")]
struct Args {
    /// Number of bands: 8, 16, 24 or 32
    #[arg(short, long, default_value_t = 16)]
    bands: usize,

    /// Sampling rate in Hz
    #[arg(short, long, default_value_t = 25_000)]
    rate: u32,

    /// Tone frequencies in Hz mixed into the input
    #[arg(short, long, value_delimiter = ',', default_values_t = [110.0, 880.0, 3_500.0])]
    tones: Vec<f32>,

    /// Peak amplitude of each tone in ADC counts
    #[arg(long, default_value_t = 400.0)]
    amplitude: f32,

    /// Uniform noise spread in ADC counts
    #[arg(long, default_value_t = 40)]
    noise: i32,

    /// Beat period in ms, 0 for a steady signal
    #[arg(long, default_value_t = 500)]
    beat_ms: u32,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Frames to render before exiting
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Frame rate of the display, independent of the analysis rate
    #[arg(long, default_value_t = 100)]
    fps: u32,

    /// Band color scheme, 0 to 9
    #[arg(long, default_value_t = 0)]
    scheme: usize,

    /// Leave the converter bias in the spectrum, as raw hardware would
    #[arg(long)]
    keep_dc: bool,

    #[arg(long, default_value_t = 64)]
    width: u32,

    #[arg(long, default_value_t = 32)]
    height: u32,

    /// Highlight fall speed in panel heights per second, negative hides it
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    highlight_decay: f32,

    /// Dump the panel every this many frames, 0 to disable
    #[arg(long, default_value_t = 60)]
    dump_every: u32,

    /// Log sampling diagnostics every this many frames, 0 to disable
    #[arg(long, default_value_t = 120)]
    stats_every: u32,

    /// Polls without a full window before a pass gives up
    #[arg(long, default_value_t = 200_000_000)]
    stall_polls: u32,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(if args.debug {
        "debug"
    } else {
        "info"
    }))
    .init();

    if args.rate == 0 || args.fps == 0 {
        bail!("sampling rate and frame rate must be positive");
    }
    let Some(scheme) = ColorScheme::from_index(args.scheme) else {
        bail!("no color scheme {}, pick 0 to {}", args.scheme, ColorScheme::ALL.len() - 1);
    };
    let rate = HertzU32::from_raw(args.rate);
    let size = Size::new(args.width, args.height);

    let analyzer_config = AnalyzerConfig::default()
        .with_sampling_frequency(rate)
        .with_band_count(args.bands)
        .with_stall_poll_limit(args.stall_polls);
    let transform = if args.keep_dc {
        WindowedFft::new()
    } else {
        WindowedFft::new().with_dc_removal()
    };
    let mut analyzer = SpectrumAnalyzer::new(&WINDOWS, transform, analyzer_config)
        .context("invalid analyzer settings")?;

    let renderer_config = RendererConfig::default()
        .with_band_count(args.bands)
        .with_highlight_decay(args.highlight_decay);
    let mut renderer =
        SpectrumRenderer::new(renderer_config, size).context("invalid renderer settings")?;
    renderer.set_palette(scheme);
    let mut grid = PixelGrid::new(size);

    #[cfg(feature = "simulator")]
    let mut preview = simulator::Preview::new(size);

    let adc = SyntheticAdc::new(
        args.rate,
        &args.tones,
        args.amplitude,
        args.noise,
        args.beat_ms,
        args.seed,
    );
    let mut timer = SampleTimer::start(&WINDOWS, adc, rate).context("starting sample timer")?;
    info!(
        "sampling {} Hz into {} bands, tones {:?}",
        args.rate, args.bands, args.tones
    );

    let started = StdInstant::now();
    let now = || Instant::from_ticks(started.elapsed().as_millis() as u32);

    let frame_period = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let mut next_frame = StdInstant::now();
    let mut passes = 0u32;

    for frame in 1..=args.frames {
        // Take in every window that filled since the last frame.
        while WINDOWS.active().is_full() {
            let snapshot = analyzer.run_pass()?;
            passes += 1;
            debug!(
                "pass {}: vu {:.0}, ceiling {:.3e}, loudest {:?}",
                passes,
                snapshot.vu_level,
                snapshot.ceiling,
                snapshot.loudest()
            );
            renderer.ingest(&snapshot, now());
        }

        renderer.draw(&mut grid, now())?;

        #[cfg(feature = "simulator")]
        if !preview.show(&grid)? {
            info!("window closed");
            break;
        }

        if args.dump_every != 0 && frame % args.dump_every == 0 {
            info!("frame {}\n{}", frame, grid.to_ascii());
        }
        if args.stats_every != 0 && frame % args.stats_every == 0 {
            log_diagnostics(&WINDOWS);
        }

        next_frame += frame_period;
        if let Some(wait) = next_frame.checked_duration_since(StdInstant::now()) {
            thread::sleep(wait);
        }
    }

    timer.stop();
    let elapsed = started.elapsed().as_secs_f32();
    info!(
        "{} frames and {} passes in {:.2} s ({:.1} fps)",
        args.frames,
        passes,
        elapsed,
        args.frames as f32 / elapsed.max(f32::EPSILON)
    );
    log_diagnostics(&WINDOWS);
    Ok(())
}

fn log_diagnostics<const N: usize>(windows: &WindowPair<N>) {
    let stats = windows.diagnostics().snapshot();
    info!(
        "ticks {} collected {} ({:.1}%) missed {} overruns {} passes {} stalls {} conflicts {} longest wait {}",
        stats.ticks,
        stats.collected,
        stats.consumption() * 100.0,
        stats.missed,
        stats.overruns,
        stats.passes,
        stats.stalls,
        stats.hand_off_conflicts,
        stats.longest_wait
    );
}

#[cfg(feature = "simulator")]
mod simulator {
    use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
    use embedded_graphics_simulator::{
        OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    };

    use crate::frame::PixelGrid;

    pub struct Preview {
        display: SimulatorDisplay<Rgb888>,
        window: Window,
    }

    impl Preview {
        pub fn new(size: Size) -> Self {
            Self {
                display: SimulatorDisplay::new(size),
                window: Window::new(
                    "Spectrum bars",
                    &OutputSettingsBuilder::new().scale(8).build(),
                ),
            }
        }

        /// Mirrors the grid into the window. `false` once it was closed.
        pub fn show(&mut self, grid: &PixelGrid) -> anyhow::Result<bool> {
            self.display.draw_iter(grid.pixels())?;
            self.window.update(&self.display);
            Ok(!self
                .window
                .events()
                .any(|event| matches!(event, SimulatorEvent::Quit)))
        }
    }
}
