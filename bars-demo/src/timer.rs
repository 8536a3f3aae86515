use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use fugit::HertzU32;
use log::{debug, warn};
use micro_spectrum::{AnalogSource, Sampler, WindowPair};

/// Falling further behind than this drops the missed ticks instead of
/// bursting through them.
const MAX_LAG: Duration = Duration::from_millis(50);

/// Thread standing in for the sampling timer interrupt.
pub struct SampleTimer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SampleTimer {
    pub fn start<S, const N: usize>(
        windows: &'static WindowPair<N>,
        source: S,
        rate: HertzU32,
    ) -> io::Result<Self>
    where
        S: AnalogSource + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let period = Duration::from_nanos(1_000_000_000 / u64::from(rate.raw().max(1)));
        let handle = thread::Builder::new().name("sample-timer".into()).spawn({
            let stop = stop.clone();
            move || {
                let mut sampler = Sampler::new(windows, source);
                let mut deadline = Instant::now();
                while !stop.load(Ordering::Relaxed) {
                    critical_section::with(|_| sampler.on_tick());
                    deadline += period;

                    let now = Instant::now();
                    if deadline > now {
                        let ahead = deadline - now;
                        if ahead > Duration::from_millis(2) {
                            thread::sleep(ahead - Duration::from_millis(1));
                        }
                        while Instant::now() < deadline {
                            core::hint::spin_loop();
                        }
                    } else if now - deadline > MAX_LAG {
                        warn!("sample timer lagging, skipping {:?}", now - deadline);
                        deadline = now;
                    }
                }
                debug!("sample timer stopped");
            }
        })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("sample timer thread panicked");
            }
        }
    }
}

impl Drop for SampleTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
