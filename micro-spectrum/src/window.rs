use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::{Mutex, MutexGuard};

use crate::config::MAX_BANDS;

/// Sample storage of one window, plus transform scratch and band results.
pub struct WindowBuffers<const N: usize> {
    /// Raw samples on the way in, magnitudes once the transform has run.
    pub real: [f32; N],
    /// Imaginary parts, zero for every collected sample.
    pub imag: [f32; N],
    /// Per-band peaks produced by the last pass over this window.
    pub peaks: [f32; MAX_BANDS],
}

impl<const N: usize> WindowBuffers<N> {
    const fn new() -> Self {
        Self {
            real: [0.0; N],
            imag: [0.0; N],
            peaks: [0.0; MAX_BANDS],
        }
    }
}

/// One window of `N` consecutive samples behind a spin lock.
///
/// The interrupt side only ever calls [`SampleWindow::try_acquire`]; the main
/// context may block in [`SampleWindow::acquire_blocking`]. The fill count
/// lives outside the lock so fullness can be polled without taking it.
pub struct SampleWindow<const N: usize> {
    count: AtomicUsize,
    buffers: Mutex<WindowBuffers<N>>,
}

impl<const N: usize> SampleWindow<N> {
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            buffers: Mutex::new(WindowBuffers::new()),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Takes the lock if it is free. Never spins, safe from interrupt context.
    pub fn try_acquire(&self) -> Option<WindowGuard<'_, N>> {
        self.buffers.try_lock().map(|buffers| WindowGuard {
            count: &self.count,
            buffers,
        })
    }

    /// Spins until the lock is free. Main context only.
    pub fn acquire_blocking(&self) -> WindowGuard<'_, N> {
        WindowGuard {
            count: &self.count,
            buffers: self.buffers.lock(),
        }
    }

    /// Number of samples collected so far. Lock-free.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock-free fullness check.
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    pub fn is_locked(&self) -> bool {
        self.buffers.is_locked()
    }
}

impl<const N: usize> Default for SampleWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to a [`SampleWindow`]. Dropping it releases the lock.
pub struct WindowGuard<'a, const N: usize> {
    count: &'a AtomicUsize,
    buffers: MutexGuard<'a, WindowBuffers<N>>,
}

impl<const N: usize> WindowGuard<'_, N> {
    /// Stores `value` as the next sample. Returns `false` and leaves the
    /// window untouched once it already holds `N` samples.
    pub fn append_sample(&mut self, value: f32) -> bool {
        let count = self.count.load(Ordering::Relaxed);
        if count >= N {
            return false;
        }
        self.buffers.real[count] = value;
        self.buffers.imag[count] = 0.0;
        self.count.store(count + 1, Ordering::Release);
        true
    }

    /// Zeroes every sample and peak slot and empties the window. The lock
    /// stays held.
    pub fn reset(&mut self) {
        self.buffers.real.fill(0.0);
        self.buffers.imag.fill(0.0);
        self.buffers.peaks.fill(0.0);
        self.count.store(0, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Releases the lock now rather than at the end of the scope.
    pub fn release(self) {}
}

impl<const N: usize> Deref for WindowGuard<'_, N> {
    type Target = WindowBuffers<N>;

    fn deref(&self) -> &Self::Target {
        &self.buffers
    }
}

impl<const N: usize> DerefMut for WindowGuard<'_, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffers
    }
}
