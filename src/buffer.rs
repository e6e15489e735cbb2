//! Double-buffered handoff between the hardware callback and the poll path.
//!
//! Each device holds one `SwapBuffer` per event kind. The callback appends
//! to the detect side; the host's drain call swaps detect into use and
//! reads the use side by index. Each pair has its own locks, so unrelated
//! devices (and the two kinds within one device) never serialize.

use parking_lot::Mutex;

/// Detect/use buffer pair.
///
/// - `push` is the only detect-side mutation and runs on the delivery path:
///   it takes one short lock and appends.
/// - `drain` moves the entire detect contents into the use side, discarding
///   whatever the host left undrained there, and returns the new length.
/// - `get` reads the use side with bounds validation.
///
/// FIFO order within a pair survives the swap. The swap exchanges the two
/// `Vec`s rather than copying, so the detect side gets the previous use
/// side's capacity back and steady-state appends do not reallocate.
#[derive(Debug, Default)]
pub struct SwapBuffer<T> {
    detect: Mutex<Vec<T>>,
    in_use: Mutex<Vec<T>>,
}

impl<T> SwapBuffer<T> {
    pub fn new() -> Self {
        Self {
            detect: Mutex::new(Vec::new()),
            in_use: Mutex::new(Vec::new()),
        }
    }

    /// Append one event on the delivery path. Never blocks beyond a swap's
    /// O(1) critical section.
    #[inline]
    pub fn push(&self, item: T) {
        self.detect.lock().push(item);
    }

    /// Swap detect into use and return the use-side length.
    ///
    /// Undrained events from the previous use side are discarded: the host
    /// is expected to have consumed them before draining again.
    pub fn drain(&self) -> usize {
        // Lock order detect -> use; push only ever takes detect, so this
        // cannot deadlock with a concurrent append.
        let mut detect = self.detect.lock();
        let mut in_use = self.in_use.lock();
        in_use.clear();
        std::mem::swap(&mut *detect, &mut *in_use);
        in_use.len()
    }

    /// Number of events currently in the use side.
    pub fn len(&self) -> usize {
        self.in_use.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_use.lock().is_empty()
    }
}

impl<T: Copy> SwapBuffer<T> {
    /// Bounds-checked read of the use side.
    pub fn get(&self, index: usize) -> Option<T> {
        self.in_use.lock().get(index).copied()
    }
}
