use std::time::{Duration, Instant};

/// Hold the current thread for a sub-millisecond interval by spinning.
///
/// STEP high times are a few microseconds; `thread::sleep` cannot resolve
/// that, so the pulse width is burned in a bounded busy-wait instead.
pub fn spin_for(width: Duration) {
    let end = Instant::now() + width;
    while Instant::now() < end {
        std::hint::spin_loop();
    }
}
