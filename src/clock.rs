//! Wall clock derived from a monotonic millisecond counter.

use core::cell::Cell;

use critical_section::Mutex;

/// Wall-clock seconds source shared by persistence and sync.
pub trait Clock {
    /// Current wall-clock seconds, or 0 if never set.
    fn get(&self) -> u32;
    fn set(&self, seconds: u32);
    fn is_set(&self) -> bool;
}

/// Free-running millisecond counter, allowed to wrap.
pub trait TickSource {
    fn millis(&self) -> u32;
}

#[derive(Clone, Copy, Default)]
struct ClockState {
    set: bool,
    last_tick: u32,
    // Wall-clock milliseconds; u64 so `seconds * 1000` cannot overflow.
    wall_millis: u64,
}

/// [`Clock`] that advances with a [`TickSource`].
///
/// State lives in a critical-section mutex so the clock can be read from
/// interrupt context and shared by reference.
pub struct TickClock<T: TickSource> {
    ticks: T,
    state: Mutex<Cell<ClockState>>,
}

impl<T: TickSource> TickClock<T> {
    pub const fn new(ticks: T) -> Self {
        Self {
            ticks,
            state: Mutex::new(Cell::new(ClockState {
                set: false,
                last_tick: 0,
                wall_millis: 0,
            })),
        }
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }
}

impl<T: TickSource> Clock for TickClock<T> {
    fn get(&self) -> u32 {
        let now = self.ticks.millis();
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            if state.set {
                state.wall_millis += u64::from(now.wrapping_sub(state.last_tick));
                state.last_tick = now;
                cell.set(state);
            }
            (state.wall_millis / 1000) as u32
        })
    }

    fn set(&self, seconds: u32) {
        let now = self.ticks.millis();
        critical_section::with(|cs| {
            self.state.borrow(cs).set(ClockState {
                set: true,
                last_tick: now,
                wall_millis: u64::from(seconds) * 1000,
            });
        });
        ::log::info!("wall clock set to {}", seconds);
    }

    fn is_set(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).get().set)
    }
}
