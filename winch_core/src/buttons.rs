//! Button debouncing and tap/long-press classification.
//!
//! Each physical button gets one `DebouncedButton`. A raw level change is
//! accepted as the new stable level only after it persists for the debounce
//! interval; release events are classified from the hold duration sampled
//! at the stable falling edge.

use crate::config::ButtonCfg;
use std::time::Instant;
use winch_traits::Direction;

/// Release-time classification of a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    /// Held strictly less than the long-press threshold.
    Tap,
    /// Held at least the long-press threshold.
    LongPress,
}

#[derive(Debug)]
pub struct DebouncedButton {
    cfg: ButtonCfg,
    raw: bool,
    stable: bool,
    last_raw_change: Option<Instant>,
    pressed_at: Option<Instant>,
    long_fired: bool,
}

impl DebouncedButton {
    pub fn new(cfg: ButtonCfg) -> Self {
        Self {
            cfg,
            raw: false,
            stable: false,
            last_raw_change: None,
            pressed_at: None,
            long_fired: false,
        }
    }

    /// Feed one raw sample; returns at most one release event.
    pub fn update(&mut self, raw: bool, now: Instant) -> Option<ButtonEvent> {
        if raw != self.raw {
            self.raw = raw;
            self.last_raw_change = Some(now);
        }

        if self.raw != self.stable {
            let since = self
                .last_raw_change
                .map(|t| now.saturating_duration_since(t))
                .unwrap_or_default();
            if since >= self.cfg.debounce {
                self.stable = self.raw;
                if self.stable {
                    // stable press: start the hold timer fresh
                    self.pressed_at = Some(now);
                    self.long_fired = false;
                } else {
                    let ev = if self.long_fired {
                        ButtonEvent::LongPress
                    } else {
                        ButtonEvent::Tap
                    };
                    self.pressed_at = None;
                    return Some(ev);
                }
            }
        }

        // While held, latch the long-press flag exactly once.
        if self.stable
            && !self.long_fired
            && let Some(t) = self.pressed_at
            && now.saturating_duration_since(t) >= self.cfg.long_press
        {
            self.long_fired = true;
        }

        None
    }

    /// Debounced level, for callers that care about the stable state.
    pub fn is_pressed(&self) -> bool {
        self.stable
    }
}

/// Merge left/right jog assertions into one demand. Both directions at
/// once resolve to neutral; silently picking a side when both lines read
/// asserted could drive the line the wrong way.
#[inline]
pub fn net_jog_demand(left: bool, right: bool) -> Option<Direction> {
    match (left, right) {
        (true, false) => Some(Direction::ToHome),
        (false, true) => Some(Direction::ToWell),
        _ => None,
    }
}
