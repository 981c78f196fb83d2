//! Interpolation.
//!
//! The server sends state at discrete tick boundaries; the client renders at
//! its own rate. Each synchronized value keeps its last two authoritative
//! samples and renders a blend between them, one tick behind the server.

use std::time::{Duration, Instant};

use worldsync_shared::math::{lerp_angle, Vec2};

/// Values that can be blended between two samples.
pub trait Lerp: Copy {
    fn lerp_to(self, to: Self, t: f32) -> Self;
}

impl Lerp for Vec2 {
    fn lerp_to(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

/// Rotation in radians; blends along the shorter arc.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Angle(pub f32);

impl Lerp for Angle {
    fn lerp_to(self, to: Self, t: f32) -> Self {
        Angle(lerp_angle(self.0, to.0, t))
    }
}

/// Blend factor for a sample set at `changed` and rendered at `now`.
///
/// Always in `[0, 1]`: late frames hold the newest sample rather than
/// extrapolating past it.
pub fn interpolation_factor(now: Instant, changed: Instant, tick_interval: Duration) -> f32 {
    if tick_interval.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(changed);
    (elapsed.as_secs_f32() / tick_interval.as_secs_f32()).clamp(0.0, 1.0)
}

/// An authoritative value plus the sample before it.
#[derive(Debug, Clone)]
pub struct Interpolated<T> {
    current: T,
    previous: T,
    last_change: Option<Instant>,
    initialized: bool,
}

impl<T: Lerp> Interpolated<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: initial,
            previous: initial,
            last_change: None,
            initialized: false,
        }
    }

    /// Records a new authoritative sample.
    ///
    /// The first sample only initializes the value; there is nothing to blend
    /// from yet.
    pub fn set(&mut self, value: T, now: Instant) {
        if !self.initialized {
            self.snap(value);
            return;
        }
        self.previous = self.current;
        self.current = value;
        self.last_change = Some(now);
    }

    /// Jumps to `value` and forgets the previous sample.
    pub fn snap(&mut self, value: T) {
        self.current = value;
        self.previous = value;
        self.last_change = None;
        self.initialized = true;
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn previous(&self) -> T {
        self.previous
    }

    /// Whether two samples exist to blend between.
    pub fn has_previous(&self) -> bool {
        self.last_change.is_some()
    }

    /// Render value at `now`; the current sample when there is no previous one.
    pub fn sample(&self, now: Instant, tick_interval: Duration) -> T {
        match self.last_change {
            Some(changed) => {
                let t = interpolation_factor(now, changed, tick_interval);
                self.previous.lerp_to(self.current, t)
            }
            None => self.current,
        }
    }
}

/// Measures the spacing between consecutive tick updates.
#[derive(Debug, Clone)]
pub struct TickClock {
    last_arrival: Option<Instant>,
    interval: Duration,
}

impl TickClock {
    /// `nominal` is used until two updates have arrived.
    pub fn new(nominal: Duration) -> Self {
        Self {
            last_arrival: None,
            interval: nominal,
        }
    }

    /// Records an update arrival and returns the current interval estimate.
    pub fn on_update(&mut self, now: Instant) -> Duration {
        if let Some(last) = self.last_arrival {
            self.interval = now.saturating_duration_since(last);
        }
        self.last_arrival = Some(now);
        self.interval
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Forgets the last arrival; the next update does not produce a sample.
    pub fn reset(&mut self) {
        self.last_arrival = None;
    }
}
