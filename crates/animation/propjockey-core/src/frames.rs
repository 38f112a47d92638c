//! Frame sources that drive a [`TimingPool`](crate::TimingPool).
//!
//! A pool calls [`FrameSource::start_loop`] when its first animation starts and
//! [`FrameSource::stop_loop`] when its last one ends. Sources are cloneable handles: the host
//! keeps one clone to feed frames while the pool owns another.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::pool::PoolTicker;
use crate::Result;

pub trait FrameSource {
    fn start_loop(&mut self, ticker: PoolTicker);

    fn stop_loop(&mut self);
}

/// No loop at all; the host calls `TimingPool::tick` itself.
#[derive(Copy, Clone, Debug, Default)]
pub struct ManualFrames;

impl FrameSource for ManualFrames {
    fn start_loop(&mut self, _ticker: PoolTicker) {}

    fn stop_loop(&mut self) {}
}

#[derive(Debug, Default)]
struct TimestampState {
    ticker: Option<PoolTicker>,
    running: bool,
    current: Option<f64>,
}

/// Frame-callback driven source: the host reports each frame's timestamp and the delta is
/// taken from the previous one. The first frame after a start has a delta of 0.
#[derive(Clone, Debug, Default)]
pub struct TimestampFrames {
    inner: Rc<RefCell<TimestampState>>,
}

impl TimestampFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    /// Report a frame at `timestamp` (milliseconds). Returns whether another frame is wanted.
    pub fn frame(&self, timestamp: f64) -> Result<bool> {
        let (ticker, delta) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.running {
                return Ok(false);
            }
            let previous = inner.current.unwrap_or(timestamp);
            inner.current = Some(timestamp);
            match inner.ticker.clone() {
                Some(ticker) => (ticker, timestamp - previous),
                None => return Ok(false),
            }
        };
        let running = ticker.tick(delta)?;
        Ok(running && self.is_running())
    }
}

impl FrameSource for TimestampFrames {
    fn start_loop(&mut self, ticker: PoolTicker) {
        let mut inner = self.inner.borrow_mut();
        inner.ticker = Some(ticker);
        inner.running = true;
        inner.current = None;
    }

    fn stop_loop(&mut self) {
        self.inner.borrow_mut().running = false;
    }
}

#[derive(Debug)]
struct IntervalState {
    ticker: Option<PoolTicker>,
    running: bool,
    delta: f64,
}

/// Fixed-interval source: every fire ticks the pool by the same delta.
#[derive(Clone, Debug)]
pub struct IntervalFrames {
    inner: Rc<RefCell<IntervalState>>,
}

impl IntervalFrames {
    /// `delta` is in milliseconds.
    pub fn new(delta: f64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(IntervalState {
                ticker: None,
                running: false,
                delta,
            })),
        }
    }

    pub fn fps(fps: f64) -> Self {
        Self::new(1000.0 / fps)
    }

    pub fn delta(&self) -> f64 {
        self.inner.borrow().delta
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    /// Tick once. Returns whether the loop is still running.
    pub fn fire(&self) -> Result<bool> {
        let (ticker, delta) = {
            let inner = self.inner.borrow();
            match (&inner.ticker, inner.running) {
                (Some(ticker), true) => (ticker.clone(), inner.delta),
                _ => return Ok(false),
            }
        };
        let running = ticker.tick(delta)?;
        Ok(running && self.is_running())
    }

    /// Fire on the current thread, sleeping `delta` between fires, until the pool stops.
    pub fn run(&self) -> Result<()> {
        let pause = Duration::from_secs_f64(self.delta().max(0.0) / 1000.0);
        while self.fire()? {
            std::thread::sleep(pause);
        }
        Ok(())
    }
}

impl FrameSource for IntervalFrames {
    fn start_loop(&mut self, ticker: PoolTicker) {
        let mut inner = self.inner.borrow_mut();
        inner.ticker = Some(ticker);
        inner.running = true;
    }

    fn stop_loop(&mut self) {
        self.inner.borrow_mut().running = false;
    }
}
