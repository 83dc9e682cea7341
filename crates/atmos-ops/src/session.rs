//! Latest-wins render session.
//!
//! Interactive front ends change parameters far faster than a full-size
//! render completes. A [`RenderSession`] owns a worker thread holding the
//! source image; the caller submits parameter sets and polls for results.
//!
//! The worker waits for a quiet period of [`SessionConfig::debounce`] after
//! each request, drains everything queued meanwhile, and renders only the
//! newest parameters. Each submission gets a [`Generation`]; results for an
//! older generation than the latest submitted are dropped by the session
//! rather than handed to the caller.
//!
//! ```text
//! caller  --SessionMsg::Render{gen, params}-->  worker
//! caller  <--RenderEvent::Ready{gen, image}---  worker
//! ```

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use atmos_core::RasterImage;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use tracing::{debug, trace, warn};

use crate::params::EffectParameters;
use crate::pipeline::render;

/// Generation counter for invalidating stale results.
pub type Generation = u64;

/// Default quiet period before a render starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(30);

/// Session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Quiet period the worker waits for before rendering.
    pub debounce: Duration,
    /// Noise seed; every render restarts from it. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { debounce: DEFAULT_DEBOUNCE, seed: None }
    }
}

/// Messages from the session to its worker.
#[derive(Debug)]
enum SessionMsg {
    Render { generation: Generation, params: EffectParameters },
    Shutdown,
}

/// Events from the worker.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    /// A render finished.
    Ready {
        /// Generation of the parameters that produced `image`.
        generation: Generation,
        /// Rendered image.
        image: RasterImage,
    },
    /// A render failed.
    Failed {
        /// Generation of the rejected parameters.
        generation: Generation,
        /// Error description.
        message: String,
    },
}

impl RenderEvent {
    /// Generation this event answers.
    pub fn generation(&self) -> Generation {
        match self {
            RenderEvent::Ready { generation, .. } | RenderEvent::Failed { generation, .. } => {
                *generation
            }
        }
    }
}

struct Worker {
    rx: Receiver<SessionMsg>,
    tx: Sender<RenderEvent>,
    source: RasterImage,
    config: SessionConfig,
}

impl Worker {
    fn run(self) {
        while let Ok(msg) = self.rx.recv() {
            let SessionMsg::Render { generation, params } = msg else {
                break;
            };
            let Some((generation, params)) = self.settle(generation, params) else {
                break;
            };
            self.render(generation, &params);
        }
        debug!("Render worker shutdown");
    }

    /// Keeps replacing the request until the queue stays quiet for one
    /// debounce interval. `None` means shut down.
    fn settle(
        &self,
        mut generation: Generation,
        mut params: EffectParameters,
    ) -> Option<(Generation, EffectParameters)> {
        loop {
            match self.rx.recv_timeout(self.config.debounce) {
                Ok(SessionMsg::Render { generation: g, params: p }) => {
                    trace!(superseded = generation, by = g, "Request superseded");
                    generation = g;
                    params = p;
                }
                Ok(SessionMsg::Shutdown) | Err(RecvTimeoutError::Disconnected) => return None,
                Err(RecvTimeoutError::Timeout) => return Some((generation, params)),
            }
        }
    }

    fn render(&self, generation: Generation, params: &EffectParameters) {
        let mut rng = match self.config.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_entropy(),
        };
        let start = Instant::now();
        let event = match render(&self.source, params, &mut rng) {
            Ok(image) => {
                debug!(generation, elapsed_ms = start.elapsed().as_millis() as u64, "Render ready");
                RenderEvent::Ready { generation, image }
            }
            Err(e) => {
                warn!(generation, error = %e, "Render failed");
                RenderEvent::Failed { generation, message: e.to_string() }
            }
        };
        let _ = self.tx.send(event);
    }
}

/// Background renderer that always converges on the latest parameters.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use atmos_core::RasterImage;
/// use atmos_ops::session::{RenderEvent, RenderSession, SessionConfig};
/// use atmos_ops::EffectParameters;
///
/// let src = RasterImage::filled(32, 32, [80, 90, 100, 255]).unwrap();
/// let mut session = RenderSession::new(src, SessionConfig::default());
/// for blur in [1.0, 2.0, 3.0] {
///     session.submit(EffectParameters { blur_radius: blur, ..Default::default() });
/// }
/// let event = session.wait_latest(Duration::from_secs(10)).unwrap();
/// assert_eq!(event.generation(), 3);
/// assert!(matches!(event, RenderEvent::Ready { .. }));
/// ```
pub struct RenderSession {
    tx: Sender<SessionMsg>,
    rx: Receiver<RenderEvent>,
    generation: Generation,
    worker: Option<JoinHandle<()>>,
}

impl RenderSession {
    /// Starts a worker that renders `source`.
    pub fn new(source: RasterImage, config: SessionConfig) -> Self {
        let (tx, rx_in_worker) = mpsc::channel();
        let (tx_to_caller, rx) = mpsc::channel();

        debug!(w = source.width(), h = source.height(), ?config, "Starting render session");
        let worker = thread::spawn(move || {
            Worker { rx: rx_in_worker, tx: tx_to_caller, source, config }.run();
        });

        Self { tx, rx, generation: 0, worker: Some(worker) }
    }

    /// Queues a render and returns its generation.
    ///
    /// Any request still waiting in the queue is superseded.
    pub fn submit(&mut self, params: EffectParameters) -> Generation {
        self.generation += 1;
        let generation = self.generation;
        trace!(generation, "Submitting render");
        if self.tx.send(SessionMsg::Render { generation, params }).is_err() {
            warn!(generation, "Render worker is gone");
        }
        generation
    }

    /// Generation of the most recent submission (0 before the first).
    pub fn latest_generation(&self) -> Generation {
        self.generation
    }

    fn is_current(&self, event: &RenderEvent) -> bool {
        let current = event.generation() >= self.generation;
        if !current {
            trace!(stale = event.generation(), latest = self.generation, "Dropping stale result");
        }
        current
    }

    /// Returns the next current event without blocking.
    pub fn poll(&self) -> Option<RenderEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if self.is_current(&event) {
                return Some(event);
            }
        }
        None
    }

    /// Blocks until the event for the latest submission arrives, or
    /// `timeout` elapses.
    pub fn wait_latest(&self, timeout: Duration) -> Option<RenderEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.checked_duration_since(Instant::now())?;
            match self.rx.recv_timeout(left) {
                Ok(event) if self.is_current(&event) => return Some(event),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        let _ = self.tx.send(SessionMsg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> RasterImage {
        RasterImage::from_fn(24, 16, |x, y| [(x * 10) as u8, (y * 15) as u8, 60, 255]).unwrap()
    }

    #[test]
    fn test_generation_counts_submissions() {
        let mut session = RenderSession::new(source(), SessionConfig::default());
        assert_eq!(session.latest_generation(), 0);
        assert_eq!(session.submit(EffectParameters::default()), 1);
        assert_eq!(session.submit(EffectParameters::default()), 2);
        assert_eq!(session.latest_generation(), 2);
    }

    #[test]
    fn test_single_render_matches_pipeline() {
        let config = SessionConfig { seed: Some(9), ..Default::default() };
        let params = EffectParameters { noise_intensity: 5.0, blur_radius: 1.0, ..Default::default() };
        let mut session = RenderSession::new(source(), config);
        session.submit(params.clone());

        let event = session.wait_latest(Duration::from_secs(10)).unwrap();
        let RenderEvent::Ready { generation, image } = event else {
            panic!("expected a rendered image");
        };
        assert_eq!(generation, 1);
        let expected = render(&source(), &params, &mut Pcg32::seed_from_u64(9)).unwrap();
        assert_eq!(image, expected);
    }

    #[test]
    fn test_failure_is_reported() {
        let mut session = RenderSession::new(source(), SessionConfig::default());
        session.submit(EffectParameters { max_dimension: 0, ..Default::default() });
        let event = session.wait_latest(Duration::from_secs(10)).unwrap();
        assert!(matches!(event, RenderEvent::Failed { generation: 1, .. }));
    }

    #[test]
    fn test_poll_empty_before_submit() {
        let session = RenderSession::new(source(), SessionConfig::default());
        assert!(session.poll().is_none());
    }

    #[test]
    fn test_drop_joins_worker() {
        let mut session = RenderSession::new(source(), SessionConfig::default());
        session.submit(EffectParameters { blur_radius: 2.0, ..Default::default() });
        drop(session);
    }
}
