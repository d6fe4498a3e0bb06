use std::sync::Arc;
use std::time::Duration;

use crate::capture::strategy::{CaptureRequest, CaptureStrategy, DirectRedraw, SurfaceSnapshot};
use crate::foundation::config::RetouchOpts;
use crate::foundation::error::{RetouchError, RetouchResult};
use crate::render::surface::Surface;

/// A captured surface and the strategy that produced it.
#[derive(Debug)]
pub struct Captured {
    pub surface: Surface,
    pub strategy: String,
    /// Strategies that failed before this one, with their reasons.
    pub failures: Vec<(String, String)>,
}

/// Ordered capture fallback chain. Each strategy is tried once.
pub struct CapturePolicy {
    strategies: Vec<Arc<dyn CaptureStrategy>>,
    strategy_timeout: Option<Duration>,
}

impl CapturePolicy {
    pub fn new(strategies: Vec<Box<dyn CaptureStrategy>>) -> Self {
        Self {
            strategies: strategies.into_iter().map(Arc::from).collect(),
            strategy_timeout: None,
        }
    }

    /// Direct redraw, then a snapshot scaled for the device class.
    ///
    /// Each strategy gets the stage timeout on its own.
    pub fn standard(opts: &RetouchOpts, is_touch_device: bool) -> Self {
        Self::new(vec![
            Box::new(DirectRedraw),
            Box::new(SurfaceSnapshot::new(
                opts.snapshot_scale(is_touch_device),
                opts.snapshot_background,
            )),
        ])
        .with_strategy_timeout(opts.stage_timeout())
    }

    /// Give up on a strategy after `limit` and move on to the next one.
    ///
    /// Only [`CapturePolicy::capture_within`] enforces it.
    pub fn with_strategy_timeout(mut self, limit: Duration) -> Self {
        self.strategy_timeout = Some(limit);
        self
    }

    pub fn strategy_timeout(&self) -> Option<Duration> {
        self.strategy_timeout
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First strategy result that is a non-blank surface wins.
    #[tracing::instrument(skip_all, fields(strategies = self.strategies.len()))]
    pub fn capture(&self, req: &CaptureRequest) -> RetouchResult<Captured> {
        let mut failures = Vec::new();
        for strategy in &self.strategies {
            let name = strategy.name().to_owned();
            if let Some(surface) = settle(&name, strategy.capture(req), &mut failures) {
                return Ok(Captured {
                    surface,
                    strategy: name,
                    failures,
                });
            }
        }
        Err(exhausted(&failures))
    }

    /// Like [`CapturePolicy::capture`], but each strategy runs on the blocking pool under the
    /// per-strategy timeout. A strategy that overruns counts as failed.
    ///
    /// A timed-out strategy cannot be interrupted; its worker finishes in the background
    /// and the result is dropped.
    #[tracing::instrument(skip_all, fields(strategies = self.strategies.len()))]
    pub async fn capture_within(&self, req: CaptureRequest) -> RetouchResult<Captured> {
        let mut failures = Vec::new();
        for strategy in &self.strategies {
            let name = strategy.name().to_owned();
            let worker = Arc::clone(strategy);
            let request = req.clone();
            let task = tokio::task::spawn_blocking(move || worker.capture(&request));
            let outcome = match self.strategy_timeout {
                Some(limit) => match tokio::time::timeout(limit, task).await {
                    Ok(joined) => flatten_join(joined),
                    Err(_) => Err(RetouchError::timeout(format!(
                        "{name} did not finish within {} ms",
                        limit.as_millis()
                    ))),
                },
                None => flatten_join(task.await),
            };
            if let Some(surface) = settle(&name, outcome, &mut failures) {
                return Ok(Captured {
                    surface,
                    strategy: name,
                    failures,
                });
            }
        }
        Err(exhausted(&failures))
    }
}

/// Keep a usable surface, or record why the strategy did not produce one.
fn settle(
    name: &str,
    outcome: RetouchResult<Surface>,
    failures: &mut Vec<(String, String)>,
) -> Option<Surface> {
    match outcome {
        Ok(surface) if surface.is_blank() => {
            tracing::warn!(strategy = %name, "capture produced a blank surface");
            failures.push((name.to_owned(), "produced a blank surface".to_owned()));
            None
        }
        Ok(surface) => {
            tracing::debug!(strategy = %name, size = %surface.size(), "captured");
            Some(surface)
        }
        Err(e) => {
            tracing::warn!(strategy = %name, error = %e, "capture strategy failed");
            failures.push((name.to_owned(), e.to_string()));
            None
        }
    }
}

fn exhausted(failures: &[(String, String)]) -> RetouchError {
    if failures.is_empty() {
        return RetouchError::capture("no capture strategies configured");
    }
    let detail = failures
        .iter()
        .map(|(name, reason)| format!("{name}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ");
    RetouchError::capture(detail)
}

fn flatten_join(
    joined: Result<RetouchResult<Surface>, tokio::task::JoinError>,
) -> RetouchResult<Surface> {
    joined.map_err(|e| RetouchError::capture(format!("capture worker failed: {e}")))?
}

#[cfg(test)]
#[path = "../../tests/unit/capture/policy.rs"]
mod tests;
