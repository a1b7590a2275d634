//! Per-attempt launch flow: launch, poll, redirect.
//!
//! DESIGN
//! ======
//! `idle → launching → polling → redirecting → finished`, with polling
//! skipped when the launch response already carries a URL. The progress
//! timer and the poll loop share one task through `tokio::select!`; the only
//! thing they both touch is the view.
//!
//! The first poll goes out immediately, later ones `poll_interval` after the
//! previous answer. There is no timeout: the loop runs until a URL arrives,
//! a request fails, or the caller drops the future.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::api::{Correlation, LaunchApi, LaunchResponse, UrlResponse};
use crate::config::{ClientConfig, CorrelationMode, DEFAULT_ALERT_MESSAGE, ErrorSurface};
use crate::error::LaunchError;
use crate::progress::{COMPLETE, Progress};
use crate::view::LaunchView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Launching,
    Polling,
    Redirecting,
    Finished,
}

/// How a launch attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Preconditions were not met; nothing was touched.
    Skipped,
    /// The view was sent to `url` after `polls` poll requests.
    Redirected { url: String, polls: u32 },
    /// The failure was logged and the flow stopped.
    Stalled { reason: String },
    /// The failure was shown to the user via [`LaunchView::alert`].
    Alerted { message: String },
}

/// State for a single launch attempt.
pub struct LaunchSession<'a> {
    api: &'a dyn LaunchApi,
    view: &'a dyn LaunchView,
    config: &'a ClientConfig,
    phase: Phase,
    progress: Progress,
    correlation: Option<Correlation>,
}

impl<'a> LaunchSession<'a> {
    #[must_use]
    pub fn new(api: &'a dyn LaunchApi, view: &'a dyn LaunchView, config: &'a ClientConfig) -> Self {
        Self { api, view, config, phase: Phase::Idle, progress: Progress::new(), correlation: None }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Correlation value taken from the launch response, once known.
    #[must_use]
    pub fn correlation(&self) -> Option<&Correlation> {
        self.correlation.as_ref()
    }

    /// Run the whole attempt. An attempt runs at most once; later calls
    /// return [`LaunchOutcome::Skipped`].
    pub async fn start_process(&mut self, email: Option<&str>) -> LaunchOutcome {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        if self.phase != Phase::Idle {
            debug!(phase = ?self.phase, "launch already started");
            return LaunchOutcome::Skipped;
        }
        if self.config.correlation_mode == CorrelationMode::Email && email.is_none() {
            debug!("no email entered; launch skipped");
            return LaunchOutcome::Skipped;
        }

        self.phase = Phase::Launching;
        self.view.disable_trigger();
        self.view.show_progress();
        self.progress.reset();
        self.view.render_progress(self.progress.value());

        let response = match self.api.launch(email).await {
            Ok(response) => response,
            Err(e) => return self.fail_request(&e),
        };

        if let Some(url) = response.url.clone() {
            info!(%url, "notebook already running");
            return self.redirect(url, 0);
        }
        if let Some(message) = &response.message {
            info!(%message, "launch accepted");
        }

        if self.config.error_surface == ErrorSurface::Alert {
            let message = alert_message(&response);
            return self.alert(message);
        }
        if let Some(reason) = &response.error {
            error!(%reason, "launch rejected");
            return self.stall(reason.clone());
        }

        self.correlation = correlation_for(self.config.correlation_mode, &response, email);
        let Some(correlation) = self.correlation.clone() else {
            warn!("launch response has no correlation value; not polling");
            return self.stall("no correlation value".to_owned());
        };
        self.poll_for_url(correlation).await
    }

    /// One step of the cosmetic timer. Returns the rendered value, if any.
    pub fn simulate_progress(&mut self) -> Option<u8> {
        let value = self.progress.advance(self.config.progress_step, self.config.progress_cap)?;
        self.view.render_progress(value);
        Some(value)
    }

    /// Poll until a URL arrives, animating progress meanwhile, then redirect
    /// after `redirect_delay`.
    pub async fn poll_for_url(&mut self, correlation: Correlation) -> LaunchOutcome {
        self.phase = Phase::Polling;
        info!(%correlation, "polling for notebook url");

        let period = self.config.progress_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let api = self.api;
        let poll = poll_after(api, &correlation, Duration::ZERO);
        tokio::pin!(poll);
        let mut polls: u32 = 0;

        let url = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.simulate_progress();
                }
                result = &mut poll => {
                    polls += 1;
                    match result {
                        Ok(UrlResponse { url: Some(url), .. }) => break url,
                        Ok(_) => {
                            debug!(polls, "notebook url not ready");
                            poll.set(poll_after(api, &correlation, self.config.poll_interval));
                        }
                        Err(e) => {
                            error!(error = %e, polls, "poll request failed");
                            return self.stall(e.to_string());
                        }
                    }
                }
            }
        };
        drop(ticker);

        self.phase = Phase::Redirecting;
        if self.progress.complete() {
            self.view.render_progress(COMPLETE);
        }
        time::sleep(self.config.redirect_delay).await;
        self.redirect(url, polls)
    }

    fn redirect(&mut self, url: String, polls: u32) -> LaunchOutcome {
        self.phase = Phase::Redirecting;
        info!(%url, polls, "redirecting to notebook");
        self.view.navigate(&url);
        self.phase = Phase::Finished;
        LaunchOutcome::Redirected { url, polls }
    }

    fn fail_request(&mut self, err: &LaunchError) -> LaunchOutcome {
        match self.config.error_surface {
            ErrorSurface::Log => {
                error!(error = %err, "launch request failed");
                self.stall(err.to_string())
            }
            ErrorSurface::Alert => {
                warn!(error = %err, "launch request failed");
                self.alert(DEFAULT_ALERT_MESSAGE.to_owned())
            }
        }
    }

    fn alert(&mut self, message: String) -> LaunchOutcome {
        self.view.alert(&message);
        self.phase = Phase::Finished;
        LaunchOutcome::Alerted { message }
    }

    fn stall(&mut self, reason: String) -> LaunchOutcome {
        self.phase = Phase::Finished;
        LaunchOutcome::Stalled { reason }
    }
}

async fn poll_after(
    api: &dyn LaunchApi,
    correlation: &Correlation,
    delay: Duration,
) -> Result<UrlResponse, LaunchError> {
    if !delay.is_zero() {
        time::sleep(delay).await;
    }
    api.get_url(correlation).await
}

/// Pick the poll key for the configured mode. Email mode prefers the echoed
/// email and falls back to the one that was submitted.
fn correlation_for(mode: CorrelationMode, response: &LaunchResponse, submitted: Option<&str>) -> Option<Correlation> {
    let non_blank = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned);
    match mode {
        CorrelationMode::Email => non_blank(response.email.as_deref())
            .or_else(|| non_blank(submitted))
            .map(Correlation::Email),
        CorrelationMode::SessionId => non_blank(response.session_id.as_deref()).map(Correlation::SessionId),
        CorrelationMode::None => None,
    }
}

fn alert_message(response: &LaunchResponse) -> String {
    response
        .error
        .clone()
        .or_else(|| response.message.clone())
        .unwrap_or_else(|| DEFAULT_ALERT_MESSAGE.to_owned())
}
