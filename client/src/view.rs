//! Presentation seam for the launch flow.

/// Everything the launch flow does to the page it runs in.
///
/// Implementations render however suits the host: DOM widgets, a terminal
/// bar, or an event log in tests.
pub trait LaunchView: Send + Sync {
    /// Disable the control that started the launch so it cannot fire twice.
    fn disable_trigger(&self);

    /// Reveal the progress indicator.
    fn show_progress(&self);

    /// Display `percent` (0..=100).
    fn render_progress(&self, percent: u8);

    /// Leave for the notebook.
    fn navigate(&self, url: &str);

    /// Blocking, user-visible error message.
    fn alert(&self, message: &str);
}
