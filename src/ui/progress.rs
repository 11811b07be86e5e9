//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar over the precache asset list
///
/// Shows an indicatif bar in interactive mode, one line per asset in CI.
pub struct PrecacheProgress {
    bar: Option<ProgressBar>,
}

impl PrecacheProgress {
    pub fn new(ctx: &UiContext, total: u64) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total);
            let template = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} Precaching  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("━╸─");
            bar.set_style(template);
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Precaching {} assets...", total);
            None
        };
        Self { bar }
    }

    /// Record one fetched asset
    pub fn on_fetched(&self, url: &Url) {
        let label = asset_label(url);
        match self.bar {
            Some(ref bar) => {
                bar.inc(1);
                bar.set_message(label);
            }
            None => println!("  fetched {}", label),
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// Asset path for display, prefixed with the host for font CDN assets
fn asset_label(url: &Url) -> String {
    let label = match url.host_str() {
        Some(host) if host.starts_with("fonts.") => format!("{}{}", host, url.path()),
        _ => url.path().to_string(),
    };
    if label.chars().count() > 48 {
        let head: String = label.chars().take(45).collect();
        format!("{}...", head)
    } else {
        label
    }
}
