//! Progress reporting for a running turn

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use superai_application::TurnObserver;
use superai_domain::{FinalAnswer, ProviderId, ProviderResponse, TurnId};

/// Progress bar counting provider answers, then a spinner while synthesizing
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn providers_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnObserver for ProgressReporter {
    fn on_dispatch(&self, _turn_id: TurnId, providers: &[ProviderId]) {
        let pb = ProgressBar::new(providers.len() as u64);
        pb.set_style(Self::providers_style());
        pb.set_prefix("Asking providers");
        pb.set_message("waiting...");
        pb.enable_steady_tick(Duration::from_millis(120));
        *self.bar() = Some(pb);
    }

    fn on_provider_complete(&self, response: &ProviderResponse, _cleaned: &str) {
        if let Some(pb) = self.bar().as_ref() {
            let name = response.provider.display_name();
            let status = if response.is_success() {
                format!("{} {}", "v".green(), name)
            } else {
                format!("{} {}", "x".red(), name)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_synthesis_start(&self, responses: usize) {
        let mut bar = self.bar();
        if let Some(pb) = bar.take() {
            pb.finish_and_clear();
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.set_prefix("Synthesizing");
        spinner.set_message(format!("{} answers", responses));
        spinner.enable_steady_tick(Duration::from_millis(120));
        *bar = Some(spinner);
    }

    fn on_final_answer(&self, answer: &FinalAnswer) {
        if let Some(pb) = self.bar().take() {
            let done = if answer.is_degraded() {
                "done (degraded)".yellow()
            } else {
                "done".green()
            };
            pb.finish_with_message(done.to_string());
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl TurnObserver for SimpleProgress {
    fn on_dispatch(&self, _turn_id: TurnId, providers: &[ProviderId]) {
        let names: Vec<&str> = providers.iter().map(|p| p.display_name()).collect();
        println!("{} {} {}", "->".cyan(), "Asking".bold(), names.join(", "));
    }

    fn on_provider_complete(&self, response: &ProviderResponse, _cleaned: &str) {
        let name = response.provider.display_name();
        if response.is_success() {
            println!("  {} {}", "v".green(), name);
        } else {
            println!(
                "  {} {} ({})",
                "x".red(),
                name,
                response.error_message.as_deref().unwrap_or("failed")
            );
        }
    }

    fn on_synthesis_start(&self, responses: usize) {
        println!("{} {} {} answers", "->".cyan(), "Synthesizing".bold(), responses);
    }
}
