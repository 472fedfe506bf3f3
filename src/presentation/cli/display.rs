use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Terminal output helpers
#[derive(Debug, Clone, Copy)]
pub struct Display {
    use_color: bool,
}

impl Display {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn step(&self, message: &str) {
        println!("{} {}", "::".blue().bold(), message);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }

    pub fn failure(&self, message: &str) {
        println!("{} {}", "✗".red().bold(), message);
    }

    /// Spinner for long operations such as clones
    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if !self.use_color {
            return ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_strings(&["⠁", "⠂", "⠄", "⡀", "⢀", "⠠", "⠐", "⠈", " "])
            .template("{spinner:.green} {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}
