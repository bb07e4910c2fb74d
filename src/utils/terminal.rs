//! Terminal output utilities

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{}: {}", style("success").green().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{}: {}", style("info").blue().bold(), message);
}

/// Print an aligned `label : value` line, used for the run banner
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{:<10}: {}", style(label).cyan(), value);
}

/// Print the header that starts each target's build
pub fn print_target_header(index: usize, total: usize, target: &str) {
    println!(
        "\n{} {}",
        style(format!("[{}/{}]", index, total)).bold().dim(),
        style(format!("Building {}", target)).bold()
    );
}

/// Echo a command line before it runs (verbose mode)
pub fn print_command(program: &str, args: &[String]) {
    eprintln!("{} {} {}", style("$").dim(), program, args.join(" "));
}

/// Report how long a command took (verbose mode)
pub fn print_elapsed(program: &str, elapsed: Duration) {
    eprintln!(
        "{}",
        style(format!("  {} finished in {:.1}s", program, elapsed.as_secs_f64())).dim()
    );
}

/// Create a spinner progress bar
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
