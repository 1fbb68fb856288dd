//! Console output for the `fdotp` binary.

use terminal_size::{terminal_size, Width};

use crate::config::RunConfig;
use crate::math::dot_product::{DotProductFn, C_KERNELS_AVAILABLE};
use crate::orchestrator::RunReport;
use crate::utils::cycles::unit_name;
use crate::utils::{CycleStats, VariantInfo};

/// Get the current terminal width, constrained to a reasonable range
fn get_term_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        (w as usize).clamp(40, 200)
    } else {
        80
    }
}

/// Truncate string with ellipsis if it exceeds width (character-wise)
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut result: String = s.chars().take(width.saturating_sub(3)).collect();
        result.push_str("...");
        result
    }
}

/// Lines of the configuration box.
fn header_lines(m: usize, config: &RunConfig) -> Vec<String> {
    let mut lines = vec![
        format!("Vector length: {}", m),
        format!(
            "Cores: {} x {} FPU, {} elements per core",
            config.num_cores,
            config.fpus_per_core,
            m / config.num_cores.max(1)
        ),
        format!("Kernel: {}", config.kernel),
        format!("Timer unit: {}", unit_name()),
    ];
    if !config.offsets.is_empty() {
        let shifted: Vec<String> = config
            .offsets
            .iter()
            .map(|(core, off)| format!("core {} +{}", core, off))
            .collect();
        lines.push(format!("Padding: {}", shifted.join(", ")));
    }
    lines
}

/// Print the run configuration in a box
pub fn print_header(m: usize, config: &RunConfig) {
    let max_content_width = get_term_width().min(80).saturating_sub(4);
    let lines = header_lines(m, config);
    let content_width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(max_content_width);

    let border = "─".repeat(content_width + 2);
    println!("┌{}┐", border);
    for line in &lines {
        println!(
            "│ {:<width$} │",
            truncate(line, content_width),
            width = content_width
        );
    }
    println!("└{}┘", border);
}

/// Print the three report lines
pub fn print_report(report: &RunReport) {
    println!();
    println!("{}", report);
}

/// Lines of the kernel list.
fn kernel_lines(variants: &[VariantInfo<DotProductFn>]) -> Vec<String> {
    let mut lines: Vec<String> = variants
        .iter()
        .map(|v| {
            let name = match (v.name.starts_with("c-"), crate::utils::C_COMPILER_NAME) {
                (true, Some(c)) => format!("{} ({})", v.name, c),
                _ => v.name.to_string(),
            };
            format!("  {:<24} {}", name, v.description)
        })
        .collect();
    if !C_KERNELS_AVAILABLE {
        lines.push("  (C kernels not built: no compatible C compiler)".to_string());
    }
    lines
}

/// Print the kernel variants of this build
pub fn print_kernels(variants: &[VariantInfo<DotProductFn>]) {
    println!("Available kernels:");
    println!();
    for line in kernel_lines(variants) {
        println!("{}", line);
    }
}

/// Print the summary of repeated runs
pub fn print_stats(stats: &CycleStats, deterministic: bool) {
    let unit = unit_name();
    println!();
    println!("  Runs:   {}", stats.samples);
    println!(
        "  Cycles: min {} {unit}, median {} {unit}, max {} {unit} (CV {:.2}%)",
        stats.min,
        stats.median,
        stats.max,
        stats.cv_percent()
    );
    println!(
        "  Result: {}",
        if deterministic {
            "bit-identical across runs"
        } else {
            "differs between runs"
        }
    );
}
