//! Terminal summaries with coloured status marks.
//!
//! The detailed progress goes through `tracing`; [`Printer`] only prints the
//! one-line outcome per account and the self-test table at the end.

use console::Style;

use crate::notify::selftest::SelfTestSummary;
use crate::orchestrator::{AccountJob, AccountRunSummary};

pub struct Printer {
    green: Style,
    red: Style,
    yellow: Style,
}

impl Default for Printer {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }
}

impl Printer {
    /// One line per account: check-in result, then delivery counts.
    pub fn account(&self, job: &AccountJob, summary: &AccountRunSummary) {
        let mark = if summary.report.has_error {
            self.red.apply_to("✗")
        } else {
            self.green.apply_to("✓")
        };
        println!(
            "  {mark} {}: {} character(s) checked in",
            job.label(),
            summary.succeeded
        );

        let delivery = &summary.delivery;
        if delivery.attempted() == 0 {
            println!(
                "    {} no notification channel configured",
                self.yellow.apply_to("!")
            );
            return;
        }
        println!(
            "    notifications: {} delivered, {} failed",
            delivery.delivered.len(),
            delivery.failed.len()
        );
        for (kind, reason) in &delivery.failed {
            println!("    {} {kind}: {reason}", self.red.apply_to("✗"));
        }
    }

    pub fn self_test(&self, summary: &SelfTestSummary) {
        if summary.results.is_empty() {
            println!(
                "  {} no notification channel configured",
                self.yellow.apply_to("!")
            );
            return;
        }
        for (kind, result) in &summary.results {
            match result {
                Ok(()) => println!("  {} {kind}", self.green.apply_to("✓")),
                Err(reason) => println!("  {} {kind}: {reason}", self.red.apply_to("✗")),
            }
        }
        println!(
            "  {} succeeded, {} failed",
            summary.succeeded, summary.failed
        );
    }
}
