//! User-facing output for the albumsync binary
//!
//! Diagnostics go through `tracing`; this module prints the few results a
//! user asked for, either as text or as one JSON document.

use albumsync_sync::driver::DriverReport;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Formats command results
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn info(&self, message: &str);
    fn report(&self, report: &DriverReport);
}

/// Plain text with a leading check mark
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }

    fn info(&self, message: &str) {
        println!("  {}", message);
    }

    fn report(&self, report: &DriverReport) {
        println!(
            "\u{2713} {} pass(es): {} uploaded, {} failed, {} title(s) known",
            report.passes,
            report.uploaded,
            report.failed,
            report.known.len()
        );
    }
}

/// One JSON object per result
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }

    fn info(&self, _message: &str) {}

    fn report(&self, report: &DriverReport) {
        println!("{}", report_json(report));
    }
}

fn report_json(report: &DriverReport) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "listing_failures": report.listing_failures,
        "passes": report.passes,
        "uploaded": report.uploaded,
        "failed": report.failed,
        "known": report.known.len(),
    })
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_fields() {
        let mut report = DriverReport {
            passes: 3,
            uploaded: 2,
            failed: 1,
            ..DriverReport::default()
        };
        report.known.insert("a_2024_01_01_00_00_00");

        let json = report_json(&report);
        assert_eq!(json["passes"], 3);
        assert_eq!(json["uploaded"], 2);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["known"], 1);
        assert_eq!(json["listing_failures"], 0);
    }
}
