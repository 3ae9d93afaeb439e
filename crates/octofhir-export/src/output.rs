use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::aggregate::AggregateReport;
use crate::export::PatientExport;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_export(export: &PatientExport) {
    print_success(&format!(
        "Wrote {} entries for patient {} to {}",
        export.entries,
        export.report.patient_id.cyan(),
        export.path.display().to_string().cyan()
    ));
    println!("{}", summary_table(&export.report));
    if !export.report.is_complete() {
        println!(
            "{} some sections are missing; see the log for details",
            "!".yellow()
        );
    }
}

/// One row per fetched section, plus the resolved Medications.
pub fn summary_table(report: &AggregateReport) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Section", "Entries", "Status"]);
    for (resource_type, count) in &report.sections {
        let status = match report.failure(*resource_type) {
            Some(err) => format!("failed: {err}"),
            None => "ok".to_string(),
        };
        builder.push_record([resource_type.to_string(), count.to_string(), status]);
    }
    let medication_status = if report.medications_unresolved == 0 {
        "ok".to_string()
    } else {
        format!("{} unresolved", report.medications_unresolved)
    };
    builder.push_record([
        "Medication".to_string(),
        report.medications_resolved.to_string(),
        medication_status,
    ]);
    builder.build().with(Style::rounded()).to_string()
}
