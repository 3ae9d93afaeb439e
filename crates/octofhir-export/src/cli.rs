use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "octofhir-export")]
#[command(
    about = "Export a patient's clinical record from a SMART Backend Services FHIR API as a collection Bundle"
)]
#[command(version)]
pub struct Cli {
    /// Patient identifiers to export (defaults to `patients` from the config file)
    pub patients: Vec<String>,

    /// Path to the TOML config file
    #[arg(short, long, env = "OCTOFHIR_EXPORT_CONFIG")]
    pub config: Option<String>,

    /// Directory the bundles are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Fail a patient on the first section that cannot be fetched
    #[arg(long)]
    pub strict: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_patients_and_flags() {
        let cli = Cli::try_parse_from([
            "octofhir-export",
            "2000190",
            "36000216",
            "--output-dir",
            "out",
            "--strict",
        ])
        .unwrap();
        assert_eq!(cli.patients, ["2000190", "36000216"]);
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert!(cli.strict);
        assert!(cli.log_level.is_none());
    }
}
