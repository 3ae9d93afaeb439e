use anyhow::{Context, Result};
use clap::Parser;

use octofhir_export::cli::Cli;
use octofhir_export::config::{ExportConfig, loader};
use octofhir_export::output::{print_error, print_export};
use octofhir_export::{ExportPipeline, observability};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load(&cli)?;
    observability::init_tracing_with_level(&cfg.logging.level);

    let patients = cfg.patient_ids(&cli.patients).map_err(anyhow::Error::msg)?;
    let pipeline =
        ExportPipeline::from_config(&cfg).context("Failed to load service credentials")?;

    let mut failed = 0;
    for patient_id in &patients {
        match pipeline.export(patient_id).await {
            Ok(export) => print_export(&export),
            Err(e) => {
                tracing::error!(patient_id = %patient_id, error = %e, "export failed");
                print_error(&format!("Patient {patient_id}: {e}"));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} patient exports failed", patients.len());
    }
    Ok(())
}

fn load(cli: &Cli) -> Result<ExportConfig> {
    let mut cfg = loader::load_config(cli.config.as_deref()).map_err(anyhow::Error::msg)?;
    if let Some(dir) = &cli.output_dir {
        cfg.output.dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        cfg.logging.level = level.clone();
    }
    cfg.strict |= cli.strict;
    cfg.validate().map_err(anyhow::Error::msg)?;
    Ok(cfg)
}
