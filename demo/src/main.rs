//! dosewise Reference Runtime: Demo CLI
//!
//! Runs the reference scenarios, or scores a patient file against the
//! reference formulary (or a formulary TOML of your own).
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- scenario cardiorenal
//!   cargo run -p demo -- patients
//!   cargo run -p demo -- score --sample uninsured --breakdown
//!   cargo run -p demo -- score --patient patient.json --formulary my.toml --json

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dosewise_contracts::error::{DosewiseError, DosewiseResult};
use dosewise_contracts::score::DrugBreakdown;
use dosewise_core::RecommendationEngine;
use dosewise_formulary::TomlFormulary;
use dosewise_ref::mock_data::all_patients;
use dosewise_ref::scenarios::{self, affordability, at_max, cardiorenal, new_start, overnight_lows};
use dosewise_ref::{reference_formulary, PatientRecord};

// ── CLI definition ────────────────────────────────────────────────────────────

/// dosewise: diabetes medication recommendation and titration demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "dosewise diabetes decision engine demo",
    long_about = "Runs dosewise reference scenarios or scores a patient record, showing\n\
                  safety exclusions, ranking, de-escalation, and dose instructions."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all five reference scenarios in sequence.
    RunAll,
    /// Run a single reference scenario.
    Scenario {
        #[arg(value_enum)]
        name: ScenarioName,
    },
    /// List the built-in sample patients.
    Patients,
    /// Score one patient and print the recommendation.
    Score {
        /// Patient record as JSON.
        #[arg(long, conflicts_with = "sample", required_unless_present = "sample")]
        patient: Option<PathBuf>,
        /// Name of a built-in sample patient (see `patients`).
        #[arg(long)]
        sample: Option<String>,
        /// Formulary TOML to use instead of the reference formulary.
        #[arg(long)]
        formulary: Option<PathBuf>,
        /// Also print the per-drug audit breakdown.
        #[arg(long)]
        breakdown: bool,
        /// Print the recommendation as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScenarioName {
    NewStart,
    Cardiorenal,
    OvernightLows,
    Affordability,
    AtMax,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug to see every rule match and score.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::Scenario { name } => run_one(name),
        Command::Patients => {
            list_patients();
            Ok(())
        }
        Command::Score {
            patient,
            sample,
            formulary,
            breakdown,
            json,
        } => score(patient.as_deref(), sample.as_deref(), formulary.as_deref(), breakdown, json),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn reference_engine() -> DosewiseResult<RecommendationEngine> {
    Ok(RecommendationEngine::from_source(&reference_formulary()?))
}

fn run_all() -> DosewiseResult<()> {
    print_banner();
    scenarios::run_all(&reference_engine()?)?;
    println!("All scenarios completed successfully.");
    Ok(())
}

fn run_one(name: ScenarioName) -> DosewiseResult<()> {
    print_banner();
    let engine = reference_engine()?;
    match name {
        ScenarioName::NewStart => new_start::run_scenario(&engine)?,
        ScenarioName::Cardiorenal => cardiorenal::run_scenario(&engine)?,
        ScenarioName::OvernightLows => overnight_lows::run_scenario(&engine)?,
        ScenarioName::Affordability => affordability::run_scenario(&engine)?,
        ScenarioName::AtMax => at_max::run_scenario(&engine)?,
    };
    Ok(())
}

fn list_patients() {
    for (name, record) in all_patients() {
        let meds: Vec<&str> = record.medications.iter().map(|m| m.drug_id.as_str()).collect();
        println!(
            "{:<18} A1C {:<5} eGFR {:<5} meds: {}",
            name,
            record.a1c.map_or("-".to_string(), |v| v.to_string()),
            record.egfr.map_or("-".to_string(), |v| v.to_string()),
            if meds.is_empty() { "none".to_string() } else { meds.join(", ") }
        );
    }
}

// ── Scoring a single record ──────────────────────────────────────────────────

fn load_record(patient: Option<&Path>, sample: Option<&str>) -> DosewiseResult<PatientRecord> {
    if let Some(name) = sample {
        return all_patients()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, r)| r)
            .ok_or_else(|| DosewiseError::ProfileError {
                reason: format!("unknown sample patient '{}'", name),
            });
    }
    let Some(path) = patient else {
        return Err(DosewiseError::ProfileError {
            reason: "either --patient or --sample is required".to_string(),
        });
    };
    let text = fs::read_to_string(path).map_err(|e| DosewiseError::ProfileError {
        reason: format!("failed to read patient file '{}': {}", path.display(), e),
    })?;
    PatientRecord::from_json_str(&text)
}

fn score(
    patient: Option<&Path>,
    sample: Option<&str>,
    formulary: Option<&Path>,
    breakdown: bool,
    json: bool,
) -> DosewiseResult<()> {
    let engine = match formulary {
        Some(path) => RecommendationEngine::from_source(&TomlFormulary::from_file(path)?),
        None => reference_engine()?,
    };
    let record = load_record(patient, sample)?;
    let profile = record.to_profile(&engine.config().drugs)?;
    info!(drugs = engine.config().drugs.len(), "formulary loaded");

    let rec = engine.recommend(&profile, record.glucose.as_ref());
    let rows = breakdown.then(|| engine.breakdown(&profile, record.glucose.as_ref()));

    if json {
        let value = serde_json::json!({ "recommendation": rec, "breakdown": rows });
        let text = serde_json::to_string_pretty(&value).map_err(|e| DosewiseError::ProfileError {
            reason: format!("failed to serialize recommendation: {}", e),
        })?;
        println!("{}", text);
        return Ok(());
    }

    scenarios::print_recommendation(&rec);
    if let Some(rows) = rows {
        print_breakdown(&rows);
    }
    Ok(())
}

fn print_breakdown(rows: &[DrugBreakdown]) {
    println!("  Breakdown:");
    for row in rows {
        if row.denied {
            println!("    {:<18} excluded: {}", row.drug, row.denied_reasons.join("; "));
            continue;
        }
        println!(
            "    {:<18} fit {:.2} (rank {:.2})  coverage {:.2}",
            row.drug, row.clinical_fit, row.clinical_fit_rank, row.coverage
        );
        for boost in &row.applied_boosts {
            println!("      + {}", boost.condition);
        }
        for caution in &row.applied_cautions {
            println!("      - {}", caution.condition);
        }
    }
    println!();
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("dosewise: Diabetes Medication Decision Engine");
    println!("Reference Demo");
    println!("=============================================");
    println!();
    println!("Pipeline per patient:");
    println!("  [1] Normalize the record into a profile (comorbidities, allergies, insurance)");
    println!("  [2] Lows on current therapy? De-escalation plan replaces ranking");
    println!("  [3] Otherwise score every drug: exclusions, clinical fit, coverage, potency");
    println!("  [4] Options: top two classes plus the lowest-cost viable alternative");
    println!("  [5] Warnings for eGFR-restricted therapy and renal dose maximums");
    println!();
}
