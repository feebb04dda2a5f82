use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clinic_core::growth::{
    age_in_months, bmi, classify, percentile_of, round_to, z_score_approx, Indicator,
    ReferenceTable,
};
use clinic_core::{
    constants::DEFAULT_DATA_DIR, reference_table_from_env_value, transition_table_from_env_value,
    AppointmentStatus, CoreConfig, PatientService, Sex, TransitionTable,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic records CLI: appointment statuses and growth calculators")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the appointment status table
    Statuses,
    /// List the statuses reachable from a status
    Transitions {
        /// Current status id (0-16)
        status_id: u8,
    },
    /// Age in whole months between two dates
    Age {
        /// Date of birth (YYYY-MM-DD)
        birth_date: String,
        /// Measurement date (YYYY-MM-DD)
        measurement_date: String,
    },
    /// Body mass index from weight and height
    Bmi {
        /// Weight in kg
        weight: f64,
        /// Height in cm
        height: f64,
    },
    /// Percentile, approximate Z-score and classification of a measurement
    Percentile {
        /// weight, height, bmi or head_circumference
        indicator: String,
        /// male or female
        sex: String,
        /// Age in months
        age_months: u32,
        /// Measured value
        value: f64,
    },
    /// List all patients
    Patients,
}

fn parse_date(value: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{value}' (expected YYYY-MM-DD): {e}").into())
}

fn transitions_from_env() -> Result<TransitionTable, Box<dyn std::error::Error>> {
    Ok(transition_table_from_env_value(
        std::env::var("CLINIC_TRANSITIONS_FILE").ok(),
    )?)
}

fn bmi_report(weight: f64, height: f64) -> Result<String, Box<dyn std::error::Error>> {
    match bmi(weight, height) {
        Some(value) => Ok(format!("BMI: {:.2} kg/m²", value)),
        None => Err("weight and height must be positive".into()),
    }
}

fn percentile_report(
    table: &ReferenceTable,
    indicator: Indicator,
    sex: Sex,
    age_months: u32,
    value: f64,
) -> Result<String, Box<dyn std::error::Error>> {
    let Some(row) = table.lookup(indicator, sex, age_months) else {
        return Err(format!(
            "no reference data for {} / {} at {} months",
            indicator, sex, age_months
        )
        .into());
    };

    let percentile = percentile_of(value, row);
    Ok(format!(
        "{} {} {} at {} months (reference row {} months)\n  percentile: P{:.1}\n  z-score (approx.): {:.2}\n  classification: {}",
        indicator,
        value,
        indicator.unit(),
        age_months,
        row.age_months,
        round_to(percentile, 1),
        z_score_approx(value, row),
        classify(indicator, percentile).label()
    ))
}

fn open_config(
    data_dir: PathBuf,
    reference_file: Option<String>,
    transitions_file: Option<String>,
) -> Result<Arc<CoreConfig>, Box<dyn std::error::Error>> {
    Ok(Arc::new(CoreConfig::new(
        data_dir,
        reference_table_from_env_value(reference_file)?,
        transition_table_from_env_value(transitions_file)?,
    )?))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Statuses) => {
            for status in AppointmentStatus::all() {
                println!(
                    "{:>2}  {:<22} {}  {}{}",
                    status.id,
                    status.name,
                    status.color,
                    status.icon,
                    if status.terminal { "  (terminal)" } else { "" }
                );
            }
        }
        Some(Commands::Transitions { status_id }) => {
            let Some(status) = AppointmentStatus::from_id(status_id) else {
                return Err(format!("unknown appointment status: {status_id}").into());
            };
            let table = transitions_from_env()?;
            let allowed = table.allowed(status.id);
            if allowed.is_empty() {
                println!("{} has no outgoing transitions.", status.name);
            } else {
                println!("From {}:", status.name);
                for status in allowed.iter().filter_map(|&id| AppointmentStatus::from_id(id)) {
                    let notes = if status.terminal { "  (notes required)" } else { "" };
                    println!("  {:>2}  {}{}", status.id, status.name, notes);
                }
            }
        }
        Some(Commands::Age {
            birth_date,
            measurement_date,
        }) => {
            let birth = parse_date(&birth_date)?;
            let measured = parse_date(&measurement_date)?;
            println!("{} months", age_in_months(birth, measured));
        }
        Some(Commands::Bmi { weight, height }) => println!("{}", bmi_report(weight, height)?),
        Some(Commands::Percentile {
            indicator,
            sex,
            age_months,
            value,
        }) => {
            let indicator: Indicator = indicator.parse()?;
            let sex: Sex = sex.parse()?;
            let table = reference_table_from_env_value(std::env::var("CLINIC_REFERENCE_FILE").ok())?;
            println!(
                "{}",
                percentile_report(&table, indicator, sex, age_months, value)?
            );
        }
        Some(Commands::Patients) => {
            let data_dir =
                std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
            let cfg = open_config(
                PathBuf::from(data_dir),
                std::env::var("CLINIC_REFERENCE_FILE").ok(),
                std::env::var("CLINIC_TRANSITIONS_FILE").ok(),
            )?;
            let patients = PatientService::new(cfg).list();
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!(
                        "ID: {}, Name: {} {}, Born: {}, Sex: {}",
                        patient.id,
                        patient.given_names,
                        patient.family_name,
                        patient.birth_date,
                        patient.sex
                    );
                }
            }
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn bmi_rejects_non_positive_input() {
        assert_eq!(bmi_report(9.6, 75.7).expect("valid"), "BMI: 16.75 kg/m²");
        assert!(bmi_report(9.6, 0.0).is_err());
        assert!(bmi_report(-1.0, 75.7).is_err());
    }

    #[test]
    fn percentile_without_reference_row_is_an_error() {
        let table = ReferenceTable::bundled().expect("bundled");

        let report = percentile_report(&table, Indicator::Weight, Sex::Male, 12, 9.6)
            .expect("reference row at 12 months");
        assert!(report.contains("P50.0"), "{report}");

        let err = percentile_report(&table, Indicator::Bmi, Sex::Male, 180, 18.4)
            .expect_err("beyond reference ages");
        assert!(err.to_string().contains("no reference data"));
        assert!(percentile_report(&ReferenceTable::default(), Indicator::Bmi, Sex::Female, 6, 16.0)
            .is_err());
    }

    #[test]
    fn config_uses_bundled_reference_table() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = open_config(temp_dir.path().join("data"), None, None).expect("config");
        assert!(!cfg.reference_table().is_empty());
        assert!(cfg.data_dir().is_dir());
    }
}
