//! MedAIron administrative command line.
//!
//! Operates directly on the file store at `HOSPITAL_DATA_DIR` (or `--data-dir`) as the local
//! operator, which has administrator rights. Recording vitals is the exception: a reading
//! must be attributed to a registered staff member, given with `--recorder`. Notifications
//! raised by CLI writes go to an in-process registry with no sessions, so they are dropped.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use medairon_core::constants::{DEFAULT_DATA_DIR, DEFAULT_SUBSCRIBER_BUFFER};
use medairon_core::patients::{Gender, NewPatient, StaffAssignment};
use medairon_core::staff::NewStaffMember;
use medairon_core::{
    AlertFilter, Caller, CoreConfig, CoreError, Hospital, TopicRegistry, VitalMeasurements,
    VitalReadingPayload,
};
use medairon_types::Role;
use medairon_uuid::RecordId;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "medairon")]
#[command(about = "MedAIron hospital backend CLI")]
struct Cli {
    /// Data directory (defaults to $HOSPITAL_DATA_DIR, then "hospital_data")
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Staff directory
    #[command(subcommand)]
    Staff(StaffCommand),
    /// Patients and care teams
    #[command(subcommand)]
    Patients(PatientsCommand),
    /// Vital-sign readings
    #[command(subcommand)]
    Vitals(VitalsCommand),
    /// Alert lifecycle
    #[command(subcommand)]
    Alerts(AlertsCommand),
}

#[derive(Subcommand)]
enum StaffCommand {
    /// Register a staff member
    Register {
        full_name: String,
        /// admin, doctor or nurse
        role: Role,
        /// Required for doctors and nurses
        #[arg(long)]
        license: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },
}

#[derive(Subcommand)]
enum PatientsCommand {
    /// Register a patient
    Register {
        full_name: String,
        /// Date of birth (YYYY-MM-DD)
        date_of_birth: NaiveDate,
        /// male, female or other
        gender: String,
    },
    /// Assign a doctor and/or nurse to a patient
    Assign {
        patient_id: RecordId,
        #[arg(long)]
        doctor: Option<RecordId>,
        #[arg(long)]
        nurse: Option<RecordId>,
    },
}

#[derive(Subcommand)]
enum VitalsCommand {
    /// Record a reading and print any alerts it raised
    Record {
        patient_id: RecordId,
        /// Id of the registered staff member taking the reading
        #[arg(long)]
        recorder: RecordId,
        #[arg(long)]
        heart_rate: Option<f64>,
        #[arg(long)]
        systolic: Option<f64>,
        #[arg(long)]
        diastolic: Option<f64>,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        oxygen_saturation: Option<f64>,
        #[arg(long)]
        respiratory_rate: Option<f64>,
        #[arg(long)]
        glucose: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List a patient's readings, most recent first
    List { patient_id: RecordId },
}

#[derive(Subcommand)]
enum AlertsCommand {
    /// List alerts, newest first
    List {
        #[arg(long)]
        include_dismissed: bool,
        #[arg(long)]
        patient: Option<RecordId>,
    },
    /// Mark an alert acknowledged
    Acknowledge { alert_id: RecordId },
    /// Dismiss an alert (it is kept, but hidden from the active list)
    Dismiss { alert_id: RecordId },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .or_else(|| std::env::var("HOSPITAL_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let cfg = CoreConfig::new(data_dir, DEFAULT_SUBSCRIBER_BUFFER)?;
    let hospital = Hospital::open(&cfg, Arc::new(TopicRegistry::new(cfg.subscriber_buffer())))?;
    let operator = Caller::operator();

    if let Err(e) = run(&hospital, &operator, cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(hospital: &Hospital, operator: &Caller, command: Commands) -> Result<(), CoreError> {
    match command {
        Commands::Staff(StaffCommand::Register {
            full_name,
            role,
            license,
            department,
        }) => {
            let member = hospital.staff.register(
                operator,
                NewStaffMember {
                    full_name,
                    role,
                    license_number: license,
                    department,
                },
            )?;
            println!("Registered {} {} ({})", member.role, member.full_name, member.id);
        }
        Commands::Patients(PatientsCommand::Register {
            full_name,
            date_of_birth,
            gender,
        }) => {
            let patient = hospital.patients.register(
                operator,
                NewPatient {
                    full_name,
                    date_of_birth,
                    gender: gender.parse::<Gender>()?,
                },
            )?;
            println!("Registered patient {} ({})", patient.full_name, patient.id);
        }
        Commands::Patients(PatientsCommand::Assign {
            patient_id,
            doctor,
            nurse,
        }) => {
            let patient = hospital.patients.assign_staff(
                operator,
                &patient_id,
                StaffAssignment { doctor, nurse },
            )?;
            println!(
                "Patient {}: doctor {}, nurse {}",
                patient.id,
                display_opt(patient.assigned_doctor),
                display_opt(patient.assigned_nurse)
            );
        }
        Commands::Vitals(VitalsCommand::Record {
            patient_id,
            recorder,
            heart_rate,
            systolic,
            diastolic,
            temperature,
            oxygen_saturation,
            respiratory_rate,
            glucose,
            notes,
        }) => {
            let payload = VitalReadingPayload {
                measurements: VitalMeasurements {
                    heart_rate,
                    blood_pressure_systolic: systolic,
                    blood_pressure_diastolic: diastolic,
                    temperature,
                    oxygen_saturation,
                    respiratory_rate,
                    glucose_level: glucose,
                },
                notes,
            };
            let recorder = hospital.staff.get(&recorder)?;
            let caller = Caller::new(recorder.id, recorder.role);
            let outcome = hospital.ingestion.record(&caller, &patient_id, payload)?;
            println!("Recorded reading {}", outcome.reading.id);
            for alert in outcome.alerts() {
                println!("  [{}] {}: {}", alert.severity, alert.title, alert.message);
            }
            for failed in outcome.failures() {
                eprintln!("  alert not saved ({}): {}", failed.draft.title, failed.error);
            }
        }
        Commands::Vitals(VitalsCommand::List { patient_id }) => {
            let readings = hospital.vitals.list(operator, &patient_id)?;
            if readings.is_empty() {
                println!("No readings found.");
            }
            for r in readings {
                let m = &r.measurements;
                println!(
                    "{} HR {} BP {}/{} T {} SpO2 {} RR {} Glu {}",
                    r.recorded_at.format("%Y-%m-%d %H:%M"),
                    display_opt(m.heart_rate),
                    display_opt(m.blood_pressure_systolic),
                    display_opt(m.blood_pressure_diastolic),
                    display_opt(m.temperature),
                    display_opt(m.oxygen_saturation),
                    display_opt(m.respiratory_rate),
                    display_opt(m.glucose_level),
                );
            }
        }
        Commands::Alerts(AlertsCommand::List {
            include_dismissed,
            patient,
        }) => {
            let mut filter = if include_dismissed {
                AlertFilter::all()
            } else {
                AlertFilter::active()
            };
            if let Some(patient) = patient {
                filter = filter.for_patient(patient);
            }
            let alerts = hospital.alerts.list(operator, filter)?;
            if alerts.is_empty() {
                println!("No alerts found.");
            }
            for a in alerts {
                println!(
                    "{} {} [{}] {} (patient {}){}{}",
                    a.id,
                    a.created_at.format("%Y-%m-%d %H:%M"),
                    a.severity,
                    a.title,
                    a.patient_id,
                    if a.acknowledged { " ack" } else { "" },
                    if a.dismissed { " dismissed" } else { "" },
                );
            }
        }
        Commands::Alerts(AlertsCommand::Acknowledge { alert_id }) => {
            let alert = hospital.alerts.acknowledge(operator, &alert_id)?;
            println!("Acknowledged {} ({})", alert.id, alert.title);
        }
        Commands::Alerts(AlertsCommand::Dismiss { alert_id }) => {
            let alert = hospital.alerts.dismiss(operator, &alert_id)?;
            println!("Dismissed {} ({})", alert.id, alert.title);
        }
    }
    Ok(())
}

fn display_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
