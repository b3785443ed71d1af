use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use health_records_lib::commands::{self, profile, records};
use health_records_lib::config::AppConfig;
use health_records_lib::core_state::AppState;
use health_records_lib::models::{RecordDraft, Severity, UserProfile};

#[derive(Parser, Debug)]
#[command(name = "health-records", version, about = "Local medical records and PDF export")]
struct Cli {
    /// Directory holding local storage and exports
    #[arg(long, env = "HEALTH_RECORDS_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with a profile JSON file (as stored under `currentUser`)
    Login { profile: PathBuf },
    /// Forget the signed-in user
    Logout,
    /// Show the profile dashboard
    Dashboard {
        /// Also write the QR code SVG to this path
        #[arg(long)]
        qr_out: Option<PathBuf>,
    },
    /// List medical records, newest first
    List,
    /// Add a medical record
    Add(AddArgs),
    /// Export all records to a PDF in the exports directory
    Export,
    /// Verify the backend is wired up
    Health,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    doctor: String,
    #[arg(long)]
    diagnosis: String,
    #[arg(long, default_value = "")]
    specialization: String,
    #[arg(long, default_value = "")]
    treatment: String,
    #[arg(long, default_value = "")]
    medications: String,
    #[arg(long, default_value = "")]
    allergies: String,
    #[arg(long, default_value = "mild", value_parser = parse_severity)]
    severity: Severity,
    /// Follow-up date, YYYY-MM-DD
    #[arg(long)]
    follow_up: Option<chrono::NaiveDate>,
    #[arg(long, default_value = "")]
    notes: String,
}

impl From<AddArgs> for RecordDraft {
    fn from(args: AddArgs) -> Self {
        RecordDraft {
            doctor_name: args.doctor,
            specialization: args.specialization,
            diagnosis: args.diagnosis,
            treatment: args.treatment,
            medications: args.medications,
            allergies: args.allergies,
            severity: args.severity,
            follow_up_date: args.follow_up,
            notes: args.notes,
        }
    }
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse::<Severity>().map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    health_records_lib::init_tracing();
    let cli = Cli::parse();

    let config = cli.data_dir.map(AppConfig::new).unwrap_or_default();
    let state = match AppState::open(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Cannot open local storage: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &state) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, state: &AppState) -> Result<(), String> {
    match command {
        Command::Login { profile: path } => {
            let raw = std::fs::read(&path).map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
            let user: UserProfile =
                serde_json::from_slice(&raw).map_err(|e| format!("Invalid profile: {e}"))?;
            let name = user.name.clone();
            profile::sign_in(user, state)?;
            println!("Signed in as {name}");
        }
        Command::Logout => {
            profile::sign_out(state)?;
            println!("Signed out");
        }
        Command::Dashboard { qr_out } => {
            let view = profile::get_dashboard(state)?;
            println!("{}", view.greeting);
            println!("  Name:      {}", view.name);
            println!("  Role:      {}", view.role);
            println!("  Health ID: {}", view.health_id);
            println!("  Aadhaar:   {}", view.masked_id);
            for detail in &view.details {
                println!("  {}: {}", detail.label, detail.value);
            }
            if let Some(created) = &view.account_created {
                println!("  Account created: {created}");
            }
            if let Some(path) = qr_out {
                std::fs::write(&path, &view.qr_svg)
                    .map_err(|e| format!("Cannot write {}: {e}", path.display()))?;
                println!("QR code written to {}", path.display());
            }
        }
        Command::List => {
            let view = records::get_medical_records(state)?;
            if view.entries.is_empty() {
                println!("No medical records yet.");
                return Ok(());
            }
            println!("{}", view.title);
            for entry in &view.entries {
                println!();
                println!("{} - {}  {}", entry.date, entry.time, entry.doctor);
                println!("  Diagnosis: {}", entry.diagnosis);
                let optional = [
                    ("Specialization", &entry.specialization),
                    ("Treatment", &entry.treatment),
                    ("Medications", &entry.medications),
                    ("Allergies", &entry.allergies),
                ];
                for (label, value) in optional {
                    if let Some(value) = value {
                        println!("  {label}: {value}");
                    }
                }
                println!("  Severity: {}", entry.severity);
                if let Some(follow_up) = &entry.follow_up {
                    println!("  Follow-up: {follow_up}");
                }
                if let Some(notes) = &entry.notes {
                    println!("  Notes: {notes}");
                }
            }
        }
        Command::Add(args) => {
            let record = records::add_medical_record(args.into(), state)?;
            println!("Record {} added", record.id);
        }
        Command::Export => {
            let result = records::export_medical_records(state)?;
            println!(
                "Exported {} records ({} pages) to {}",
                result.records, result.pages, result.path
            );
        }
        Command::Health => println!("{}", commands::health_check()),
    }
    Ok(())
}
