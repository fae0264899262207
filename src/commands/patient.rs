use clap::{Args, Subcommand};

use dietary::models::{DietType, MealType, Patient, PatientUpdate};
use dietary::views::{filter_patients, PatientForm};
use dietary::Dietary;

use super::{confirm, resolve_patient, OutputFormat};

#[derive(Args)]
pub struct PatientCommand {
    #[command(subcommand)]
    pub command: PatientSubcommand,
}

#[derive(Subcommand)]
pub enum PatientSubcommand {
    /// Admit a patient into a room
    Add {
        /// First name
        first_name: String,

        /// Last name
        last_name: String,

        /// Wing
        #[arg(long, short)]
        wing: String,

        /// Room number
        #[arg(long, short)]
        room: String,

        /// Diet type (regular, cardiac, renal, mechanical-soft, puree, clear-liquid, full-liquid)
        #[arg(long, short, default_value = "regular")]
        diet: String,

        /// Patient requires ADA-friendly items
        #[arg(long)]
        ada: bool,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List patients with meal completion
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Include discharged patients
        #[arg(long, short)]
        all: bool,
    },

    /// Search active patients by name, wing or room
    Search {
        /// Search text; empty lists everyone
        #[arg(default_value = "")]
        query: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a patient's details
    Show {
        /// Patient ID, name or room (e.g. east-101)
        patient: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update a patient's record
    Update {
        /// Patient ID, name or room
        patient: String,

        /// New first name
        #[arg(long)]
        first_name: Option<String>,

        /// New last name
        #[arg(long)]
        last_name: Option<String>,

        /// New wing
        #[arg(long, short)]
        wing: Option<String>,

        /// New room number
        #[arg(long, short)]
        room: Option<String>,

        /// New diet type
        #[arg(long, short)]
        diet: Option<DietType>,

        /// Set the ADA flag (true or false)
        #[arg(long)]
        ada: Option<bool>,

        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Discharge a patient, freeing the room
    Discharge {
        /// Patient ID, name or room
        patient: String,
    },

    /// Readmit a discharged patient into the same room
    Readmit {
        /// Patient ID
        patient: String,
    },

    /// Delete a patient and their open orders
    Delete {
        /// Patient ID, name or room
        patient: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

fn print_table(patients: &[Patient]) {
    println!(
        "{:<36}  {:<24}  {:<10}  {:<16}  {:<3}  B L D",
        "ID", "NAME", "ROOM", "DIET", "ADA"
    );
    println!("{}", "-".repeat(104));
    for patient in patients {
        let name = patient.full_name();
        let name = if name.len() > 24 {
            format!("{}...", &name[..21])
        } else {
            name
        };
        let status: Vec<&str> = MealType::ALL
            .iter()
            .map(|m| if patient.meal(*m).complete { "x" } else { "." })
            .collect();
        println!(
            "{:<36}  {:<24}  {:<10}  {:<16}  {:<3}  {}{}",
            patient.id,
            name,
            patient.location.to_string(),
            patient.diet_type.to_string(),
            if patient.ada_friendly { "yes" } else { "" },
            status.join(" "),
            if patient.discharged { "  (discharged)" } else { "" }
        );
    }
    println!("\nTotal: {} patient(s)", patients.len());
}

fn print_patients(
    patients: &[Patient],
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(patients)?),
        OutputFormat::Text if patients.is_empty() => println!("No patients found"),
        OutputFormat::Text => print_table(patients),
    }
    Ok(())
}

impl PatientCommand {
    pub async fn run(&self, dietary: &Dietary) -> Result<(), Box<dyn std::error::Error>> {
        let patients = &dietary.patients;

        match &self.command {
            PatientSubcommand::Add {
                first_name,
                last_name,
                wing,
                room,
                diet,
                ada,
                notes,
            } => {
                let form = PatientForm {
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    wing: wing.clone(),
                    room_number: room.clone(),
                    diet_type: diet.clone(),
                    ada_friendly: *ada,
                    notes: notes.clone().unwrap_or_default(),
                };
                let new_patient = form.validate().map_err(|errors| errors.join("; "))?;

                let created = patients.add_patient(new_patient).await?;
                println!("Admitted patient:");
                println!("{}", created);
                Ok(())
            }

            PatientSubcommand::List { format, all } => {
                let list = if *all {
                    patients.list_all().await?
                } else {
                    patients.list_active().await?
                };
                print_patients(&list, format)
            }

            PatientSubcommand::Search { query, format } => {
                let list = filter_patients(&patients.list_active().await?, query);
                print_patients(&list, format)
            }

            PatientSubcommand::Show { patient, format } => {
                let patient = resolve_patient(patients, patient).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&patient)?),
                    OutputFormat::Text => println!("{}", patient),
                }
                Ok(())
            }

            PatientSubcommand::Update {
                patient,
                first_name,
                last_name,
                wing,
                room,
                diet,
                ada,
                notes,
            } => {
                let update = PatientUpdate {
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    wing: wing.clone(),
                    room_number: room.clone(),
                    diet_type: *diet,
                    ada_friendly: *ada,
                    notes: notes.clone(),
                };
                if update.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let patient = resolve_patient(patients, patient).await?;
                let updated = patients.update_patient(patient.id, update).await?;
                println!("Updated patient:");
                println!("{}", updated);
                Ok(())
            }

            PatientSubcommand::Discharge { patient } => {
                let patient = resolve_patient(patients, patient).await?;
                let discharged = patients.discharge(patient.id).await?;
                println!(
                    "Discharged {} from {}",
                    discharged.full_name(),
                    discharged.location
                );
                Ok(())
            }

            PatientSubcommand::Readmit { patient } => {
                // Discharged patients are not searchable, so an ID is required
                let id = super::parse_uuid(patient, "patient")?;
                let readmitted = patients.readmit(id).await?;
                println!(
                    "Readmitted {} to {}",
                    readmitted.full_name(),
                    readmitted.location
                );
                Ok(())
            }

            PatientSubcommand::Delete { patient, force } => {
                let patient = resolve_patient(patients, patient).await?;

                if !force && !confirm(&format!("Delete patient '{}'?", patient.full_name()))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                patients.delete_patient(patient.id).await?;
                println!("Deleted patient: {}", patient.full_name());
                Ok(())
            }
        }
    }
}
