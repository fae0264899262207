use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use std::io::{self, IsTerminal, Write};
use uuid::Uuid;

use dietary::models::{Location, Patient};
use dietary::services::PatientService;
use dietary::views::filter_patients;

mod auth;
mod config_cmd;
mod item;
mod meal;
mod order;
mod patient;

pub use auth::{logout, LoginCommand};
pub use config_cmd::ConfigCommand;
pub use item::ItemCommand;
pub use meal::MealCommand;
pub use order::OrderCommand;
pub use patient::PatientCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// YYYY-MM-DD, defaulting to today.
fn parse_date(date: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format: {}. Use YYYY-MM-DD", d).into()),
        None => Ok(Local::now().date_naive()),
    }
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    Uuid::parse_str(value.trim()).map_err(|_| format!("Invalid {} ID: {}", what, value).into())
}

/// "wing-room" split on the last dash.
fn parse_room(identifier: &str) -> Option<Location> {
    let (wing, room) = identifier.trim().rsplit_once('-')?;
    let location = Location::new(wing, room);
    if location.wing.is_empty() || location.room_number.is_empty() {
        return None;
    }
    Some(location)
}

/// Find a patient by ID, by exact room, or by a search over active patients
/// that must match exactly one of them.
async fn resolve_patient(
    patients: &PatientService,
    identifier: &str,
) -> Result<Patient, Box<dyn std::error::Error>> {
    if let Ok(id) = Uuid::parse_str(identifier.trim()) {
        return Ok(patients.get_patient(id).await?);
    }

    let active = patients.list_active().await?;
    if let Some(location) = parse_room(identifier) {
        if let Some(patient) = active.iter().find(|p| p.location.same_room(&location)) {
            return Ok(patient.clone());
        }
    }

    let mut matches = filter_patients(&active, identifier);
    match matches.len() {
        0 => Err(format!("No active patient matches '{}'", identifier).into()),
        1 => Ok(matches.remove(0)),
        n => Err(format!(
            "'{}' matches {} patients; use the patient ID or room instead",
            identifier, n
        )
        .into()),
    }
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

/// Read a secret without echo when attached to a terminal; piped input is
/// read as a plain line.
fn prompt_secret(label: &str) -> io::Result<String> {
    if io::stdin().is_terminal() {
        rpassword::prompt_password(label)
    } else {
        prompt(label)
    }
}

fn confirm(question: &str) -> io::Result<bool> {
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Split comma-separated values and flatten repeated flags.
fn split_names(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}
