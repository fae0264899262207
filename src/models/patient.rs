use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::diet_type::DietType;
use super::meal_type::MealType;

/// Wing and room: the key used for active patient assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub wing: String,
    pub room_number: String,
}

impl Location {
    pub fn new(wing: impl Into<String>, room_number: impl Into<String>) -> Self {
        Self {
            wing: wing.into().trim().to_string(),
            room_number: room_number.into().trim().to_string(),
        }
    }

    /// Case-insensitive comparison, matching the unique index on patients.
    pub fn same_room(&self, other: &Location) -> bool {
        self.wing.eq_ignore_ascii_case(&other.wing)
            && self.room_number.eq_ignore_ascii_case(&other.room_number)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.wing, self.room_number)
    }
}

/// What a patient gets for one meal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealSelection {
    pub items: Vec<String>,
    pub juices: Vec<String>,
    pub drinks: Vec<String>,
    pub complete: bool,
}

impl MealSelection {
    pub fn new(items: Vec<String>, juices: Vec<String>, drinks: Vec<String>) -> Self {
        Self {
            items,
            juices,
            drinks,
            complete: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.juices.is_empty() && self.drinks.is_empty()
    }

    /// All selected names in display order: items, then juices, then drinks.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .chain(self.juices.iter())
            .chain(self.drinks.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub location: Location,
    pub diet_type: DietType,
    pub ada_friendly: bool,
    pub notes: String,
    pub discharged: bool,
    pub breakfast: MealSelection,
    pub lunch: MealSelection,
    pub dinner: MealSelection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn meal(&self, meal: MealType) -> &MealSelection {
        match meal {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
        }
    }

    pub fn meal_mut(&mut self, meal: MealType) -> &mut MealSelection {
        match meal {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.discharged
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.full_name();
        writeln!(f, "{}", name)?;
        writeln!(f, "{}", "=".repeat(name.len()))?;
        writeln!(f, "Room: {}", self.location)?;
        write!(f, "Diet: {}", self.diet_type)?;
        if self.ada_friendly {
            write!(f, " (ADA)")?;
        }
        writeln!(f)?;
        if self.discharged {
            writeln!(f, "Status: discharged")?;
        }
        if !self.notes.is_empty() {
            writeln!(f, "Notes: {}", self.notes)?;
        }

        for meal in MealType::ALL {
            let selection = self.meal(meal);
            let status = if selection.complete { "complete" } else { "pending" };
            writeln!(f, "\n{} [{}]:", meal.title(), status)?;
            if selection.is_empty() {
                writeln!(f, "  (nothing selected)")?;
                continue;
            }
            for item in &selection.items {
                writeln!(f, "  - {}", item)?;
            }
            for juice in &selection.juices {
                writeln!(f, "  - {} (juice)", juice)?;
            }
            for drink in &selection.drinks {
                writeln!(f, "  - {} (drink)", drink)?;
            }
        }

        Ok(())
    }
}

/// Input for admitting a patient.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub location: Location,
    pub diet_type: DietType,
    pub ada_friendly: bool,
    pub notes: String,
}

impl NewPatient {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        wing: impl Into<String>,
        room_number: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            location: Location::new(wing, room_number),
            diet_type: DietType::default(),
            ada_friendly: false,
            notes: String::new(),
        }
    }

    pub fn with_diet(mut self, diet_type: DietType) -> Self {
        self.diet_type = diet_type;
        self
    }

    pub fn ada(mut self, ada_friendly: bool) -> Self {
        self.ada_friendly = ada_friendly;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Trim text fields and check required ones, returning every problem.
    pub fn normalized(mut self) -> Result<Self, Vec<String>> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.location = Location::new(self.location.wing, self.location.room_number);
        self.notes = self.notes.trim().to_string();

        let mut errors = Vec::new();
        if self.first_name.is_empty() {
            errors.push("First name is required".to_string());
        }
        if self.last_name.is_empty() {
            errors.push("Last name is required".to_string());
        }
        if self.location.wing.is_empty() {
            errors.push("Wing is required".to_string());
        }
        if self.location.room_number.is_empty() {
            errors.push("Room number is required".to_string());
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }
}

/// Partial edit of a patient record; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub wing: Option<String>,
    pub room_number: Option<String>,
    pub diet_type: Option<DietType>,
    pub ada_friendly: Option<bool>,
    pub notes: Option<String>,
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.wing.is_none()
            && self.room_number.is_none()
            && self.diet_type.is_none()
            && self.ada_friendly.is_none()
            && self.notes.is_none()
    }

    /// Merge onto an existing patient, producing the validated replacement.
    pub fn apply_to(&self, patient: &Patient) -> Result<NewPatient, Vec<String>> {
        let location = Location::new(
            self.wing.clone().unwrap_or_else(|| patient.location.wing.clone()),
            self.room_number
                .clone()
                .unwrap_or_else(|| patient.location.room_number.clone()),
        );
        NewPatient {
            first_name: self
                .first_name
                .clone()
                .unwrap_or_else(|| patient.first_name.clone()),
            last_name: self
                .last_name
                .clone()
                .unwrap_or_else(|| patient.last_name.clone()),
            location,
            diet_type: self.diet_type.unwrap_or(patient.diet_type),
            ada_friendly: self.ada_friendly.unwrap_or(patient.ada_friendly),
            notes: self.notes.clone().unwrap_or_else(|| patient.notes.clone()),
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_patient() -> Patient {
        let now = Utc::now();
        Patient {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            location: Location::new("East", "101"),
            diet_type: DietType::Cardiac,
            ada_friendly: true,
            notes: String::new(),
            discharged: false,
            breakfast: MealSelection::default(),
            lunch: MealSelection::default(),
            dinner: MealSelection::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_location_same_room_ignores_case_and_whitespace() {
        let a = Location::new(" East ", "101a");
        let b = Location::new("east", "101A");
        assert!(a.same_room(&b));
        assert_eq!(a.to_string(), "East-101a");
        assert!(!a.same_room(&Location::new("West", "101A")));
    }

    #[test]
    fn test_new_patient_normalized_reports_all_missing_fields() {
        let errors = NewPatient::new("  ", "", "", " ").normalized().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "First name is required",
                "Last name is required",
                "Wing is required",
                "Room number is required",
            ]
        );
    }

    #[test]
    fn test_new_patient_normalized_trims() {
        let patient = NewPatient::new(" Grace ", "Hopper ", " North", "12 ")
            .normalized()
            .unwrap();
        assert_eq!(patient.first_name, "Grace");
        assert_eq!(patient.last_name, "Hopper");
        assert_eq!(patient.location, Location::new("North", "12"));
    }

    #[test]
    fn test_update_keeps_unset_fields() {
        let patient = sample_patient();
        let update = PatientUpdate {
            room_number: Some("102".into()),
            ..Default::default()
        };

        let merged = update.apply_to(&patient).unwrap();
        assert_eq!(merged.first_name, "Ada");
        assert_eq!(merged.location, Location::new("East", "102"));
        assert_eq!(merged.diet_type, DietType::Cardiac);
        assert!(merged.ada_friendly);
    }

    #[test]
    fn test_meal_mut_touches_only_that_meal() {
        let mut patient = sample_patient();
        patient.meal_mut(MealType::Lunch).complete = true;
        assert!(!patient.breakfast.complete);
        assert!(patient.lunch.complete);
        assert!(!patient.dinner.complete);
    }

    #[test]
    fn test_selection_all_names_order() {
        let selection = MealSelection::new(
            vec!["Eggs".into()],
            vec!["Apple Juice".into()],
            vec!["Coffee".into()],
        );
        let names: Vec<&str> = selection.all_names().collect();
        assert_eq!(names, vec!["Eggs", "Apple Juice", "Coffee"]);
        assert!(!selection.is_empty());
        assert!(MealSelection::default().is_empty());
    }
}
