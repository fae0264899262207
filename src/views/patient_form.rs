use crate::models::{DietType, NewPatient, Patient, PatientUpdate};

/// Add/edit patient screen. Fields hold raw text as typed.
#[derive(Debug, Clone, Default)]
pub struct PatientForm {
    pub first_name: String,
    pub last_name: String,
    pub wing: String,
    pub room_number: String,
    pub diet_type: String,
    pub ada_friendly: bool,
    pub notes: String,
}

impl PatientForm {
    /// Pre-filled for editing an existing patient.
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            wing: patient.location.wing.clone(),
            room_number: patient.location.room_number.clone(),
            diet_type: patient.diet_type.to_string(),
            ada_friendly: patient.ada_friendly,
            notes: patient.notes.clone(),
        }
    }

    fn diet(&self) -> Result<DietType, String> {
        if self.diet_type.trim().is_empty() {
            Ok(DietType::default())
        } else {
            self.diet_type.parse()
        }
    }

    /// Every field problem at once, or the patient to save.
    pub fn validate(&self) -> Result<NewPatient, Vec<String>> {
        let diet = self.diet();
        let patient = NewPatient::new(
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.wing.as_str(),
            self.room_number.as_str(),
        )
        .ada(self.ada_friendly)
        .with_notes(self.notes.as_str())
        .with_diet(diet.clone().unwrap_or_default())
        .normalized();

        match (patient, diet) {
            (Ok(patient), Ok(_)) => Ok(patient),
            (Ok(_), Err(diet_error)) => Err(vec![diet_error]),
            (Err(errors), Ok(_)) => Err(errors),
            (Err(mut errors), Err(diet_error)) => {
                errors.push(diet_error);
                Err(errors)
            }
        }
    }

    /// Validated form as a full update of an existing record.
    pub fn to_update(&self) -> Result<PatientUpdate, Vec<String>> {
        let patient = self.validate()?;
        Ok(PatientUpdate {
            first_name: Some(patient.first_name),
            last_name: Some(patient.last_name),
            wing: Some(patient.location.wing),
            room_number: Some(patient.location.room_number),
            diet_type: Some(patient.diet_type),
            ada_friendly: Some(patient.ada_friendly),
            notes: Some(patient.notes),
        })
    }
}
