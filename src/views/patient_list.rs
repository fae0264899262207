use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::ServiceResult;
use crate::models::{MealType, Patient};
use crate::services::PatientService;

/// Patients matching `query` on name, wing or room. A blank query returns
/// the list unchanged.
pub fn filter_patients(patients: &[Patient], query: &str) -> Vec<Patient> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return patients.to_vec();
    }

    patients
        .iter()
        .filter(|p| {
            let fields = [
                p.first_name.to_lowercase(),
                p.last_name.to_lowercase(),
                p.full_name().to_lowercase(),
                p.location.wing.to_lowercase(),
                p.location.room_number.to_lowercase(),
                p.location.to_string().to_lowercase(),
            ];
            fields.iter().any(|f| f.contains(&query))
        })
        .cloned()
        .collect()
}

/// Live list of active patients plus the search box.
pub struct PatientListView {
    updates: BoxStream<'static, ServiceResult<Vec<Patient>>>,
    patients: Vec<Patient>,
    query: String,
}

impl PatientListView {
    pub fn new(service: &PatientService) -> Self {
        Self {
            updates: service.observe_active(),
            patients: Vec::new(),
            query: String::new(),
        }
    }

    /// Wait for the next emission of the patient list. Returns false once
    /// the source has gone away.
    pub async fn refresh(&mut self) -> ServiceResult<bool> {
        match self.updates.next().await {
            Some(result) => {
                self.patients = result?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn visible(&self) -> Vec<Patient> {
        filter_patients(&self.patients, &self.query)
    }

    /// (completed, total) for one meal across the visible patients.
    pub fn completion(&self, meal: MealType) -> (usize, usize) {
        let visible = self.visible();
        let done = visible.iter().filter(|p| p.meal(meal).complete).count();
        (done, visible.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DietType, Location, MealSelection, NewPatient};
    use crate::test_support::test_app;
    use chrono::Utc;
    use uuid::Uuid;

    fn patient(first: &str, last: &str, wing: &str, room: &str) -> Patient {
        let now = Utc::now();
        Patient {
            id: Uuid::new_v4(),
            first_name: first.into(),
            last_name: last.into(),
            location: Location::new(wing, room),
            diet_type: DietType::Regular,
            ada_friendly: false,
            notes: String::new(),
            discharged: false,
            breakfast: MealSelection::default(),
            lunch: MealSelection::default(),
            dinner: MealSelection::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample() -> Vec<Patient> {
        vec![
            patient("Ada", "Lovelace", "East", "101"),
            patient("Grace", "Hopper", "West", "202"),
            patient("Alan", "Turing", "East", "103"),
        ]
    }

    #[test]
    fn test_empty_query_returns_unfiltered_list() {
        let patients = sample();
        assert_eq!(filter_patients(&patients, ""), patients);
        assert_eq!(filter_patients(&patients, "   "), patients);
    }

    #[test]
    fn test_query_matches_name_and_room() {
        let patients = sample();

        let by_name = filter_patients(&patients, "HOP");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].last_name, "Hopper");

        let by_full_name = filter_patients(&patients, "ada love");
        assert_eq!(by_full_name.len(), 1);

        let by_wing = filter_patients(&patients, "east");
        assert_eq!(by_wing.len(), 2);

        let by_location = filter_patients(&patients, "west-202");
        assert_eq!(by_location.len(), 1);

        assert!(filter_patients(&patients, "nobody").is_empty());
    }

    #[tokio::test]
    async fn test_view_tracks_writes_and_query() {
        let app = test_app().await;
        let service = &app.dietary.patients;
        let mut view = PatientListView::new(service);

        assert!(view.refresh().await.unwrap());
        assert!(view.visible().is_empty());

        let ada = service
            .add_patient(NewPatient::new("Ada", "Lovelace", "East", "101"))
            .await
            .unwrap();
        assert!(view.refresh().await.unwrap());
        service
            .add_patient(NewPatient::new("Grace", "Hopper", "West", "202"))
            .await
            .unwrap();
        assert!(view.refresh().await.unwrap());
        assert_eq!(view.visible().len(), 2);

        service
            .set_meal_complete(ada.id, MealType::Breakfast, true)
            .await
            .unwrap();
        assert!(view.refresh().await.unwrap());
        assert_eq!(view.completion(MealType::Breakfast), (1, 2));

        view.set_query("grace");
        assert_eq!(view.query(), "grace");
        assert_eq!(view.visible().len(), 1);
        assert_eq!(view.completion(MealType::Breakfast), (0, 1));
    }
}
