use std::sync::Arc;

use futures::stream::BoxStream;
use uuid::Uuid;

use crate::db::{ItemRepository, PatientRepository};
use crate::error::{ServiceError, ServiceResult};
use crate::executor::WriteExecutor;
use crate::live::{observe, ChangeNotifier, Table};
use crate::models::{
    DefaultMenu, Location, MealSelection, MealType, NewPatient, Patient, PatientUpdate,
};

use super::selection::{ada_only, groups};

#[derive(Clone)]
pub struct PatientService {
    repo: PatientRepository,
    items: ItemRepository,
    executor: Arc<WriteExecutor>,
    notifier: ChangeNotifier,
}

async fn ensure_room_free(
    repo: &PatientRepository,
    location: &Location,
    exclude: Option<Uuid>,
) -> ServiceResult<()> {
    if repo.find_active_in_room(location, exclude).await?.is_some() {
        tracing::warn!(room = %location, "room already occupied");
        return Err(ServiceError::RoomOccupied(location.to_string()));
    }
    Ok(())
}

/// The unique index catches a concurrent admission the query missed.
fn room_conflict(e: sqlx::Error, location: &Location) -> ServiceError {
    let e = ServiceError::from(e);
    if e.is_unique_violation() {
        ServiceError::RoomOccupied(location.to_string())
    } else {
        e
    }
}

async fn existing(repo: &PatientRepository, id: Uuid) -> ServiceResult<Patient> {
    repo.get_by_id(id).await?.ok_or(ServiceError::PatientNotFound)
}

/// Check every name against the catalog and the patient's ADA flag.
async fn validate_selection(
    items: &ItemRepository,
    patient: &Patient,
    selection: &MealSelection,
) -> ServiceResult<()> {
    for (group, names) in groups(selection) {
        for name in names {
            let matches = items.find_by_name(name).await?;
            if matches.is_empty() {
                return Err(ServiceError::ItemNotFound(name.clone()));
            }

            let candidates: Vec<_> = matches
                .into_iter()
                .filter(|i| group.accepts(i.category))
                .collect();
            if candidates.is_empty() {
                return Err(ServiceError::WrongCategory {
                    name: name.clone(),
                    expected: group.label().to_string(),
                });
            }

            if patient.ada_friendly && !candidates.iter().any(|i| i.ada_friendly) {
                return Err(ServiceError::NotAdaFriendly(name.clone()));
            }
        }
    }

    Ok(())
}

fn clean(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

impl PatientService {
    pub fn new(
        repo: PatientRepository,
        items: ItemRepository,
        executor: Arc<WriteExecutor>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            repo,
            items,
            executor,
            notifier,
        }
    }

    /// Admit a patient. Fails if the room already holds an active patient.
    pub async fn add_patient(&self, patient: NewPatient) -> ServiceResult<Patient> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let patient = patient.normalized().map_err(ServiceError::Invalid)?;
                ensure_room_free(&repo, &patient.location, None).await?;

                let created = repo
                    .create(&patient)
                    .await
                    .map_err(|e| room_conflict(e, &patient.location))?;

                notifier.notify(Table::Patients);
                tracing::info!(patient = %created.id, room = %created.location, "patient admitted");
                Ok(created)
            })
            .wait()
            .await
    }

    /// Apply an edit. A patient who becomes ADA-restricted loses every
    /// selected name that is not ADA-friendly.
    pub async fn update_patient(&self, id: Uuid, update: PatientUpdate) -> ServiceResult<Patient> {
        let repo = self.repo.clone();
        let catalog = self.items.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let current = existing(&repo, id).await?;
                let merged = update.apply_to(&current).map_err(ServiceError::Invalid)?;

                if current.is_active() && !merged.location.same_room(&current.location) {
                    ensure_room_free(&repo, &merged.location, Some(id)).await?;
                }

                repo.update(id, &merged)
                    .await
                    .map_err(|e| room_conflict(e, &merged.location))?;

                if merged.ada_friendly && !current.ada_friendly {
                    for meal in MealType::ALL {
                        let selection = current.meal(meal);
                        let kept = ada_only(&catalog, selection).await?;
                        if kept != *selection {
                            repo.set_meal_selection(id, meal, &kept).await?;
                            tracing::info!(patient = %id, meal = %meal, "non-ADA items removed");
                        }
                    }
                }

                notifier.notify(Table::Patients);
                tracing::info!(patient = %id, "patient updated");
                existing(&repo, id).await
            })
            .wait()
            .await
    }

    /// Mark the patient discharged, which frees the room.
    pub async fn discharge(&self, id: Uuid) -> ServiceResult<Patient> {
        self.set_discharged(id, false).await
    }

    /// Bring a discharged patient back into their room if it is still free.
    pub async fn readmit(&self, id: Uuid) -> ServiceResult<Patient> {
        self.set_discharged(id, true).await
    }

    async fn set_discharged(&self, id: Uuid, readmit: bool) -> ServiceResult<Patient> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let patient = existing(&repo, id).await?;
                if readmit {
                    if patient.is_active() {
                        return Ok(patient);
                    }
                    ensure_room_free(&repo, &patient.location, Some(id)).await?;
                }

                repo.set_discharged(id, !readmit)
                    .await
                    .map_err(|e| room_conflict(e, &patient.location))?;

                notifier.notify(Table::Patients);
                tracing::info!(
                    patient = %id,
                    "patient {}",
                    if readmit { "readmitted" } else { "discharged" }
                );
                existing(&repo, id).await
            })
            .wait()
            .await
    }

    pub async fn delete_patient(&self, id: Uuid) -> ServiceResult<()> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                if !repo.delete(id).await? {
                    return Err(ServiceError::PatientNotFound);
                }
                // Open orders go with the patient
                notifier.notify(Table::Patients);
                notifier.notify(Table::Orders);
                tracing::info!(patient = %id, "patient deleted");
                Ok(())
            })
            .wait()
            .await
    }

    pub async fn get_patient(&self, id: Uuid) -> ServiceResult<Patient> {
        existing(&self.repo, id).await
    }

    pub async fn list_active(&self) -> ServiceResult<Vec<Patient>> {
        Ok(self.repo.list_active().await?)
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<Patient>> {
        Ok(self.repo.list_all().await?)
    }

    /// The active patient list, re-emitted after every patient write.
    pub fn observe_active(&self) -> BoxStream<'static, ServiceResult<Vec<Patient>>> {
        let repo = self.repo.clone();
        observe(&self.notifier, Table::Patients, move || {
            let repo = repo.clone();
            async move { Ok(repo.list_active().await?) }
        })
    }

    /// Replace a meal's items, juices and drinks. Completion is unchanged.
    pub async fn set_meal_selection(
        &self,
        id: Uuid,
        meal: MealType,
        items: Vec<String>,
        juices: Vec<String>,
        drinks: Vec<String>,
    ) -> ServiceResult<Patient> {
        let repo = self.repo.clone();
        let catalog = self.items.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let patient = existing(&repo, id).await?;
                let selection = MealSelection::new(clean(items), clean(juices), clean(drinks));
                validate_selection(&catalog, &patient, &selection).await?;

                repo.set_meal_selection(id, meal, &selection).await?;
                notifier.notify(Table::Patients);
                tracing::info!(patient = %id, meal = %meal, "meal selection saved");
                existing(&repo, id).await
            })
            .wait()
            .await
    }

    /// Set one meal's completion flag; the other meals are untouched.
    pub async fn set_meal_complete(
        &self,
        id: Uuid,
        meal: MealType,
        complete: bool,
    ) -> ServiceResult<Patient> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                if !repo.set_meal_complete(id, meal, complete).await? {
                    return Err(ServiceError::PatientNotFound);
                }
                notifier.notify(Table::Patients);
                tracing::info!(patient = %id, meal = %meal, complete, "meal status changed");
                existing(&repo, id).await
            })
            .wait()
            .await
    }

    pub async fn toggle_meal_complete(&self, id: Uuid, meal: MealType) -> ServiceResult<bool> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let complete = repo
                    .toggle_meal_complete(id, meal)
                    .await?
                    .ok_or(ServiceError::PatientNotFound)?;
                notifier.notify(Table::Patients);
                tracing::info!(patient = %id, meal = %meal, complete, "meal status toggled");
                Ok(complete)
            })
            .wait()
            .await
    }

    /// Start a new service day: every active patient's meals go back to
    /// pending.
    pub async fn reset_completion(&self) -> ServiceResult<u64> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let changed = repo.reset_completion().await?;
                notifier.notify(Table::Patients);
                tracing::info!(changed, "meal completion reset");
                Ok(changed)
            })
            .wait()
            .await
    }

    /// Fill an empty meal from the default menu.
    pub async fn apply_default_menu(&self, id: Uuid, meal: MealType) -> ServiceResult<Patient> {
        let repo = self.repo.clone();
        let notifier = self.notifier.clone();

        self.executor
            .submit(async move {
                let patient = existing(&repo, id).await?;
                if !patient.meal(meal).is_empty() {
                    return Err(ServiceError::SelectionNotEmpty(meal.title().to_string()));
                }

                let defaults = DefaultMenu::selection(meal, patient.ada_friendly);
                repo.set_meal_selection(id, meal, &defaults).await?;
                notifier.notify(Table::Patients);
                tracing::info!(patient = %id, meal = %meal, "default menu applied");
                existing(&repo, id).await
            })
            .wait()
            .await
    }
}
