//! Per-screen state: what each screen shows and the messages it displays.

mod login;
mod meal_selection;
mod patient_form;
mod patient_list;

pub use login::{Destination, LoginView};
pub use meal_selection::MealSelectionView;
pub use patient_form::PatientForm;
pub use patient_list::{filter_patients, PatientListView};
