mod default_menu;
mod diet_type;
mod item;
mod meal_type;
mod order;
mod patient;
mod user;

pub use default_menu::DefaultMenu;
pub use diet_type::DietType;
pub use item::{Item, ItemCategory, ItemFilter};
pub use meal_type::MealType;
pub use order::{FinalizedOrder, MealOrder, OrderItem};
pub use patient::{Location, MealSelection, NewPatient, Patient, PatientUpdate};
pub use user::{Role, User};
