//! Validate-then-persist flows over the repositories. Writes go through the
//! shared [`WriteExecutor`](crate::executor::WriteExecutor); reads run inline.

mod items;
mod orders;
mod patients;
mod selection;
mod users;

pub use items::ItemService;
pub use orders::OrderService;
pub use patients::PatientService;
pub use users::{LoginOutcome, UserService};
