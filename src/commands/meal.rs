use clap::{Args, Subcommand};
use serde::Serialize;

use dietary::models::{MealSelection, MealType, Patient};
use dietary::views::MealSelectionView;
use dietary::Dietary;

use super::{resolve_patient, split_names, OutputFormat};

#[derive(Args)]
pub struct MealCommand {
    #[command(subcommand)]
    pub command: MealSubcommand,
}

#[derive(Subcommand)]
pub enum MealSubcommand {
    /// Replace a meal's selection
    Set {
        /// Patient ID, name or room
        patient: String,

        /// Meal (breakfast, lunch, dinner)
        meal: MealType,

        /// Food item (repeatable or comma-separated)
        #[arg(long = "item", value_name = "ITEM")]
        items: Vec<String>,

        /// Juice (repeatable or comma-separated)
        #[arg(long = "juice", value_name = "JUICE")]
        juices: Vec<String>,

        /// Drink (repeatable or comma-separated)
        #[arg(long = "drink", value_name = "DRINK")]
        drinks: Vec<String>,
    },

    /// Select or deselect catalog entries for a meal
    Pick {
        /// Patient ID, name or room
        patient: String,

        /// Meal (breakfast, lunch, dinner)
        meal: MealType,

        /// Catalog entries to toggle
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show a patient's meals, or one meal with the choices available
    Show {
        /// Patient ID, name or room
        patient: String,

        /// Only this meal, with the catalog it can choose from
        meal: Option<MealType>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Mark a meal as delivered
    Complete {
        /// Patient ID, name or room
        patient: String,

        /// Meal (breakfast, lunch, dinner)
        meal: MealType,
    },

    /// Mark a meal as not delivered
    Incomplete {
        /// Patient ID, name or room
        patient: String,

        /// Meal (breakfast, lunch, dinner)
        meal: MealType,
    },

    /// Flip a meal's delivered flag
    Toggle {
        /// Patient ID, name or room
        patient: String,

        /// Meal (breakfast, lunch, dinner)
        meal: MealType,
    },

    /// Fill an empty meal from the default menu
    Defaults {
        /// Patient ID, name or room
        patient: String,

        /// Meal; all empty meals when omitted
        meal: Option<MealType>,
    },

    /// Clear every meal's delivered flag for a new day
    Reset,
}

#[derive(Serialize)]
struct MealChoices<'a> {
    patient: &'a str,
    meal: MealType,
    selection: &'a MealSelection,
    available: Vec<(String, Vec<&'a str>)>,
}

fn print_selection(meal: MealType, selection: &MealSelection) {
    println!(
        "{} [{}]",
        meal.title(),
        if selection.complete { "complete" } else { "pending" }
    );
    if selection.is_empty() {
        println!("  (nothing selected)");
        return;
    }
    for (label, names) in [
        ("Items", &selection.items),
        ("Juices", &selection.juices),
        ("Drinks", &selection.drinks),
    ] {
        if !names.is_empty() {
            println!("  {}: {}", label, names.join(", "));
        }
    }
}

fn print_patient_meals(patient: &Patient) {
    println!("{} ({})", patient.full_name(), patient.location);
    for meal in MealType::ALL {
        print_selection(meal, patient.meal(meal));
    }
}

fn print_choices(view: &MealSelectionView) {
    println!(
        "{} ({})",
        view.patient().full_name(),
        view.patient().location
    );
    print_selection(view.meal(), view.selection());

    println!("\nAvailable:");
    if view.catalog().is_empty() {
        println!("  (no catalog items for this meal)");
    }
    for (category, items) in view.catalog() {
        let names: Vec<String> = items
            .iter()
            .map(|i| {
                if view.is_selected(&i.name) {
                    format!("*{}", i.name)
                } else {
                    i.name.clone()
                }
            })
            .collect();
        println!("  {:<10} {}", category.to_string(), names.join(", "));
    }
}

impl MealCommand {
    pub async fn run(&self, dietary: &Dietary) -> Result<(), Box<dyn std::error::Error>> {
        let patients = &dietary.patients;

        match &self.command {
            MealSubcommand::Set {
                patient,
                meal,
                items,
                juices,
                drinks,
            } => {
                let patient = resolve_patient(patients, patient).await?;
                let updated = patients
                    .set_meal_selection(
                        patient.id,
                        *meal,
                        split_names(items),
                        split_names(juices),
                        split_names(drinks),
                    )
                    .await?;
                println!("Saved {} for {}:", meal, updated.full_name());
                print_selection(*meal, updated.meal(*meal));
                Ok(())
            }

            MealSubcommand::Pick {
                patient,
                meal,
                names,
            } => {
                let patient = resolve_patient(patients, patient).await?;
                let mut view =
                    MealSelectionView::load(patients, &dietary.items, patient.id, *meal).await?;
                for name in split_names(names) {
                    let selected = view.toggle(&name)?;
                    println!("{} {}", if selected { "+" } else { "-" }, name);
                }
                view.save(patients).await?;
                print_selection(*meal, view.selection());
                Ok(())
            }

            MealSubcommand::Show {
                patient,
                meal,
                format,
            } => {
                let patient = resolve_patient(patients, patient).await?;
                match meal {
                    None => match format {
                        OutputFormat::Json => {
                            let meals: Vec<_> = MealType::ALL
                                .iter()
                                .map(|m| (m.as_str(), patient.meal(*m)))
                                .collect();
                            println!("{}", serde_json::to_string_pretty(&meals)?);
                        }
                        OutputFormat::Text => print_patient_meals(&patient),
                    },
                    Some(meal) => {
                        let view =
                            MealSelectionView::load(patients, &dietary.items, patient.id, *meal)
                                .await?;
                        match format {
                            OutputFormat::Json => {
                                let name = view.patient().full_name();
                                let choices = MealChoices {
                                    patient: &name,
                                    meal: view.meal(),
                                    selection: view.selection(),
                                    available: view
                                        .catalog()
                                        .iter()
                                        .map(|(c, items)| {
                                            (
                                                c.to_string(),
                                                items.iter().map(|i| i.name.as_str()).collect(),
                                            )
                                        })
                                        .collect(),
                                };
                                println!("{}", serde_json::to_string_pretty(&choices)?);
                            }
                            OutputFormat::Text => print_choices(&view),
                        }
                    }
                }
                Ok(())
            }

            MealSubcommand::Complete { patient, meal } => {
                let patient = resolve_patient(patients, patient).await?;
                patients.set_meal_complete(patient.id, *meal, true).await?;
                println!("{} complete for {}", meal.title(), patient.full_name());
                Ok(())
            }

            MealSubcommand::Incomplete { patient, meal } => {
                let patient = resolve_patient(patients, patient).await?;
                patients.set_meal_complete(patient.id, *meal, false).await?;
                println!("{} pending for {}", meal.title(), patient.full_name());
                Ok(())
            }

            MealSubcommand::Toggle { patient, meal } => {
                let patient = resolve_patient(patients, patient).await?;
                let complete = patients.toggle_meal_complete(patient.id, *meal).await?;
                println!(
                    "{} {} for {}",
                    meal.title(),
                    if complete { "complete" } else { "pending" },
                    patient.full_name()
                );
                Ok(())
            }

            MealSubcommand::Defaults { patient, meal } => {
                let patient = resolve_patient(patients, patient).await?;
                let meals: Vec<MealType> = match meal {
                    Some(m) => vec![*m],
                    None => MealType::ALL
                        .into_iter()
                        .filter(|m| patient.meal(*m).is_empty())
                        .collect(),
                };
                if meals.is_empty() {
                    println!("Every meal already has a selection");
                    return Ok(());
                }

                for meal in meals {
                    let updated = patients.apply_default_menu(patient.id, meal).await?;
                    print_selection(meal, updated.meal(meal));
                }
                Ok(())
            }

            MealSubcommand::Reset => {
                let changed = patients.reset_completion().await?;
                println!("Reset {} meal(s) to pending", changed);
                Ok(())
            }
        }
    }
}
