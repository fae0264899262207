use clap::{Args, Subcommand};
use std::collections::HashMap;

use dietary::models::{MealType, User};
use dietary::Dietary;

use super::{confirm, parse_date, parse_uuid, resolve_patient, OutputFormat};

#[derive(Args)]
pub struct OrderCommand {
    #[command(subcommand)]
    pub command: OrderSubcommand,
}

#[derive(Subcommand)]
pub enum OrderSubcommand {
    /// Create orders from patients' current selections
    Create {
        /// Meal (breakfast, lunch, dinner)
        meal: MealType,

        /// Patient ID, name or room; every active patient with a selection when omitted
        #[arg(long, short)]
        patient: Option<String>,

        /// Order date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// List orders for a day
    List {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show an order
    Show {
        /// Order ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Send an order to the kitchen; it can no longer change
    Finalize {
        /// Order ID
        id: String,
    },

    /// Delete an open order
    Delete {
        /// Order ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// List finalized orders for a day
    Finalized {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl OrderCommand {
    pub async fn run(&self, dietary: &Dietary, user: &User) -> Result<(), Box<dyn std::error::Error>> {
        let orders = &dietary.orders;

        match &self.command {
            OrderSubcommand::Create {
                meal,
                patient,
                date,
            } => {
                let date = parse_date(date.as_deref())?;

                let targets = match patient {
                    Some(p) => vec![resolve_patient(&dietary.patients, p).await?],
                    None => dietary
                        .patients
                        .list_active()
                        .await?
                        .into_iter()
                        .filter(|p| !p.meal(*meal).is_empty())
                        .collect(),
                };
                if targets.is_empty() {
                    println!("No patients have a {} selection", meal);
                    return Ok(());
                }

                let single = patient.is_some();
                let mut created = 0;
                for target in &targets {
                    match orders
                        .create_order(target.id, *meal, date, &user.username)
                        .await
                    {
                        Ok(order) => {
                            created += 1;
                            println!(
                                "Created order {} for {} ({})",
                                order.id,
                                target.full_name(),
                                target.location
                            );
                        }
                        Err(e) if single => return Err(e.into()),
                        Err(e) => eprintln!("Skipped {}: {}", target.full_name(), e),
                    }
                }
                if !single {
                    println!("\nCreated {} of {} order(s)", created, targets.len());
                }
                Ok(())
            }

            OrderSubcommand::List { date, format } => {
                let date = parse_date(date.as_deref())?;
                let list = orders.list_orders(date).await?;

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
                    OutputFormat::Text if list.is_empty() => {
                        println!("No orders for {}", date)
                    }
                    OutputFormat::Text => {
                        let names: HashMap<_, _> = dietary
                            .patients
                            .list_all()
                            .await?
                            .into_iter()
                            .map(|p| (p.id, (p.full_name(), p.location.to_string())))
                            .collect();

                        println!(
                            "{:<36}  {:<9}  {:<24}  {:<10}  {:<9}  ITEMS",
                            "ID", "MEAL", "PATIENT", "ROOM", "STATUS"
                        );
                        println!("{}", "-".repeat(104));
                        for order in &list {
                            let (name, room) = names
                                .get(&order.patient_id)
                                .cloned()
                                .unwrap_or_default();
                            println!(
                                "{:<36}  {:<9}  {:<24}  {:<10}  {:<9}  {}",
                                order.id,
                                order.meal.to_string(),
                                name,
                                room,
                                if order.finalized { "finalized" } else { "open" },
                                order.items.len()
                            );
                        }
                        println!("\nTotal: {} order(s)", list.len());
                    }
                }
                Ok(())
            }

            OrderSubcommand::Show { id, format } => {
                let order = orders.get_order(parse_uuid(id, "order")?).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&order)?),
                    OutputFormat::Text => print!("{}", order),
                }
                Ok(())
            }

            OrderSubcommand::Finalize { id } => {
                let snapshot = orders
                    .finalize_order(parse_uuid(id, "order")?, &user.username)
                    .await?;
                println!("Finalized: {}", snapshot);
                Ok(())
            }

            OrderSubcommand::Delete { id, force } => {
                let order = orders.get_order(parse_uuid(id, "order")?).await?;

                if !force
                    && !confirm(&format!(
                        "Delete {} order for {}?",
                        order.meal, order.order_date
                    ))?
                {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                orders.delete_order(order.id).await?;
                println!("Deleted order: {}", order.id);
                Ok(())
            }

            OrderSubcommand::Finalized { date, format } => {
                let date = parse_date(date.as_deref())?;
                let list = orders.list_finalized(date).await?;

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
                    OutputFormat::Text if list.is_empty() => {
                        println!("No finalized orders for {}", date)
                    }
                    OutputFormat::Text => {
                        for order in &list {
                            println!("{}", order);
                        }
                        println!("\nTotal: {} order(s)", list.len());
                    }
                }
                Ok(())
            }
        }
    }
}
