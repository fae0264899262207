use clap::{Args, Subcommand};
use uuid::Uuid;

use dietary::models::{Item, ItemCategory, ItemFilter, MealType};
use dietary::services::ItemService;
use dietary::Dietary;

use super::{confirm, OutputFormat};

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add an item to the catalog
    Add {
        /// Item name
        name: String,

        /// Category (entree, side, starch, vegetable, fruit, bread, cereal, soup, dessert, condiment, juice, drink)
        #[arg(long, short)]
        category: ItemCategory,

        /// Safe for ADA patients
        #[arg(long)]
        ada: bool,

        /// Only served at this meal
        #[arg(long, short)]
        meal: Option<MealType>,

        /// Serving size, e.g. "8 oz"
        #[arg(long, short)]
        serving: Option<String>,
    },

    /// List catalog items
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only this category
        #[arg(long, short)]
        category: Option<ItemCategory>,

        /// Only items served at this meal
        #[arg(long, short)]
        meal: Option<MealType>,

        /// Only ADA-friendly items
        #[arg(long)]
        ada: bool,
    },

    /// Show an item's details
    Show {
        /// Item ID (UUID) or name
        identifier: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an item
    Update {
        /// Item ID (UUID) or name
        identifier: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New category
        #[arg(long, short)]
        category: Option<ItemCategory>,

        /// Set the ADA flag (true or false)
        #[arg(long)]
        ada: Option<bool>,

        /// Restrict to a meal
        #[arg(long, short, conflicts_with = "any_meal")]
        meal: Option<MealType>,

        /// Serve at every meal
        #[arg(long)]
        any_meal: bool,

        /// New serving size
        #[arg(long, short)]
        serving: Option<String>,
    },

    /// Delete an item
    Delete {
        /// Item ID (UUID) or name
        identifier: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Add the default menu's items to the catalog
    Seed,
}

async fn find_item(items: &ItemService, identifier: &str) -> Result<Item, Box<dyn std::error::Error>> {
    let item = if let Ok(id) = Uuid::parse_str(identifier) {
        items.get_item(id).await?
    } else {
        items.find_by_name(identifier).await?
    };
    Ok(item)
}

impl ItemCommand {
    pub async fn run(&self, dietary: &Dietary) -> Result<(), Box<dyn std::error::Error>> {
        let items = &dietary.items;

        match &self.command {
            ItemSubcommand::Add {
                name,
                category,
                ada,
                meal,
                serving,
            } => {
                let mut item = Item::new(name.as_str(), *category);
                item.ada_friendly = *ada;
                item.meal_type = *meal;
                item.serving_size = serving.clone();

                let created = items.add_item(item).await?;
                println!("Added item: {}", created);
                Ok(())
            }

            ItemSubcommand::List {
                format,
                category,
                meal,
                ada,
            } => {
                let filter = ItemFilter {
                    category: *category,
                    meal_type: *meal,
                    ada_only: *ada,
                };
                let list = items.list_items(&filter).await?;

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
                    OutputFormat::Text if list.is_empty() => println!("No items found"),
                    OutputFormat::Text => {
                        println!(
                            "{:<36}  {:<28}  {:<10}  {:<9}  {:<3}  SERVING",
                            "ID", "NAME", "CATEGORY", "MEAL", "ADA"
                        );
                        println!("{}", "-".repeat(100));
                        for item in &list {
                            let name = if item.name.len() > 28 {
                                format!("{}...", &item.name[..25])
                            } else {
                                item.name.clone()
                            };
                            println!(
                                "{:<36}  {:<28}  {:<10}  {:<9}  {:<3}  {}",
                                item.id,
                                name,
                                item.category.to_string(),
                                item.meal_type.map(|m| m.as_str()).unwrap_or("any"),
                                if item.ada_friendly { "yes" } else { "" },
                                item.serving_size.as_deref().unwrap_or("")
                            );
                        }
                        println!("\nTotal: {} item(s)", list.len());
                    }
                }
                Ok(())
            }

            ItemSubcommand::Show { identifier, format } => {
                let item = find_item(items, identifier).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&item)?),
                    OutputFormat::Text => {
                        println!("{}", item);
                        println!(
                            "Served at: {}",
                            item.meal_type.map(|m| m.as_str()).unwrap_or("any meal")
                        );
                        println!("ID: {}", item.id);
                    }
                }
                Ok(())
            }

            ItemSubcommand::Update {
                identifier,
                name,
                category,
                ada,
                meal,
                any_meal,
                serving,
            } => {
                let has_updates = name.is_some()
                    || category.is_some()
                    || ada.is_some()
                    || meal.is_some()
                    || *any_meal
                    || serving.is_some();
                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut item = find_item(items, identifier).await?;
                if let Some(name) = name {
                    item.name = name.clone();
                }
                if let Some(category) = category {
                    item.category = *category;
                }
                if let Some(ada) = ada {
                    item.ada_friendly = *ada;
                }
                if *any_meal {
                    item.meal_type = None;
                } else if meal.is_some() {
                    item.meal_type = *meal;
                }
                if let Some(serving) = serving {
                    item.serving_size = Some(serving.clone());
                }

                let updated = items.update_item(item).await?;
                println!("Updated item: {}", updated);
                Ok(())
            }

            ItemSubcommand::Delete { identifier, force } => {
                let item = find_item(items, identifier).await?;

                if !force && !confirm(&format!("Delete item '{}'?", item.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                items.delete_item(item.id).await?;
                println!("Deleted item: {}", item.name);
                Ok(())
            }

            ItemSubcommand::Seed => {
                let added = items.seed_defaults().await?;
                println!("Added {} default item(s)", added);
                Ok(())
            }
        }
    }
}
