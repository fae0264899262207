//! How a selected name maps onto the catalog. A selection stores plain names
//! in three lists; the list a name sits in decides which categories it may
//! resolve to.

use crate::db::ItemRepository;
use crate::error::ServiceResult;
use crate::models::{DefaultMenu, Item, ItemCategory, MealSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Group {
    Items,
    Juices,
    Drinks,
}

impl Group {
    pub(crate) fn accepts(self, category: ItemCategory) -> bool {
        match self {
            Group::Items => !matches!(category, ItemCategory::Juice | ItemCategory::Drink),
            Group::Juices => category == ItemCategory::Juice,
            Group::Drinks => category == ItemCategory::Drink,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Group::Items => "food item",
            Group::Juices => "juice",
            Group::Drinks => "drink",
        }
    }

    /// Category used when nothing is known about a name.
    pub(crate) fn fallback(self) -> ItemCategory {
        match self {
            Group::Items => ItemCategory::Entree,
            Group::Juices => ItemCategory::Juice,
            Group::Drinks => ItemCategory::Drink,
        }
    }
}

/// The three lists of a selection, in display order.
pub(crate) fn groups(selection: &MealSelection) -> [(Group, &Vec<String>); 3] {
    [
        (Group::Items, &selection.items),
        (Group::Juices, &selection.juices),
        (Group::Drinks, &selection.drinks),
    ]
}

/// What is known about a selected name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Resolved {
    pub category: ItemCategory,
    /// `None` when neither the catalog nor the default menu knows the name.
    pub ada_friendly: Option<bool>,
}

impl Resolved {
    pub(crate) fn ada_safe(&self) -> bool {
        self.ada_friendly == Some(true)
    }
}

/// Resolve `name` for `group`. Catalog items in the group come first, then
/// default-menu entries in the group, then any catalog item with the name.
/// A name nobody knows gets the group's fallback category.
pub(crate) async fn resolve(
    items: &ItemRepository,
    name: &str,
    group: Group,
) -> ServiceResult<Resolved> {
    let matches = items.find_by_name(name).await?;

    let in_group: Vec<&Item> = matches.iter().filter(|i| group.accepts(i.category)).collect();
    if let Some(first) = in_group.first() {
        return Ok(Resolved {
            category: first.category,
            ada_friendly: Some(in_group.iter().any(|i| i.ada_friendly)),
        });
    }

    let menu: Vec<_> = DefaultMenu::find(name)
        .into_iter()
        .filter(|(category, _)| group.accepts(*category))
        .collect();
    if let Some((category, _)) = menu.first() {
        return Ok(Resolved {
            category: *category,
            ada_friendly: Some(menu.iter().any(|(_, ada)| *ada)),
        });
    }

    if let Some(first) = matches.first() {
        return Ok(Resolved {
            category: first.category,
            ada_friendly: Some(matches.iter().any(|i| i.ada_friendly)),
        });
    }

    tracing::warn!(name, "selected name is not in the catalog or the default menu");
    Ok(Resolved {
        category: group.fallback(),
        ada_friendly: None,
    })
}

/// The part of `selection` an ADA patient may keep. The completion flag is
/// carried over.
pub(crate) async fn ada_only(
    items: &ItemRepository,
    selection: &MealSelection,
) -> ServiceResult<MealSelection> {
    let mut kept = [Vec::new(), Vec::new(), Vec::new()];
    for (slot, (group, names)) in kept.iter_mut().zip(groups(selection)) {
        for name in names {
            if resolve(items, name, group).await?.ada_safe() {
                slot.push(name.clone());
            }
        }
    }

    let [items, juices, drinks] = kept;
    Ok(MealSelection {
        items,
        juices,
        drinks,
        complete: selection.complete,
    })
}
