//! Nutrition meal plan, stored in the `mealPlan` content slice.

use crate::constants::MEAL_PLAN_SLICE;
use crate::models::content::ContentSlice;
use clinica_uuid::ItemIdGenerator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default)]
    pub items: Vec<MealItem>,
}

/// Editable text fields of a [`MealItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealItemField {
    Name,
    Quantity,
    Substitution,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MealPlan(pub Vec<Meal>);

impl ContentSlice for MealPlan {
    const KEY: &'static str = MEAL_PLAN_SLICE;
}

const DEFAULT_MEALS: [(&str, &str); 6] = [
    ("Café da Manhã", "07:30"),
    ("Lanche da Manhã", "10:00"),
    ("Almoço", "12:30"),
    ("Lanche da Tarde", "16:00"),
    ("Jantar", "19:30"),
    ("Ceia", "22:00"),
];

impl MealPlan {
    /// The six-meal day offered when a record has no plan yet.
    pub fn default_day(ids: &ItemIdGenerator) -> Self {
        Self(
            DEFAULT_MEALS
                .iter()
                .map(|(name, time)| Meal {
                    id: ids.next_id(),
                    name: (*name).to_string(),
                    time: Some((*time).to_string()),
                    items: Vec::new(),
                })
                .collect(),
        )
    }

    pub fn meals(&self) -> &[Meal] {
        &self.0
    }

    pub fn item_count(&self) -> usize {
        self.0.iter().map(|m| m.items.len()).sum()
    }
}

impl MealItem {
    pub fn blank(id: String) -> Self {
        Self {
            id,
            name: String::new(),
            quantity: Some(String::new()),
            substitution: None,
        }
    }

    pub fn set(&mut self, field: MealItemField, value: String) {
        match field {
            MealItemField::Name => self.name = value,
            MealItemField::Quantity => self.quantity = Some(value),
            MealItemField::Substitution => self.substitution = Some(value),
        }
    }
}
