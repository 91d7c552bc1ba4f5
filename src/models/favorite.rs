use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::db::Row;
use crate::models::order::{lenient_price, parse_price};

pub const FAVORITES_HEADER: [&str; 4] = ["Name", "Restaurant", "Order", "Price"];

/// A person's saved go-to order at one restaurant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub name: String,
    pub restaurant: String,
    pub order: String,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: BigDecimal,
}

impl Favorite {
    /// (name, restaurant) identifies a favorite
    pub fn is_same(&self, name: &str, restaurant: &str) -> bool {
        self.name == name && self.restaurant == restaurant
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.name.clone(),
            self.restaurant.clone(),
            self.order.clone(),
            self.price.to_string(),
        ]
    }

    pub fn from_row(row: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        let name = row.first()?.clone();
        Some(Self {
            name,
            restaurant: cell(1),
            order: cell(2),
            price: parse_price(&cell(3)),
        })
    }
}
