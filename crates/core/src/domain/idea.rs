use serde::{Deserialize, Serialize};

/// One gift suggestion as returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub name: String,
    /// Average estimated price in euros.
    pub price: f64,
}

impl Idea {
    pub fn formatted_price(&self) -> String {
        format!("{:.2}", self.price)
    }
}
