use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storehub_core::{DomainError, DomainResult, Entity, ProductId};
use storehub_query::{EntitySchema, Field, FieldDef, FieldKind, IntWidth, Queryable, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Fruits,
    Vegetables,
    Dairy,
    Bakery,
    Meat,
    Seafood,
    Beverages,
    Household,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Fruits,
        Category::Vegetables,
        Category::Dairy,
        Category::Bakery,
        Category::Meat,
        Category::Seafood,
        Category::Beverages,
        Category::Household,
    ];

    pub const NAMES: &'static [&'static str] = &[
        "FRUITS",
        "VEGETABLES",
        "DAIRY",
        "BAKERY",
        "MEAT",
        "SEAFOOD",
        "BEVERAGES",
        "HOUSEHOLD",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fruits => "FRUITS",
            Category::Vegetables => "VEGETABLES",
            Category::Dairy => "DAIRY",
            Category::Bakery => "BAKERY",
            Category::Meat => "MEAT",
            Category::Seafood => "SEAFOOD",
            Category::Beverages => "BEVERAGES",
            Category::Household => "HOUSEHOLD",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown category: {s}")))
    }
}

pub static PRODUCT_SCHEMA: EntitySchema = EntitySchema {
    entity: "Product",
    table: "products",
    fields: &[
        FieldDef::new("id", "id", FieldKind::Identifier),
        FieldDef::new("name", "name", FieldKind::Text),
        FieldDef::new("description", "description", FieldKind::Text),
        FieldDef::new("category", "category", FieldKind::Enumeration(Category::NAMES)),
        FieldDef::new("price", "price", FieldKind::Float),
        FieldDef::new("quantity", "quantity", FieldKind::Integer(IntWidth::Int32)),
        FieldDef::new("discount", "discount", FieldKind::Float),
    ],
};

/// Catalog entry. Names are unique across the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub price: f64,
    pub quantity: i32,
    pub discount: Option<f64>,
}

impl Product {
    pub fn from_draft(draft: ProductDraft) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id: ProductId::new(),
            name: draft.name,
            description: draft.description,
            category: draft.category,
            price: draft.price,
            quantity: draft.quantity,
            discount: draft.discount,
        })
    }

    /// Overwrite every mutable field from `draft`. The id is kept.
    pub fn apply(&mut self, draft: ProductDraft) -> DomainResult<()> {
        draft.validate()?;
        self.name = draft.name;
        self.description = draft.description;
        self.category = draft.category;
        self.price = draft.price;
        self.quantity = draft.quantity;
        self.discount = draft.discount;
        Ok(())
    }

    pub fn change_price(&mut self, amount: f64) -> DomainResult<()> {
        ensure_non_negative("Price", amount)?;
        self.price = amount;
        Ok(())
    }

    /// Add `amount` to the stock. Negative amounts are allowed while the
    /// resulting quantity stays non-negative.
    pub fn increase_quantity(&mut self, amount: i32) -> DomainResult<()> {
        let next = self
            .quantity
            .checked_add(amount)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?;
        if next < 0 {
            return Err(DomainError::validation("Quantity cannot be negative"));
        }
        self.quantity = next;
        Ok(())
    }
}

fn ensure_non_negative(label: &str, value: f64) -> DomainResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(format!("{label} cannot be negative")));
    }
    Ok(())
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: &'static str = "Product";

    fn id(&self) -> &ProductId {
        &self.id
    }
}

impl Record for Product {
    fn field(&self, name: &str) -> Field<'_> {
        match name {
            "id" => Field::Value((*self.id.as_uuid()).into()),
            "name" => Field::Value(self.name.as_str().into()),
            "description" => Field::Value(self.description.clone().into()),
            "category" => Field::Value(self.category.as_str().into()),
            "price" => Field::Value(self.price.into()),
            "quantity" => Field::Value(self.quantity.into()),
            "discount" => Field::Value(self.discount.into()),
            _ => Field::Missing,
        }
    }
}

impl Queryable for Product {
    fn schema() -> &'static EntitySchema {
        &PRODUCT_SCHEMA
    }
}

/// Create/update input for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub discount: Option<f64>,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, category: Category, price: f64, quantity: i32) -> Self {
        Self {
            name: name.into(),
            description: None,
            category,
            price,
            quantity,
            discount: None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Name is required"));
        }
        ensure_non_negative("Price", self.price)?;
        if self.quantity < 0 {
            return Err(DomainError::validation("Quantity cannot be negative"));
        }
        if let Some(discount) = self.discount {
            ensure_non_negative("Discount", discount)?;
        }
        Ok(())
    }
}
