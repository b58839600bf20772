//! Catalog product entity.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Top-level catalog category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Men,
    Women,
    Kids,
    Accessories,
    Footwear,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Men => "Men",
            Category::Women => "Women",
            Category::Kids => "Kids",
            Category::Accessories => "Accessories",
            Category::Footwear => "Footwear",
        };
        write!(f, "{s}")
    }
}

/// Garment size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    XS,
    S,
    M,
    L,
    XL,
    XXL,
    #[serde(rename = "Free Size")]
    FreeSize,
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Size::XS => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::XL => "XL",
            Size::XXL => "XXL",
            Size::FreeSize => "Free Size",
        };
        write!(f, "{s}")
    }
}

/// A product image with optional alt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// A catalog product.
///
/// `stock_quantity` is the only hot shared-mutable field; all mutations to it
/// go through the store's conditional decrement / increment, never
/// read-modify-write in application code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    pub sizes: Vec<Size>,
    pub stock_quantity: u32,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub is_featured: bool,
    /// Discount percentage, 0–100.
    #[serde(default)]
    pub discount: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: Category,
    #[serde(default)]
    pub sub_category: Option<String>,
    pub sizes: Vec<Size>,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub discount: u8,
}

/// Partial update for a product (admin). Fields left `None` are unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<Category>,
    pub sub_category: Option<String>,
    pub sizes: Option<Vec<Size>>,
    pub stock_quantity: Option<u32>,
    pub images: Option<Vec<ProductImage>>,
    pub is_featured: Option<bool>,
    pub discount: Option<u8>,
}

impl Product {
    /// Creates a validated product from admin input.
    pub fn new(input: NewProduct) -> Result<Self, DomainError> {
        let now = Utc::now();
        let product = Self {
            id: ProductId::new(),
            name: input.name,
            description: input.description,
            price: input.price,
            category: input.category,
            sub_category: input.sub_category,
            sizes: input.sizes,
            stock_quantity: input.stock_quantity,
            images: input.images,
            is_featured: input.is_featured,
            discount: input.discount,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Applies a partial update, re-validating the result.
    pub fn apply_update(&mut self, update: ProductUpdate) -> Result<(), DomainError> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(sub_category) = update.sub_category {
            self.sub_category = Some(sub_category);
        }
        if let Some(sizes) = update.sizes {
            self.sizes = sizes;
        }
        if let Some(stock_quantity) = update.stock_quantity {
            self.stock_quantity = stock_quantity;
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        if let Some(is_featured) = update.is_featured {
            self.is_featured = is_featured;
        }
        if let Some(discount) = update.discount {
            self.discount = discount;
        }
        self.updated_at = Utc::now();
        self.validate()
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Product name is required.".to_string(),
            ));
        }
        if self.price.is_negative() {
            return Err(DomainError::Validation(
                "Price cannot be negative.".to_string(),
            ));
        }
        if self.sizes.is_empty() {
            return Err(DomainError::Validation(
                "At least one size is required.".to_string(),
            ));
        }
        if self.discount > 100 {
            return Err(DomainError::Validation(
                "Discount must be between 0 and 100.".to_string(),
            ));
        }
        Ok(())
    }

    /// Price after applying the discount percentage.
    pub fn discounted_price(&self) -> Money {
        self.price.with_discount(self.discount)
    }

    /// True if the product is declared in the given size.
    pub fn has_size(&self, size: Size) -> bool {
        self.sizes.contains(&size)
    }
}
