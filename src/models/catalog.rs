//! Catalog models matching the backend catalog schema.

use serde::{Deserialize, Serialize};

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Request body for creating or renaming a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
}

/// A purchasable variant of a product, with its own stock count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductVariant {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub available: bool,
    /// Units in stock
    #[serde(default)]
    pub quantity: i64,
}

impl ProductVariant {
    pub fn in_stock(&self) -> bool {
        self.available && self.quantity > 0
    }
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub category_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<ProductVariant>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub available: bool,
}

/// Request body for creating or updating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<ProductVariant>>,
}

/// Public catalog: all categories and products.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogResponse {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}

impl CatalogResponse {
    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    /// Products belonging to a category, in catalog order.
    pub fn products_in<'a>(
        &'a self,
        category_id: &'a str,
    ) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .iter()
            .filter(move |p| p.category_id == category_id)
    }

    /// Speculative stock decrement after a successful add-to-cart.
    ///
    /// The variant's quantity is reduced and clamped at zero; at zero the
    /// variant becomes unavailable. The product stays available only while at
    /// least one variant is in stock. Returns `None` when the product or
    /// variant is not in this catalog.
    pub fn with_variant_stock_decremented(
        &self,
        product_id: &str,
        variant_id: &str,
        quantity: i64,
    ) -> Option<Self> {
        let product_index = self.products.iter().position(|p| p.id == product_id)?;
        let product = &self.products[product_index];
        let variants = product.variants.as_ref()?;
        let variant_index = variants.iter().position(|v| v.id == variant_id)?;

        let mut variants = variants.clone();
        let variant = &mut variants[variant_index];
        variant.quantity = (variant.quantity - quantity).max(0);
        if variant.quantity == 0 {
            variant.available = false;
        }

        let any_in_stock = variants.iter().any(ProductVariant::in_stock);

        let mut next = self.clone();
        let next_product = &mut next.products[product_index];
        next_product.available = product.available && any_in_stock;
        next_product.variants = Some(variants);
        Some(next)
    }
}

/// A category with its products, as returned by the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCategoryDetail {
    pub category: Category,
    pub products: Vec<Product>,
}
