//! Catalog Models

use rust_decimal::prelude::ToPrimitive;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::{
    ids::ProductId,
    money::{Amount, decimal_from_value},
};

/// Glyph shown for products without an image.
pub const DEFAULT_IMAGE: &str = "📦";

/// A product slot in one machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Amount,
    pub stock: u32,
    pub image: String,
    /// When the product last sold, in epoch milliseconds.
    pub last_sold: Option<i64>,
}

impl Product {
    /// Read an inventory child, coercing malformed numbers to zero.
    ///
    /// Returns `None` when the child is not an object.
    #[must_use]
    pub fn from_value(id: ProductId, value: &Value) -> Option<Self> {
        let fields = value.as_object()?;

        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .map_or_else(|| id.to_string(), str::to_string);

        let image = fields
            .get("image")
            .and_then(Value::as_str)
            .filter(|image| !image.trim().is_empty())
            .unwrap_or(DEFAULT_IMAGE)
            .to_string();

        Some(Self {
            price: Amount::coerce(fields.get("price")),
            stock: coerce_stock(fields.get("stock")),
            last_sold: fields.get("lastSold").and_then(Value::as_i64),
            id,
            name,
            image,
        })
    }

    /// Whether the product can be offered to a shopper.
    #[must_use]
    pub const fn is_offerable(&self) -> bool {
        self.stock > 0
    }
}

/// Lenient stock count: numbers and numeric strings, floored, negatives as zero.
pub(crate) fn coerce_stock(value: Option<&Value>) -> u32 {
    value
        .and_then(decimal_from_value)
        .filter(|stock| stock.is_sign_positive())
        .map_or(0, |stock| stock.floor().to_u32().unwrap_or(u32::MAX))
}

/// Products of one machine at one instant, ordered by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSnapshot {
    products: Vec<Product>,
    index: FxHashMap<ProductId, usize>,
}

impl CatalogSnapshot {
    #[must_use]
    pub fn new(mut products: Vec<Product>) -> Self {
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products.dedup_by(|a, b| a.id == b.id);

        let index = products
            .iter()
            .enumerate()
            .map(|(position, product)| (product.id.clone(), position))
            .collect();

        Self { products, index }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.index
            .get(id)
            .and_then(|position| self.products.get(*position))
    }

    /// Stock of `id`, zero when the product is not listed.
    #[must_use]
    pub fn stock_of(&self, id: &ProductId) -> u32 {
        self.get(id).map_or(0, |product| product.stock)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Offerable products under an inventory node. Missing data is an empty catalog.
#[must_use]
pub fn parse_inventory(node: Option<&Value>) -> CatalogSnapshot {
    CatalogSnapshot::new(
        parse_children(node)
            .filter(Product::is_offerable)
            .collect(),
    )
}

/// Every product under an inventory node, out-of-stock ones included.
#[must_use]
pub fn parse_inventory_all(node: Option<&Value>) -> CatalogSnapshot {
    CatalogSnapshot::new(parse_children(node).collect())
}

fn parse_children(node: Option<&Value>) -> impl Iterator<Item = Product> + '_ {
    node.and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter_map(|(id, value)| Product::from_value(ProductId::new(id.as_str()), value))
}
