//! Cart

use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::{CatalogSnapshot, Product},
    ids::ProductId,
    money::Amount,
};

/// Errors raised while editing a cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The line already holds every unit the machine has (product, units available).
    #[error("only {available} of {product_id} in stock")]
    OutOfStock {
        product_id: ProductId,
        available: u32,
    },
}

/// One product in the cart, with the stock seen at the last sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price when the line was created.
    pub price: Amount,
    pub image: String,
    pub quantity: u32,
    pub stock: u32,
}

impl CartLine {
    fn new(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: 1,
            stock: product.stock,
        }
    }

    #[must_use]
    pub fn line_total(&self) -> Amount {
        self.price.times(self.quantity)
    }
}

/// A quantity change forced by reconciliation. `to == 0` means the line was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAdjustment {
    pub product_id: ProductId,
    pub from: u32,
    pub to: u32,
}

impl LineAdjustment {
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        self.to == 0
    }
}

/// Client-local cart. Lines keep the order they were first added in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`, returning the new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when the line already matches the
    /// product's stock.
    pub fn add(&mut self, product: &Product) -> Result<u32, CartError> {
        let out_of_stock = || CartError::OutOfStock {
            product_id: product.id.clone(),
            available: product.stock,
        };

        if product.stock == 0 {
            return Err(out_of_stock());
        }

        match self.line_mut(&product.id) {
            Some(line) if line.quantity < product.stock => {
                line.quantity += 1;
                line.stock = product.stock;
                Ok(line.quantity)
            }
            Some(_) => Err(out_of_stock()),
            None => {
                self.lines.push(CartLine::new(product));
                Ok(1)
            }
        }
    }

    /// Remove one unit, dropping the line at zero. Returns the new quantity, or
    /// `None` when the product was not in the cart.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<u32> {
        let line = self.line_mut(product_id)?;
        line.quantity = line.quantity.saturating_sub(1);
        let quantity = line.quantity;

        if quantity == 0 {
            self.lines.retain(|line| &line.product_id != product_id);
        }

        Some(quantity)
    }

    /// Bring every line within the stock of `snapshot`.
    ///
    /// Quantities only ever go down. Lines whose product is gone or sold out
    /// are dropped.
    pub fn reconcile(&mut self, snapshot: &CatalogSnapshot) -> Vec<LineAdjustment> {
        let mut adjustments = Vec::new();

        for line in &mut self.lines {
            let stock = snapshot.stock_of(&line.product_id);
            line.stock = stock;

            if line.quantity > stock {
                adjustments.push(LineAdjustment {
                    product_id: line.product_id.clone(),
                    from: line.quantity,
                    to: stock,
                });
                line.quantity = stock;
            }
        }

        self.lines.retain(|line| line.quantity > 0);

        if !adjustments.is_empty() {
            debug!(adjusted = adjustments.len(), "cart reconciled against stock");
        }

        adjustments
    }

    #[must_use]
    pub fn subtotal(&self) -> Amount {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |total, line| total.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| &line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| &line.product_id == product_id)
    }
}
