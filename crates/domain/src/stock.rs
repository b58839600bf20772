//! Stock validation and atomic mutation helpers.
//!
//! Every stock mutation goes through the catalog port's conditional
//! decrement / increment; this module turns the store-level outcomes into
//! domain errors that name the product and its remaining availability.

use common::ProductId;

use crate::error::DomainError;
use crate::product::Product;
use crate::storage::{CatalogStore, DeductOutcome};

/// Guards against any operation driving a product's stock negative.
#[derive(Clone)]
pub struct StockValidator<S> {
    store: S,
}

impl<S: CatalogStore> StockValidator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Checks that `requested` units are currently available, returning the
    /// product on success so callers can reuse the read.
    ///
    /// This is a point-in-time read; commit paths re-check via the
    /// conditional decrement.
    pub async fn check_availability(
        &self,
        product_id: ProductId,
        requested: u32,
    ) -> Result<Product, DomainError> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound(product_id))?;

        if product.stock_quantity < requested {
            return Err(DomainError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock_quantity,
                requested,
            });
        }
        Ok(product)
    }

    /// Atomically decrements stock, failing without mutation when fewer
    /// than `quantity` units remain.
    pub async fn deduct(&self, product_id: ProductId, quantity: u32) -> Result<(), DomainError> {
        match self.store.try_deduct_stock(product_id, quantity).await? {
            DeductOutcome::Applied => Ok(()),
            DeductOutcome::Missing { product_id } => {
                Err(DomainError::ProductNotFound(product_id))
            }
            DeductOutcome::Insufficient {
                product_id,
                available,
                requested,
            } => {
                let name = match self.store.get_product(product_id).await {
                    Ok(Some(p)) => p.name,
                    _ => product_id.to_string(),
                };
                Err(DomainError::InsufficientStock {
                    name,
                    available,
                    requested,
                })
            }
        }
    }

    /// Increments stock; used exactly once per cancelled non-bulk order.
    pub async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<(), DomainError> {
        self.store.restore_stock(product_id, quantity).await?;
        Ok(())
    }
}
