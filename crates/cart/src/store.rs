//! The cart store.
//!
//! `CartStore` holds the authoritative cart and changes it only through
//! [`CartStore::add_product`], [`CartStore::remove_product`] and
//! [`CartStore::update_product_amount`]. Each operation looks up what it
//! needs, computes a new [`CartState`], persists it, and only then publishes
//! it. Anything short of that leaves both the in-memory and the persisted
//! cart exactly as they were.
//!
//! Operations are serialized: a second call waits for the first to finish,
//! so it always starts from the previous call's result.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

use rocketshoes_core::{CartState, LineItem, ProductId};

use crate::api::ApiError;
use crate::error::CartError;
use crate::notify::{Notification, Notifier};
use crate::services::{ProductCatalog, StockService};
use crate::storage::{CART_STORAGE_KEY, CartStorage};

/// An expected reason not to change the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The requested quantity exceeds available stock.
    OutOfStock { requested: i64, available: i64 },
    /// A quantity update of zero or less; ignored without notice.
    NonPositiveAmount(i64),
}

/// Result of a cart operation.
#[derive(Debug)]
pub enum CartOutcome {
    /// The cart changed; holds the new snapshot.
    Committed(Arc<CartState>),
    /// The request was valid but could not be honored. Cart unchanged.
    Rejected(Rejection),
    /// The operation failed. Cart unchanged.
    Failed(CartError),
}

impl CartOutcome {
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// Why an operation stopped before committing.
enum Halt {
    Rejected(Rejection),
    Failed(CartError),
}

impl From<CartError> for Halt {
    fn from(err: CartError) -> Self {
        Self::Failed(err)
    }
}

impl From<ApiError> for Halt {
    fn from(err: ApiError) -> Self {
        Self::Failed(CartError::Lookup(err))
    }
}

/// Shopping cart state holder.
///
/// Owned by the application root and shared with `Arc`.
pub struct CartStore {
    stock: Arc<dyn StockService>,
    catalog: Arc<dyn ProductCatalog>,
    storage: Arc<dyn CartStorage>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<Arc<CartState>>,
    queue: Mutex<()>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &*self.cart())
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create the store, seeding the cart from storage.
    ///
    /// A missing snapshot starts an empty cart. So does a snapshot that is
    /// not valid JSON or that breaks the cart invariants (duplicate products,
    /// zero amounts); the problem is logged and the bad snapshot is replaced
    /// on the next successful change.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if storage cannot be read.
    pub fn initialize(
        stock: Arc<dyn StockService>,
        catalog: Arc<dyn ProductCatalog>,
        storage: Arc<dyn CartStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CartError> {
        let cart = load_persisted(storage.as_ref())?;
        info!(
            items = cart.len(),
            total_quantity = cart.total_quantity(),
            "Cart initialized"
        );

        let (state, _) = watch::channel(Arc::new(cart));

        Ok(Self {
            stock,
            catalog,
            storage,
            notifier,
            state,
            queue: Mutex::new(()),
        })
    }

    /// Current cart snapshot.
    #[must_use]
    pub fn cart(&self) -> Arc<CartState> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every committed snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<CartState>> {
        self.state.subscribe()
    }

    /// Add one unit of a product.
    ///
    /// Increments the existing line, or appends a new line with amount 1
    /// using metadata from the catalog. Rejected when stock cannot cover the
    /// new amount.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) -> CartOutcome {
        let _queued = self.queue.lock().await;
        let result = self.plan_add(product_id).await;
        self.finish(result, Notification::AddFailed)
    }

    /// Remove a product's line entirely.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: ProductId) -> CartOutcome {
        let _queued = self.queue.lock().await;
        let result = self
            .cart()
            .without(product_id)
            .ok_or(Halt::Failed(CartError::NotInCart(product_id)));
        self.finish(result, Notification::RemoveFailed)
    }

    /// Set a product's quantity.
    ///
    /// Amounts of zero or less are ignored. The product must already be in
    /// the cart.
    #[instrument(skip_all, fields(product_id = %product_id, amount = amount))]
    pub async fn update_product_amount(&self, product_id: ProductId, amount: i64) -> CartOutcome {
        if amount <= 0 {
            let outcome = CartOutcome::Rejected(Rejection::NonPositiveAmount(amount));
            self.report(&outcome, Notification::UpdateFailed);
            return outcome;
        }

        let _queued = self.queue.lock().await;
        let result = self.plan_update(product_id, amount).await;
        self.finish(result, Notification::UpdateFailed)
    }

    async fn plan_add(&self, product_id: ProductId) -> Result<CartState, Halt> {
        let current = self.cart();
        let existing = current.get(product_id).map(|item| item.amount);

        let stock = self.stock.stock(product_id).await?;
        let requested = existing.unwrap_or(0).saturating_add(1);

        if i64::from(requested) > stock.amount {
            return Err(Halt::Rejected(Rejection::OutOfStock {
                requested: i64::from(requested),
                available: stock.amount,
            }));
        }

        if existing.is_some() {
            return Ok(current.with_amount(product_id, requested));
        }

        let product = self.catalog.product(product_id).await?;
        if product.id != product_id {
            return Err(Halt::Failed(CartError::CatalogMismatch {
                requested: product_id,
                returned: product.id,
            }));
        }

        Ok(current.with_item(LineItem::new(product, 1)))
    }

    async fn plan_update(&self, product_id: ProductId, amount: i64) -> Result<CartState, Halt> {
        let stock = self.stock.stock(product_id).await?;
        let out_of_stock = || {
            Halt::Rejected(Rejection::OutOfStock {
                requested: amount,
                available: stock.amount,
            })
        };

        if amount > stock.amount {
            return Err(out_of_stock());
        }
        let amount = u32::try_from(amount).map_err(|_| out_of_stock())?;

        let current = self.cart();
        if !current.contains(product_id) {
            return Err(Halt::Failed(CartError::NotInCart(product_id)));
        }

        Ok(current.with_amount(product_id, amount))
    }

    /// Commit a planned cart, report the outcome, and return it.
    fn finish(&self, planned: Result<CartState, Halt>, failure: Notification) -> CartOutcome {
        let outcome = match planned.and_then(|next| self.commit(next).map_err(Halt::from)) {
            Ok(cart) => CartOutcome::Committed(cart),
            Err(Halt::Rejected(rejection)) => CartOutcome::Rejected(rejection),
            Err(Halt::Failed(err)) => CartOutcome::Failed(err),
        };
        self.report(&outcome, failure);
        outcome
    }

    /// Persist `next`, then publish it.
    fn commit(&self, next: CartState) -> Result<Arc<CartState>, CartError> {
        let json = serde_json::to_string(&next)?;
        self.storage.store(CART_STORAGE_KEY, &json)?;

        let next = Arc::new(next);
        self.state.send_replace(Arc::clone(&next));
        Ok(next)
    }

    fn report(&self, outcome: &CartOutcome, failure: Notification) {
        match outcome {
            CartOutcome::Committed(cart) => {
                info!(
                    items = cart.len(),
                    total_quantity = cart.total_quantity(),
                    "Cart updated"
                );
            }
            CartOutcome::Rejected(Rejection::OutOfStock {
                requested,
                available,
            }) => {
                info!(requested, available, "Requested quantity out of stock");
                self.notifier.notify(Notification::OutOfStock);
            }
            CartOutcome::Rejected(Rejection::NonPositiveAmount(amount)) => {
                debug!(amount, "Ignoring non-positive quantity");
            }
            CartOutcome::Failed(err) => {
                warn!(error = %err, "Cart operation failed");
                self.notifier.notify(failure);
            }
        }
    }
}

/// Read the persisted snapshot, falling back to an empty cart when it is unusable.
fn load_persisted(storage: &dyn CartStorage) -> Result<CartState, CartError> {
    let Some(raw) = storage.load(CART_STORAGE_KEY)? else {
        return Ok(CartState::empty());
    };

    match serde_json::from_str::<CartState>(&raw) {
        Ok(cart) if cart.is_consistent() => Ok(cart),
        Ok(cart) => {
            warn!(
                items = cart.len(),
                "Persisted cart has duplicate products or empty lines, starting empty"
            );
            Ok(CartState::empty())
        }
        Err(e) => {
            warn!(error = %e, "Persisted cart is malformed, starting empty");
            Ok(CartState::empty())
        }
    }
}
