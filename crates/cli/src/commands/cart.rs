//! Cart commands.
//!
//! Wires a [`CartStore`] to the store API and the on-disk cart, then renders
//! the notifications and cart for the terminal.

use std::io::Write;
use std::sync::Arc;

use rocketshoes_cart::{
    ApiClient, ApiError, CartConfig, CartError, CartOutcome, CartState, CartStore,
    ChannelNotifier, FileStorage, Notification,
};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Store API client could not be built.
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    /// The cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),

    /// Cart could not be encoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How the cart is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// A store plus the notifications it has raised.
pub struct CartSession {
    store: CartStore,
    notices: UnboundedReceiver<Notification>,
}

impl CartSession {
    /// Open the persisted cart and connect it to the store API.
    ///
    /// # Errors
    ///
    /// Returns error if the API client cannot be built or storage cannot be read.
    pub fn open(config: &CartConfig) -> Result<Self, CommandError> {
        let api = Arc::new(ApiClient::new(config)?);
        let (notifier, notices) = ChannelNotifier::channel();

        let store = CartStore::initialize(
            api.clone(),
            api,
            Arc::new(FileStorage::new(&config.storage_dir)),
            Arc::new(notifier),
        )?;

        tracing::debug!(storage_dir = %config.storage_dir.display(), "Cart session opened");

        Ok(Self { store, notices })
    }

    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// Write pending notifications, one per line.
    ///
    /// # Errors
    ///
    /// Returns error if writing fails.
    pub fn flush_notifications(&mut self, out: &mut impl Write) -> Result<(), CommandError> {
        write_notifications(&mut self.notices, out)
    }

    /// Write the current cart.
    ///
    /// # Errors
    ///
    /// Returns error if writing or encoding fails.
    pub fn render(&self, format: OutputFormat, out: &mut impl Write) -> Result<(), CommandError> {
        let cart = self.store.cart();
        match format {
            OutputFormat::Table => render_table(&cart, out)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, &*cart)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

/// Map an outcome to the command result. Rejections are not failures.
///
/// # Errors
///
/// Returns the cart error of a failed operation.
pub fn into_result(outcome: CartOutcome) -> Result<(), CommandError> {
    match outcome {
        CartOutcome::Committed(_) | CartOutcome::Rejected(_) => Ok(()),
        CartOutcome::Failed(err) => Err(err.into()),
    }
}

fn write_notifications(
    notices: &mut UnboundedReceiver<Notification>,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    while let Ok(notice) = notices.try_recv() {
        writeln!(out, "! {notice}")?;
    }
    Ok(())
}

fn render_table(cart: &CartState, out: &mut impl Write) -> std::io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Carrinho vazio");
    }

    for item in cart {
        writeln!(
            out,
            "{:>5}  {:<40}  {:>10}  x{}",
            item.product_id(),
            item.product.title,
            item.product.price,
            item.amount
        )?;
    }
    writeln!(out, "Itens: {}", cart.total_quantity())
}
