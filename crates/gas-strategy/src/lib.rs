//! Gas Strategy Manager (component B): derives a `GasQuote` from a
//! network's configured strategy and a live provider read.

pub mod error;
pub mod manager;
pub mod reader;

pub use error::{GasSourceError, GasStrategyError};
pub use manager::GasStrategyManager;
pub use reader::GasPriceSource;
