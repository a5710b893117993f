/*!
 * Signals Module
 * Many-to-many dispatch between signals and slot owners with reciprocal cleanup
 */

mod atomic_stats;
mod connection;
mod signal;
mod slots;
pub(crate) mod traits;
pub mod types;

// Re-export public API
pub use connection::Callback;
pub use signal::Signal;
pub use slots::{HasSlots, Slots};
pub use types::SignalStats;

pub(crate) use signal::SignalInner;
