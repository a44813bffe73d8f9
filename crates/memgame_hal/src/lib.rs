//! Hardware boundary of the memory game.
//!
//! `traits` holds the `DaqBackend` contract every board implements,
//! `config` the channel and address layout, and `sim` an in-memory board
//! used by tests and the self-playing demo.

pub mod config;
pub mod sim;
pub mod traits;
