//! Utility functions and types

pub mod data_loader;

pub use data_loader::{frame_from_columns, save_csv, DataLoader};
