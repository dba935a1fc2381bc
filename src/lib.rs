//! Layered tile world library
//!
//! Packed tile records, persistent five-layer worlds with a validated editing
//! API, and map dump rendering.

pub mod codec;
pub mod config;
pub mod dump;
pub mod error;
pub mod grid;
pub mod palette;
pub mod store;
pub mod tiles;
pub mod world;

pub use codec::Cell;
pub use config::{DumpConfig, DumpMode};
pub use dump::DumpRenderer;
pub use error::{ConfigError, GridError, WorldError};
pub use palette::{DefaultPalette, Palette};
pub use tiles::TileType;
pub use world::{Layer, World, WorldModel};
