#![no_std]

extern crate alloc;

pub use config::*;
pub use engine::*;
pub use entity::*;
pub use error::*;
pub use event::*;
pub use generator::*;
pub use grid::*;
pub use session::*;
pub use snapshot::*;
pub use types::*;
pub use world::*;

mod config;
mod engine;
mod entity;
mod error;
mod event;
mod generator;
mod grid;
mod session;
mod snapshot;
mod types;
mod world;
