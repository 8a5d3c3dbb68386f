// src/recipes/mod.rs

//! Built-in recipe catalog

pub mod base;
mod pv;
mod zlib;

pub use pv::Pv;
pub use zlib::Zlib;

use crate::recipe::Registry;

/// Registry holding every built-in recipe
pub fn builtin() -> Registry {
    let mut registry = Registry::new();
    registry.register(Zlib);
    registry.register(Pv);
    registry
}
