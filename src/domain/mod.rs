//! Domain layer: stores, manifests and backend state

pub mod entities;
pub mod value_objects;
