//! Store selection at startup

mod factory;

pub use factory::{StoreBackend, StoreFactory, Stores};
