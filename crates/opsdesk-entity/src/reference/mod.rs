//! Reference collections: teams, service profiles, salespeople.

pub mod model;

pub use model::{Profile, Salesperson, Team};
