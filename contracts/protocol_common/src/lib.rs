#![no_std]

pub mod access;
pub mod error;
pub mod events;
pub mod math;

pub use access::{AccessControl, Role};
pub use error::Error;
pub use math::{mul_div_floor, PERCENT_BASE, SCALE};
