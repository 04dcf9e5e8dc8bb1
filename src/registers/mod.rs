//! Register definitions for the SX127x family
//! Taken from the SX1276/77/78/79 datasheet rev. 7 and errata note

mod common;
mod field;
pub mod lora;

pub use common::*;
pub use field::*;
