#![allow(dead_code)]

pub mod mock_items;
pub mod strategies;

pub use mock_items::*;
