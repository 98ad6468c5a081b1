pub mod client;
pub mod dto;

pub use client::{FetchError, IndicatorClient};
pub use dto::{Indicator, Reading};
