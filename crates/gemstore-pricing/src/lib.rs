pub mod carat_options;
pub mod client;
pub mod controller;
pub mod display;
pub mod error;
pub mod formula;
pub mod parse;
mod retry;

pub use carat_options::{derive, CaratOptionSet};
pub use client::{HttpPriceClient, PriceLookup, PriceRequest};
pub use controller::{ControllerSettings, PriceController, PriceSnapshot, ResolutionState};
pub use display::{DisplayAnimator, DisplayFrame};
pub use error::PricingError;
pub use formula::FallbackFormula;
pub use parse::PriceResponseParser;
