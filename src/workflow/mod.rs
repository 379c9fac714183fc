pub mod controller;

pub use controller::{GenerateOutcome, GenerateSource, SessionController};
