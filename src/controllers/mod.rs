pub mod generate;

pub use generate::{Confirmation, GenerateController, GenerateOptions, GenerateOutcome, StdinConfirmation};
