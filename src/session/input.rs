use thiserror::Error;

use super::steps::{Answer, StepKind};

pub const MAX_AMOUNT: f64 = 1e12;
pub const MAX_COUNT: i64 = 1_000_000;

/// Navigation typed in place of a value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Control {
    Exit,
    Clear,
    Back,
    Previous,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Entry {
    Control(Control),
    Value(Answer),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid number. Use digits only.")]
    NotANumber,
    #[error("Value too low. Try again.")]
    TooLow,
    #[error("Value too large. Try again.")]
    TooLarge,
}

pub fn parse_control(raw: &str) -> Option<Control> {
    match raw.trim().to_lowercase().as_str() {
        "e" => Some(Control::Exit),
        "c" => Some(Control::Clear),
        "b" => Some(Control::Back),
        "p" => Some(Control::Previous),
        _ => None,
    }
}

pub fn parse_entry(raw: &str, kind: StepKind) -> Result<Entry, InputError> {
    if let Some(control) = parse_control(raw) {
        return Ok(Entry::Control(control));
    }

    let cleaned = raw.trim().replace(',', "");
    match kind {
        StepKind::Amount { min } => {
            let value = cleaned
                .parse::<f64>()
                .map_err(|_| InputError::NotANumber)?;
            if !value.is_finite() {
                return Err(InputError::NotANumber);
            }
            if min.is_some_and(|min| value < min) {
                return Err(InputError::TooLow);
            }
            if value > MAX_AMOUNT {
                return Err(InputError::TooLarge);
            }
            Ok(Entry::Value(Answer::Amount(value)))
        }
        StepKind::Count { min } => {
            let value = cleaned
                .parse::<i64>()
                .map_err(|_| InputError::NotANumber)?;
            if value < min {
                return Err(InputError::TooLow);
            }
            if value > MAX_COUNT {
                return Err(InputError::TooLarge);
            }
            let value = u32::try_from(value).map_err(|_| InputError::TooLow)?;
            Ok(Entry::Value(Answer::Count(value)))
        }
    }
}
