use thiserror::Error;

/// Contract violations raised by the simulation engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An input was outside the range the recurrence is defined for.
    #[error("invalid {name}: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },

    /// Run-to-depletion mode hit its iteration cap with a positive balance.
    #[error("balance still positive after {limit} years; growth covers the withdrawal")]
    MaxIterationsExceeded { limit: u32 },

    /// The recurrence overflowed `f64`; reported with the first year affected.
    #[error("balance is no longer a finite number by year {year}; the inputs overflow")]
    NonFiniteBalance { year: u32 },
}
