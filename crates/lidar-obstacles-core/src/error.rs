/// Invalid pipeline configuration.
///
/// Raised before any point is processed and never recovered internally.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be finite and > 0 (got {value})")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} must be finite and >= 0 (got {value})")]
    Negative { name: &'static str, value: f32 },
    #[error("{name} must be at least 1")]
    Zero { name: &'static str },
    #[error("{name} has non-finite bounds")]
    NonFiniteBounds { name: &'static str },
    #[error("{name} bounds are inverted on {axis}: min {min} > max {max}")]
    InvertedBounds {
        name: &'static str,
        axis: char,
        min: f32,
        max: f32,
    },
    #[error("cluster size range is inverted: min_size {min} > max_size {max}")]
    InvertedSizeRange { min: usize, max: usize },
}

/// Require `value` to be finite and strictly positive.
pub fn require_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// Require `value` to be finite and not negative.
pub fn require_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}
