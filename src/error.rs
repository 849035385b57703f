use thiserror::Error;

/// Errors reported while configuring transform interpolation.
///
/// None of these are produced on the per-frame path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LerpError {
    /// A property name other than `position`, `rotation` or `scale`.
    #[error("unknown lerp property `{0}`, expected one of position, rotation, scale")]
    UnknownProperty(String),
    /// The host app has no clock to drive interpolation.
    #[error("LerpPlugin requires the `Time` resource, add `TimePlugin` or `MinimalPlugins`")]
    MissingTime,
}
