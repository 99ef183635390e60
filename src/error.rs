/// Errors reported by the SN76489 driver.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A control pin index is outside 0..=7, or two control lines share a bit.
    #[error("invalid control pin configuration")]
    InvalidConfiguration,

    /// READY stayed low for the whole poll budget of [`ReadyWait::Polls`].
    ///
    /// [`ReadyWait::Polls`]: crate::ReadyWait::Polls
    #[error("chip did not assert READY")]
    HardwareTimeout,
}

/// Result type for driver operations
pub type Result<T> = core::result::Result<T, Error>;
