/// Errors that can occur during station operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationError {
    /// Address or length exceeds store bounds.
    OutOfBounds,
    /// Operation attempted with zero length.
    ZeroLength,
    /// Fixed-capacity container is full.
    Full,
    /// UID text is not exactly 20 hex digits.
    InvalidUid,
    /// The peer stream refused a write.
    Socket,
}

impl core::fmt::Display for StationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StationError::OutOfBounds => write!(f, "address or length exceeds store bounds"),
            StationError::ZeroLength => write!(f, "operation attempted with zero length"),
            StationError::Full => write!(f, "container capacity exceeded"),
            StationError::InvalidUid => write!(f, "uid must be 20 hex digits"),
            StationError::Socket => write!(f, "peer stream refused write"),
        }
    }
}
