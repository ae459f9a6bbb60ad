//! Types needed in multiple modules

/// Kinds of fixed-capacity tables held by the ensemble configuration
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub enum TableKind {
    /// Services of the ensemble
    Services,
    /// Service components of a configuration
    Components,
    /// Sub-channels of a configuration
    SubChannels,
    /// Announcement clusters of a configuration
    Clusters,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TableKind::Services => "service",
            TableKind::Components => "service component",
            TableKind::SubChannels => "sub-channel",
            TableKind::Clusters => "cluster",
        };
        write!(f, "{name}")
    }
}

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// Invalid combination of protection profile, level and bit rate
    #[error("Invalid protection: {0}")]
    InvalidProtection(String),
    /// Field polynomial is not primitive
    #[error("Polynomial {0:#x} is not primitive")]
    InvalidGaloisPolynomial(u32),
    /// Fixed-capacity table is full
    #[error("All {capacity} {kind} slots are in use")]
    CapacityExceeded {
        /// Table that overflowed
        kind: TableKind,
        /// Capacity of the table
        capacity: usize,
    },
    /// Reed-Solomon codeword has more errors than can be corrected
    #[error("Uncorrectable Reed-Solomon codeword")]
    Uncorrectable,
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
    /// Unknown error
    #[error("Unknown error")]
    Unknown,
}
