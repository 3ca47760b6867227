// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("the value {value} is out of range for the {group} group")]
    OutOfRange { group: GroupKind, value: String },
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("bad access: {0}")]
    BadAccess(String),
    #[error("the context was built for manifest {expected} but the internal manifest hashes to {actual}")]
    ManifestHashMismatch { expected: String, actual: String },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("an internal error that should never have happened and signifies a bug")]
    InternalError,
}

/// The two groups every element of the engine lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    ModP,
    ModQ,
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::ModP => write!(f, "mod p"),
            GroupKind::ModQ => write!(f, "mod q"),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bson::ser::Error> for Error {
    fn from(err: bson::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bson::de::Error> for Error {
    fn from(err: bson::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
