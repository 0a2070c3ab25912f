// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// An error that occurred while reading or writing a soundbank.
#[derive(Debug)]
pub enum Error {
    /// A section or object consumed a different number of bytes than its own header declared.
    Malformed {
        /// The structure the mismatch was detected in.
        context: String,
    },
    /// The byte source ended in the middle of a structure.
    Truncated,
    /// An underlying I/O operation failed.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Malformed { context } => write!(f, "soundbank data is malformed: {context}"),
            Error::Truncated => write!(f, "soundbank data ended unexpectedly"),
            Error::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Truncated
        } else {
            Error::Io(err)
        }
    }
}

impl From<binrw::Error> for Error {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(err) => Error::from(err),
            err => Error::Malformed {
                context: err.to_string(),
            },
        }
    }
}
