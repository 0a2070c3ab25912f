// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// Represents a continuous block of memory which is not owned, and comes from an external source.
pub type ByteSpan<'a> = &'a [u8];

/// Represents a continuous block of memory which is owned.
pub type ByteBuffer = Vec<u8>;

/// Reading and writing whole soundbank files.
pub mod soundbank;

/// The tagged, length-prefixed sections a soundbank is made of.
pub mod section;

/// Embedded audio streams and their layout inside the data section.
pub mod stream;

/// Reading and writing the object hierarchy (HIRC) section.
pub mod hirc;

/// Format quirks that vary between engine releases.
pub mod dialect;

/// Recovering original names from the hashed ids stored in a bank.
pub mod dehash;

/// Error types shared by the codec entry points.
pub mod error;
