// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};

use crate::ByteBuffer;

/// Stream payloads are aligned to this many bytes inside the data section.
pub const STREAM_ALIGNMENT: u32 = 16;

/// One audio stream embedded in a soundbank.
///
/// Streams are kept in on-disk index order, and the hierarchy refers to them by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// The id hierarchy objects use to refer to this stream.
    pub id: u32,
    /// Byte offset inside the data section. Only meaningful directly after a load or a
    /// save, since every save lays the streams out again.
    pub offset: u32,
    /// The raw audio payload.
    pub data: ByteBuffer,
    /// Whether any hierarchy object points at this stream.
    pub has_references: bool,
    /// The file the payload was last replaced from, if any.
    pub replacement_file: Option<PathBuf>,
}

impl StreamInfo {
    pub fn new(id: u32, offset: u32, length: usize) -> StreamInfo {
        StreamInfo {
            id,
            offset,
            data: vec![0; length],
            has_references: false,
            replacement_file: None,
        }
    }

    /// Replaces the audio payload, remembering where the new bytes came from.
    pub fn replace_data(&mut self, data: ByteBuffer, source: Option<PathBuf>) {
        self.data = data;
        self.replacement_file = source;
    }

    /// Writes the raw payload to a standalone file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        std::fs::write(path, &self.data)
    }
}

/// Assigns every stream a 16-byte-aligned offset in list order and returns the total
/// length of the resulting data payload. Offsets are a pure function of the current
/// list, so running this twice without edits changes nothing.
pub fn layout_streams(streams: &mut [StreamInfo]) -> u32 {
    let mut cursor = 0u32;
    for info in streams {
        if cursor % STREAM_ALIGNMENT != 0 {
            cursor += STREAM_ALIGNMENT - (cursor % STREAM_ALIGNMENT);
        }
        info.offset = cursor;
        cursor += info.data.len() as u32;
    }
    cursor
}
