// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Read, Seek, Write};

use binrw::{BinReaderExt, BinWriterExt};
use tracing::warn;

use crate::dialect::BankDialect;
use crate::error::Error;
use crate::hirc::node_params::NodeBaseParams;
use crate::section::read_bytes;
use crate::stream::StreamInfo;
use crate::ByteBuffer;

/// How a sound's audio payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    /// The payload lives in this bank's data section.
    Embedded,
    /// The payload is streamed from a separate file at runtime.
    Streamed,
    /// The start of the payload is embedded so playback begins before streaming
    /// catches up.
    Prefetch,
    /// A storage kind the crate does not know about.
    Unknown(u32),
}

impl StreamType {
    pub(crate) fn from_raw(raw: u32) -> StreamType {
        match raw {
            0 => StreamType::Embedded,
            1 => StreamType::Streamed,
            2 => StreamType::Prefetch,
            raw => StreamType::Unknown(raw),
        }
    }

    pub(crate) fn to_raw(self) -> u32 {
        match self {
            StreamType::Embedded => 0,
            StreamType::Streamed => 1,
            StreamType::Prefetch => 2,
            StreamType::Unknown(raw) => raw,
        }
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StreamType::Embedded => write!(f, "Embedded"),
            StreamType::Streamed => write!(f, "Streamed"),
            StreamType::Prefetch => write!(f, "Prefetch"),
            StreamType::Unknown(raw) => write!(f, "Unknown (0x{raw:02x})"),
        }
    }
}

/// A playable sound tied to an audio source.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    pub id: u32,
    pub plugin_id: u32,
    pub stream_type: StreamType,
    /// Id of the audio stream this sound plays.
    pub source_id: u32,
    pub file_id: u32,
    /// Absolute byte offset of the payload inside the bank file. Rewritten on save for
    /// embedded sounds with a matching stream; left at its decoded value otherwise.
    pub file_offset: u32,
    /// Length of the payload in bytes. Rewritten on save alongside `file_offset`.
    pub file_size: u32,
    /// 0 for sound effects, 1 for voice.
    pub source_bits: u8,
    /// Extra size field, present only when the dialect's gate applies to `plugin_id`.
    pub source_size: Option<u32>,
    pub params: NodeBaseParams,
    /// Bytes beyond the modeled fields, echoed back on save.
    pub unhandled: ByteBuffer,
}

impl Sound {
    pub(crate) fn read<R: Read + Seek>(
        reader: &mut R,
        id: u32,
        budget: usize,
        streams: &mut [StreamInfo],
        dialect: &BankDialect,
    ) -> Result<Sound, Error> {
        let start = reader.stream_position()?;

        let plugin_id = reader.read_le::<u32>()?;
        let stream_type = StreamType::from_raw(reader.read_le::<u32>()?);
        let source_id = reader.read_le::<u32>()?;
        let file_id = reader.read_le::<u32>()?;

        let mut file_offset = 0;
        let mut file_size = 0;
        if stream_type != StreamType::Streamed {
            file_offset = reader.read_le::<u32>()?;
            file_size = reader.read_le::<u32>()?;

            if stream_type == StreamType::Embedded {
                match streams.iter_mut().find(|info| info.id == source_id) {
                    Some(info) => info.has_references = true,
                    None => warn!(id, source_id, "Sound references a stream this bank does not embed"),
                }
            }
        }

        let source_bits = reader.read_le::<u8>()?;

        let source_size = if dialect.source_size_gate.applies(plugin_id) {
            Some(reader.read_le::<u32>()?)
        } else {
            None
        };

        let params = NodeBaseParams::read(reader)?;

        let consumed = (reader.stream_position()? - start) as usize;
        let leftover = budget.checked_sub(consumed).ok_or(Error::Malformed {
            context: format!("sound object {id}"),
        })?;
        let unhandled = read_bytes(reader, leftover)?;

        Ok(Sound {
            id,
            plugin_id,
            stream_type,
            source_id,
            file_id,
            file_offset,
            file_size,
            source_bits,
            source_size,
            params,
            unhandled,
        })
    }

    /// Writes the sound, patching the payload location of embedded sources from the
    /// bank's current stream layout. `data_payload_start` is the absolute offset of
    /// the data section's payload.
    pub(crate) fn write<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        streams: &[StreamInfo],
        data_payload_start: u64,
    ) -> Result<(), Error> {
        writer.write_le(&self.plugin_id)?;
        writer.write_le(&self.stream_type.to_raw())?;
        writer.write_le(&self.source_id)?;
        writer.write_le(&self.file_id)?;

        if self.stream_type != StreamType::Streamed {
            if self.stream_type == StreamType::Embedded {
                // Resolved by id on every save, since the stream list may have been
                // edited since this object was decoded.
                if let Some(info) = streams.iter().find(|info| info.id == self.source_id) {
                    self.file_offset = (data_payload_start + u64::from(info.offset)) as u32;
                    self.file_size = info.data.len() as u32;
                }
            }

            writer.write_le(&self.file_offset)?;
            writer.write_le(&self.file_size)?;
        }

        writer.write_le(&self.source_bits)?;

        if let Some(source_size) = self.source_size {
            writer.write_le(&source_size)?;
        }

        self.params.write(writer)?;
        writer.write_all(&self.unhandled)?;

        Ok(())
    }
}
