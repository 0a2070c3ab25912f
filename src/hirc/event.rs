// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Read, Seek, Write};

use binrw::{BinReaderExt, BinWriterExt};

use crate::error::Error;
use crate::section::read_bytes;
use crate::ByteBuffer;

/// A named entry point the game triggers, fanning out to a list of actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: u32,
    /// Ids of the actions this event fires, in order.
    pub actions: Vec<u32>,
    /// Bytes beyond the modeled fields, echoed back on save.
    pub unhandled: ByteBuffer,
}

impl Event {
    pub(crate) fn read<R: Read + Seek>(
        reader: &mut R,
        id: u32,
        budget: usize,
    ) -> Result<Event, Error> {
        let start = reader.stream_position()?;

        let num_actions = reader.read_le::<u32>()?;
        let mut actions = Vec::new();
        for _ in 0..num_actions {
            actions.push(reader.read_le::<u32>()?);
        }

        let consumed = (reader.stream_position()? - start) as usize;
        let leftover = budget.checked_sub(consumed).ok_or(Error::Malformed {
            context: format!("event object {id}"),
        })?;
        let unhandled = read_bytes(reader, leftover)?;

        Ok(Event {
            id,
            actions,
            unhandled,
        })
    }

    pub(crate) fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_le(&(self.actions.len() as u32))?;
        for action in &self.actions {
            writer.write_le(action)?;
        }

        writer.write_all(&self.unhandled)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn round_trip() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&452547817u32.to_le_bytes());
        bytes.extend_from_slice(&2932040671u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2]);

        let event = Event::read(&mut Cursor::new(bytes.as_slice()), 4, bytes.len()).unwrap();

        assert_eq!(event.actions, vec![452547817, 2932040671]);
        assert_eq!(event.unhandled, vec![1, 2]);

        let mut buffer = ByteBuffer::new();
        let mut cursor = Cursor::new(&mut buffer);
        event.write(&mut cursor).unwrap();

        assert_eq!(buffer, bytes);
    }
}
