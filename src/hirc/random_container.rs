// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Read, Seek, SeekFrom, Write};

use binrw::{binrw, BinReaderExt, BinWriterExt};
use tracing::warn;

use crate::error::Error;
use crate::hirc::node_params::NodeBaseParams;
use crate::section::read_bytes;
use crate::ByteBuffer;

/// One playlist entry: a child id and its order in the sequence.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub id: u32,
    pub order: i32,
}

/// A container that plays its children at random or in sequence.
///
/// Some historical banks store a container shape this decoder does not understand.
/// Those are detected by an impossible child count, flagged as `malformed`, and their
/// remaining bytes are carried through untouched instead of being reinterpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomSequenceContainer {
    pub id: u32,
    pub params: NodeBaseParams,
    pub loop_count: u16,
    pub loop_mod_min: u16,
    pub loop_mod_max: u16,
    pub transition_time: f32,
    pub transition_time_mod_min: f32,
    pub transition_time_mod_max: f32,
    pub avoid_repeat_count: u16,
    pub transition_mode: u8,
    pub random_mode: u8,
    /// 0 plays at random, 1 plays in sequence.
    pub mode: u8,
    pub unhandled_settings: [u8; 5],
    pub children: Vec<u32>,
    pub playlist: Vec<PlaylistItem>,
    /// Set when the child list did not fit the record. The children and playlist are
    /// left empty and every remaining byte, child count included, sits in `unhandled`.
    pub malformed: bool,
    /// Bytes beyond the modeled fields, echoed back on save.
    pub unhandled: ByteBuffer,
}

impl RandomSequenceContainer {
    pub(crate) fn read<R: Read + Seek>(
        reader: &mut R,
        id: u32,
        budget: usize,
    ) -> Result<RandomSequenceContainer, Error> {
        let start = reader.stream_position()?;

        let params = NodeBaseParams::read(reader)?;

        let loop_count = reader.read_le::<u16>()?;
        let loop_mod_min = reader.read_le::<u16>()?;
        let loop_mod_max = reader.read_le::<u16>()?;
        let transition_time = reader.read_le::<f32>()?;
        let transition_time_mod_min = reader.read_le::<f32>()?;
        let transition_time_mod_max = reader.read_le::<f32>()?;
        let avoid_repeat_count = reader.read_le::<u16>()?;
        let transition_mode = reader.read_le::<u8>()?;
        let random_mode = reader.read_le::<u8>()?;
        let mode = reader.read_le::<u8>()?;

        let mut unhandled_settings = [0u8; 5];
        reader.read_exact(&mut unhandled_settings)?;

        let num_children = reader.read_le::<u32>()?;

        let consumed = (reader.stream_position()? - start) as usize;
        let bytes_left = budget.checked_sub(consumed).ok_or(Error::Malformed {
            context: format!("container object {id}"),
        })?;

        let mut children = Vec::new();
        let mut playlist = Vec::new();
        let malformed = u64::from(num_children) * 4 > bytes_left as u64;
        if malformed {
            warn!(id, num_children, bytes_left, "Impossible child count, keeping container opaque");
            // keep the count bytes so the record re-encodes exactly as it was stored
            reader.seek(SeekFrom::Current(-4))?;
        } else {
            for _ in 0..num_children {
                children.push(reader.read_le::<u32>()?);
            }

            let num_playlist_items = reader.read_le::<u16>()?;
            for _ in 0..num_playlist_items {
                playlist.push(reader.read_le::<PlaylistItem>()?);
            }
        }

        let consumed = (reader.stream_position()? - start) as usize;
        let leftover = budget.checked_sub(consumed).ok_or(Error::Malformed {
            context: format!("container object {id}"),
        })?;
        let unhandled = read_bytes(reader, leftover)?;

        Ok(RandomSequenceContainer {
            id,
            params,
            loop_count,
            loop_mod_min,
            loop_mod_max,
            transition_time,
            transition_time_mod_min,
            transition_time_mod_max,
            avoid_repeat_count,
            transition_mode,
            random_mode,
            mode,
            unhandled_settings,
            children,
            playlist,
            malformed,
            unhandled,
        })
    }

    pub(crate) fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<(), Error> {
        self.params.write(writer)?;

        writer.write_le(&self.loop_count)?;
        writer.write_le(&self.loop_mod_min)?;
        writer.write_le(&self.loop_mod_max)?;
        writer.write_le(&self.transition_time)?;
        writer.write_le(&self.transition_time_mod_min)?;
        writer.write_le(&self.transition_time_mod_max)?;
        writer.write_le(&self.avoid_repeat_count)?;
        writer.write_le(&self.transition_mode)?;
        writer.write_le(&self.random_mode)?;
        writer.write_le(&self.mode)?;

        writer.write_all(&self.unhandled_settings)?;

        if !self.malformed {
            writer.write_le(&(self.children.len() as u32))?;
            for child in &self.children {
                writer.write_le(child)?;
            }

            writer.write_le(&(self.playlist.len() as u16))?;
            for item in &self.playlist {
                writer.write_le(item)?;
            }
        }

        writer.write_all(&self.unhandled)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn fixed_fields() -> ByteBuffer {
        let mut bytes = ByteBuffer::new();
        {
            let mut cursor = Cursor::new(&mut bytes);
            NodeBaseParams::default().write(&mut cursor).unwrap();
            cursor.write_le(&2u16).unwrap(); // loop count
            cursor.write_le(&0u16).unwrap();
            cursor.write_le(&0u16).unwrap();
            cursor.write_le(&500.0f32).unwrap(); // transition time
            cursor.write_le(&0.0f32).unwrap();
            cursor.write_le(&0.0f32).unwrap();
            cursor.write_le(&1u16).unwrap(); // avoid repeat count
            cursor.write_le(&0u8).unwrap();
            cursor.write_le(&0u8).unwrap();
            cursor.write_le(&1u8).unwrap(); // sequence mode
            cursor.write_all(&[0; 5]).unwrap();
        }
        bytes
    }

    #[test]
    fn round_trip() {
        let mut bytes = fixed_fields();
        {
            let mut cursor = Cursor::new(&mut bytes);
            cursor.seek(SeekFrom::End(0)).unwrap();
            cursor.write_le(&2u32).unwrap(); // children
            cursor.write_le(&100u32).unwrap();
            cursor.write_le(&200u32).unwrap();
            cursor.write_le(&2u16).unwrap(); // playlist
            cursor
                .write_le(&PlaylistItem { id: 100, order: 0 })
                .unwrap();
            cursor
                .write_le(&PlaylistItem { id: 200, order: 1 })
                .unwrap();
        }

        let container =
            RandomSequenceContainer::read(&mut Cursor::new(bytes.as_slice()), 5, bytes.len())
                .unwrap();

        assert!(!container.malformed);
        assert_eq!(container.children, vec![100, 200]);
        assert_eq!(container.playlist.len(), 2);
        assert_eq!(container.loop_count, 2);

        let mut buffer = ByteBuffer::new();
        let mut cursor = Cursor::new(&mut buffer);
        container.write(&mut cursor).unwrap();

        assert_eq!(buffer, bytes);
    }

    #[test]
    fn impossible_child_count_is_contained() {
        let mut bytes = fixed_fields();
        {
            let mut cursor = Cursor::new(&mut bytes);
            cursor.seek(SeekFrom::End(0)).unwrap();
            cursor.write_le(&1000u32).unwrap(); // far more children than bytes
            cursor.write_all(&[0xAB, 0xCD, 0xEF]).unwrap();
        }

        let container =
            RandomSequenceContainer::read(&mut Cursor::new(bytes.as_slice()), 5, bytes.len())
                .unwrap();

        assert!(container.malformed);
        assert!(container.children.is_empty());
        assert!(container.playlist.is_empty());
        // the count bytes and everything after them survive
        assert_eq!(container.unhandled.len(), 7);

        let mut buffer = ByteBuffer::new();
        let mut cursor = Cursor::new(&mut buffer);
        container.write(&mut cursor).unwrap();

        assert_eq!(buffer, bytes);
    }
}
