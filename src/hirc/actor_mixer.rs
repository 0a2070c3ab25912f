// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Read, Seek, Write};

use crate::error::Error;
use crate::hirc::node_params::NodeBaseParams;
use crate::section::read_bytes;
use crate::ByteBuffer;

/// A grouping node that applies shared parameters to the nodes below it. Everything
/// after the parameter block, including the child list, rides along verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorMixer {
    pub id: u32,
    pub params: NodeBaseParams,
    /// Bytes beyond the modeled fields, echoed back on save.
    pub unhandled: ByteBuffer,
}

impl ActorMixer {
    pub(crate) fn read<R: Read + Seek>(
        reader: &mut R,
        id: u32,
        budget: usize,
    ) -> Result<ActorMixer, Error> {
        let start = reader.stream_position()?;

        let params = NodeBaseParams::read(reader)?;

        let consumed = (reader.stream_position()? - start) as usize;
        let leftover = budget.checked_sub(consumed).ok_or(Error::Malformed {
            context: format!("actor mixer object {id}"),
        })?;
        let unhandled = read_bytes(reader, leftover)?;

        Ok(ActorMixer {
            id,
            params,
            unhandled,
        })
    }

    pub(crate) fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<(), Error> {
        self.params.write(writer)?;
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
        let mut bytes = ByteBuffer::new();
        {
            let mut cursor = Cursor::new(&mut bytes);
            let mut params = NodeBaseParams::default();
            params.parent_id = 42;
            params.write(&mut cursor).unwrap();
        }
        // child list, carried as opaque bytes
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&1234u32.to_le_bytes());

        let mixer = ActorMixer::read(&mut Cursor::new(bytes.as_slice()), 7, bytes.len()).unwrap();

        assert_eq!(mixer.params.parent_id, 42);
        assert_eq!(mixer.unhandled.len(), 8);

        let mut buffer = ByteBuffer::new();
        let mut cursor = Cursor::new(&mut buffer);
        mixer.write(&mut cursor).unwrap();

        assert_eq!(buffer, bytes);
    }
}
