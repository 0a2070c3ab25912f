// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, SeekFrom};

use binrw::{binrw, BinReaderExt};
use tracing::debug;

use crate::dialect::BankDialect;
use crate::error::Error;
use crate::hirc::HierarchySection;
use crate::stream::StreamInfo;
use crate::{ByteBuffer, ByteSpan};

/// Tag of the header section, which leads every bank.
pub const HEADER_TAG: [u8; 4] = *b"BKHD";
/// Tag of the stream index section.
pub const STREAM_INDEX_TAG: [u8; 4] = *b"DIDX";
/// Tag of the stream data section.
pub const STREAM_DATA_TAG: [u8; 4] = *b"DATA";
/// Tag of the object hierarchy section.
pub const HIERARCHY_TAG: [u8; 4] = *b"HIRC";
/// Tag of the name table section.
pub const NAME_TABLE_TAG: [u8; 4] = *b"STID";

/// One stream index entry: where a stream's payload lives inside the data section.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StreamIndexEntry {
    pub id: u32,
    pub offset: u32,
    pub length: u32,
}

/// A top-level record in a soundbank file.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// The 4-byte ASCII tag this section is stored under.
    pub tag: [u8; 4],
    /// Where the payload begins in the file, recorded at decode time and again on
    /// every save. Cross-references into a section are relative to this.
    pub payload_start: u64,
    pub body: SectionBody,
}

/// Section payloads the crate understands, with a verbatim fallback for the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    /// The bank header. The payload beyond the two leading fields is not modeled and
    /// is echoed back verbatim.
    Header {
        generator_version: u32,
        id: u32,
        data: ByteBuffer,
    },
    /// The stream index. Its entries are derived from the bank's stream list on save.
    StreamIndex,
    /// The concatenated stream payloads. Rebuilt from the stream list on save.
    StreamData,
    /// The object hierarchy.
    Hierarchy(HierarchySection),
    /// Bank-id to name mappings, kept for display. The payload is echoed verbatim.
    NameTable {
        mapping_type: u32,
        names: BTreeMap<u32, String>,
        data: ByteBuffer,
    },
    /// A tag the crate does not model.
    Raw(ByteBuffer),
}

impl Section {
    /// Reads the section at the cursor, dispatching on its tag. The sub-decoder must
    /// consume exactly the declared payload length, which is the primary detector for
    /// structurally corrupt containers.
    pub(crate) fn read(
        cursor: &mut Cursor<ByteSpan>,
        streams: &mut Vec<StreamInfo>,
        dialect: &BankDialect,
    ) -> Result<Section, Error> {
        let mut tag = [0u8; 4];
        cursor.read_exact(&mut tag)?;

        let length = cursor.read_le::<i32>()?;
        if length < 0 {
            return Err(Error::Malformed {
                context: tag_name(&tag),
            });
        }
        let length = length as usize;
        let payload_start = cursor.position();

        let body = match tag {
            HEADER_TAG => read_header(cursor, length)?,
            STREAM_INDEX_TAG => read_stream_index(cursor, length, streams)?,
            STREAM_DATA_TAG => read_stream_data(cursor, payload_start, streams)?,
            HIERARCHY_TAG => {
                SectionBody::Hierarchy(HierarchySection::read(cursor, streams, dialect)?)
            }
            NAME_TABLE_TAG => read_name_table(cursor, length)?,
            _ => {
                debug!(tag = %tag_name(&tag), "Passing unrecognized section through");
                SectionBody::Raw(read_bytes(cursor, length)?)
            }
        };

        if cursor.position() != payload_start + length as u64 {
            return Err(Error::Malformed {
                context: tag_name(&tag),
            });
        }

        Ok(Section {
            tag,
            payload_start,
            body,
        })
    }
}

fn read_header(cursor: &mut Cursor<ByteSpan>, length: usize) -> Result<SectionBody, Error> {
    let data = read_bytes(cursor, length)?;

    let mut fields = Cursor::new(data.as_slice());
    let generator_version = fields.read_le::<u32>()?;
    let id = fields.read_le::<u32>()?;

    Ok(SectionBody::Header {
        generator_version,
        id,
        data,
    })
}

fn read_stream_index(
    cursor: &mut Cursor<ByteSpan>,
    length: usize,
    streams: &mut Vec<StreamInfo>,
) -> Result<SectionBody, Error> {
    for _ in 0..length / 12 {
        let entry = cursor.read_le::<StreamIndexEntry>()?;
        streams.push(StreamInfo::new(entry.id, entry.offset, entry.length as usize));
    }

    Ok(SectionBody::StreamIndex)
}

// Fills the payloads of the streams the index pass created. Entries are visited in
// list order, seeking to each one's declared offset.
fn read_stream_data(
    cursor: &mut Cursor<ByteSpan>,
    payload_start: u64,
    streams: &mut [StreamInfo],
) -> Result<SectionBody, Error> {
    for info in streams.iter_mut() {
        cursor.seek(SeekFrom::Start(payload_start + u64::from(info.offset)))?;
        cursor.read_exact(&mut info.data)?;
    }

    Ok(SectionBody::StreamData)
}

fn read_name_table(cursor: &mut Cursor<ByteSpan>, length: usize) -> Result<SectionBody, Error> {
    let data = read_bytes(cursor, length)?;

    let mut fields = Cursor::new(data.as_slice());
    let mapping_type = fields.read_le::<u32>()?;
    let count = fields.read_le::<u32>()?;

    let mut names = BTreeMap::new();
    for _ in 0..count {
        let id = fields.read_le::<u32>()?;
        let name_length = fields.read_le::<u8>()?;
        let name = read_bytes(&mut fields, name_length as usize)?;
        names.insert(id, String::from_utf8_lossy(&name).into_owned());
    }

    Ok(SectionBody::NameTable {
        mapping_type,
        names,
        data,
    })
}

pub(crate) fn tag_name(tag: &[u8; 4]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

pub(crate) fn read_bytes<R: Read>(reader: &mut R, length: usize) -> Result<ByteBuffer, Error> {
    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section_bytes(tag: &[u8; 4], payload: &[u8]) -> ByteBuffer {
        let mut bytes = tag.to_vec();
        bytes.extend_from_slice(&(payload.len() as i32).to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn header_fields() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&134u32.to_le_bytes());
        payload.extend_from_slice(&12345u32.to_le_bytes());
        payload.extend_from_slice(&[0; 8]);
        let bytes = section_bytes(&HEADER_TAG, &payload);

        let mut streams = Vec::new();
        let section = Section::read(
            &mut Cursor::new(bytes.as_slice()),
            &mut streams,
            &BankDialect::default(),
        )
        .unwrap();

        assert_eq!(section.payload_start, 8);
        match section.body {
            SectionBody::Header {
                generator_version,
                id,
                data,
            } => {
                assert_eq!(generator_version, 134);
                assert_eq!(id, 12345);
                assert_eq!(data, payload);
            }
            body => panic!("expected a header, got {body:?}"),
        }
    }

    #[test]
    fn stream_index_entries() {
        let mut payload = Vec::new();
        for (id, offset, length) in [(10u32, 0u32, 5u32), (20, 16, 20)] {
            payload.extend_from_slice(&id.to_le_bytes());
            payload.extend_from_slice(&offset.to_le_bytes());
            payload.extend_from_slice(&length.to_le_bytes());
        }
        let bytes = section_bytes(&STREAM_INDEX_TAG, &payload);

        let mut streams = Vec::new();
        Section::read(
            &mut Cursor::new(bytes.as_slice()),
            &mut streams,
            &BankDialect::default(),
        )
        .unwrap();

        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].id, 10);
        assert_eq!(streams[1].offset, 16);
        assert_eq!(streams[1].data.len(), 20);
    }

    #[test]
    fn uneven_index_is_malformed() {
        let bytes = section_bytes(&STREAM_INDEX_TAG, &[0; 10]);

        let mut streams = Vec::new();
        let result = Section::read(
            &mut Cursor::new(bytes.as_slice()),
            &mut streams,
            &BankDialect::default(),
        );

        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn name_table_entries() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(&12345u32.to_le_bytes());
        payload.push(4);
        payload.extend_from_slice(b"test");
        let bytes = section_bytes(&NAME_TABLE_TAG, &payload);

        let mut streams = Vec::new();
        let section = Section::read(
            &mut Cursor::new(bytes.as_slice()),
            &mut streams,
            &BankDialect::default(),
        )
        .unwrap();

        match section.body {
            SectionBody::NameTable { names, .. } => {
                assert_eq!(names[&12345], "test");
            }
            body => panic!("expected a name table, got {body:?}"),
        }
    }

    #[test]
    fn unknown_sections_pass_through() {
        let bytes = section_bytes(b"XYZA", &[9, 8, 7]);

        let mut streams = Vec::new();
        let section = Section::read(
            &mut Cursor::new(bytes.as_slice()),
            &mut streams,
            &BankDialect::default(),
        )
        .unwrap();

        assert_eq!(section.tag, *b"XYZA");
        assert_eq!(section.body, SectionBody::Raw(vec![9, 8, 7]));
    }

    #[test]
    fn truncated_section_fails() {
        let mut bytes = section_bytes(b"XYZA", &[9, 8, 7]);
        bytes.truncate(9);

        let mut streams = Vec::new();
        let result = Section::read(
            &mut Cursor::new(bytes.as_slice()),
            &mut streams,
            &BankDialect::default(),
        );

        assert!(matches!(result, Err(Error::Truncated)));
    }
}
