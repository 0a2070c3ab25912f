// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use binrw::BinWriterExt;
use tracing::{debug, warn};

use crate::dialect::BankDialect;
use crate::error::Error;
use crate::hirc::HierarchySection;
use crate::section::{Section, SectionBody, StreamIndexEntry, STREAM_DATA_TAG};
use crate::stream::{layout_streams, StreamInfo};
use crate::{ByteBuffer, ByteSpan};

/// An opened soundbank: the ordered section list, the embedded streams, and the
/// sidecar notes callers attach to streams.
///
/// Loading and saving are single sequential passes. Nothing here is safe to share
/// between threads while an encode is in flight; callers serialize edits themselves.
#[derive(Debug, Default)]
pub struct SoundBank {
    /// Sections in on-disk order, which saving preserves.
    pub sections: Vec<Section>,
    /// Embedded streams in on-disk index order. The encoded layout depends on this
    /// order, not on id values.
    pub streams: Vec<StreamInfo>,
    /// Free-text notes attached to streams by id, stored in a sidecar file.
    pub notes: HashMap<u32, String>,
    /// Format quirks the bank was decoded with.
    pub dialect: BankDialect,
    /// Where the bank was loaded from, if it came from disk.
    pub path: Option<PathBuf>,
}

impl SoundBank {
    /// Parses an existing soundbank.
    pub fn from_existing(buffer: ByteSpan) -> Result<SoundBank, Error> {
        SoundBank::from_existing_with_dialect(buffer, BankDialect::default())
    }

    /// Parses an existing soundbank using explicit format quirks, for banks produced
    /// by engine releases the defaults don't fit.
    pub fn from_existing_with_dialect(
        buffer: ByteSpan,
        dialect: BankDialect,
    ) -> Result<SoundBank, Error> {
        let mut cursor = Cursor::new(buffer);
        let mut sections = Vec::new();
        let mut streams = Vec::new();

        while (cursor.position() as usize) < buffer.len() {
            sections.push(Section::read(&mut cursor, &mut streams, &dialect)?);
        }

        debug!(
            sections = sections.len(),
            streams = streams.len(),
            "Read soundbank"
        );

        Ok(SoundBank {
            sections,
            streams,
            notes: HashMap::new(),
            dialect,
            path: None,
        })
    }

    /// Reads a soundbank from a file, along with its notes sidecar if one exists.
    pub fn load(path: &Path) -> Result<SoundBank, Error> {
        SoundBank::load_with_dialect(path, BankDialect::default())
    }

    pub fn load_with_dialect(path: &Path, dialect: BankDialect) -> Result<SoundBank, Error> {
        let buffer = std::fs::read(path)?;

        let mut bank = SoundBank::from_existing_with_dialect(&buffer, dialect)?;
        bank.notes = load_notes(path);
        bank.path = Some(path.to_owned());

        Ok(bank)
    }

    /// Serializes the bank back into a buffer.
    ///
    /// The stream layout is recomputed up front, since the index and data payloads
    /// must exist before any sound object encodes its payload location. Sections are
    /// then re-encoded in original order, refreshing each `payload_start` as the pass
    /// advances.
    pub fn write_to_buffer(&mut self) -> Result<ByteBuffer, Error> {
        let total_data_length = layout_streams(&mut self.streams);
        let index_payload = build_stream_index(&self.streams)?;
        let data_payload = build_stream_data(&self.streams, total_data_length);

        // until the data section is reached in this pass, cross-references fall back
        // to wherever its payload sat previously
        let mut data_payload_start = self
            .sections
            .iter()
            .find(|section| section.tag == STREAM_DATA_TAG)
            .map(|section| section.payload_start)
            .unwrap_or_default();

        let mut buffer = ByteBuffer::new();
        {
            let mut cursor = Cursor::new(&mut buffer);

            for section in &mut self.sections {
                let payload = match &mut section.body {
                    SectionBody::Header { data, .. } => data.clone(),
                    SectionBody::StreamIndex => index_payload.clone(),
                    SectionBody::StreamData => data_payload.clone(),
                    SectionBody::NameTable { data, .. } => data.clone(),
                    SectionBody::Raw(data) => data.clone(),
                    SectionBody::Hierarchy(hierarchy) => {
                        let mut payload = ByteBuffer::new();
                        {
                            let mut payload_cursor = Cursor::new(&mut payload);
                            hierarchy.write(
                                &mut payload_cursor,
                                &self.streams,
                                data_payload_start,
                            )?;
                        }
                        payload
                    }
                };

                cursor.write_all(&section.tag)?;
                cursor.write_le(&(payload.len() as i32))?;
                section.payload_start = cursor.position();
                if section.tag == STREAM_DATA_TAG {
                    data_payload_start = section.payload_start;
                }
                cursor.write_all(&payload)?;
            }
        }

        Ok(buffer)
    }

    /// Writes the bank to a file, along with its notes sidecar.
    pub fn save(&mut self, path: &Path) -> Result<(), Error> {
        let buffer = self.write_to_buffer()?;
        std::fs::write(path, buffer)?;
        self.save_notes(path)?;
        self.path = Some(path.to_owned());

        Ok(())
    }

    /// The version of the tool that generated this bank.
    pub fn generator_version(&self) -> Option<u32> {
        self.sections.iter().find_map(|section| match &section.body {
            SectionBody::Header {
                generator_version, ..
            } => Some(*generator_version),
            _ => None,
        })
    }

    /// The bank's own id.
    pub fn id(&self) -> Option<u32> {
        self.sections.iter().find_map(|section| match &section.body {
            SectionBody::Header { id, .. } => Some(*id),
            _ => None,
        })
    }

    /// The object hierarchy, if this bank has one.
    pub fn hierarchy(&self) -> Option<&HierarchySection> {
        self.sections.iter().find_map(|section| match &section.body {
            SectionBody::Hierarchy(hierarchy) => Some(hierarchy),
            _ => None,
        })
    }

    pub fn hierarchy_mut(&mut self) -> Option<&mut HierarchySection> {
        self.sections
            .iter_mut()
            .find_map(|section| match &mut section.body {
                SectionBody::Hierarchy(hierarchy) => Some(hierarchy),
                _ => None,
            })
    }

    /// Looks up a stream by id.
    pub fn stream(&self, id: u32) -> Option<&StreamInfo> {
        self.streams.iter().find(|info| info.id == id)
    }

    pub fn stream_mut(&mut self, id: u32) -> Option<&mut StreamInfo> {
        self.streams.iter_mut().find(|info| info.id == id)
    }

    /// The note attached to a stream, if any.
    pub fn note(&self, stream_id: u32) -> Option<&str> {
        self.notes.get(&stream_id).map(String::as_str)
    }

    /// Attaches a note to a stream. An empty note removes the entry.
    pub fn set_note(&mut self, stream_id: u32, note: &str) {
        if note.is_empty() {
            self.notes.remove(&stream_id);
        } else {
            self.notes.insert(stream_id, note.to_string());
        }
    }

    fn save_notes(&self, path: &Path) -> Result<(), Error> {
        if self.notes.is_empty() {
            return Ok(());
        }

        let contents = serde_json::to_string(&self.notes)
            .map_err(|err| Error::Io(err.into()))?;
        std::fs::write(notes_path(path), contents)?;

        Ok(())
    }
}

fn notes_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".notes.json");
    path.with_file_name(name)
}

fn load_notes(path: &Path) -> HashMap<u32, String> {
    let notes_path = notes_path(path);
    let Ok(contents) = std::fs::read(&notes_path) else {
        return HashMap::new();
    };

    match serde_json::from_slice(&contents) {
        Ok(notes) => notes,
        Err(err) => {
            warn!(path = %notes_path.display(), %err, "Ignoring unreadable notes sidecar");
            HashMap::new()
        }
    }
}

fn build_stream_index(streams: &[StreamInfo]) -> Result<ByteBuffer, Error> {
    let mut payload = ByteBuffer::new();
    {
        let mut cursor = Cursor::new(&mut payload);
        for info in streams {
            cursor.write_le(&StreamIndexEntry {
                id: info.id,
                offset: info.offset,
                length: info.data.len() as u32,
            })?;
        }
    }

    Ok(payload)
}

fn build_stream_data(streams: &[StreamInfo], total_length: u32) -> ByteBuffer {
    let mut payload = ByteBuffer::with_capacity(total_length as usize);
    for info in streams {
        // zero padding up to the stream's assigned offset
        payload.resize(info.offset as usize, 0);
        payload.extend_from_slice(&info.data);
    }

    payload
}
