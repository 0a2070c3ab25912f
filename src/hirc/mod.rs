// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Cursor, Read, Seek, Write};

use binrw::{BinReaderExt, BinWriterExt};

use crate::dialect::BankDialect;
use crate::error::Error;
use crate::section::read_bytes;
use crate::stream::StreamInfo;
use crate::ByteBuffer;

/// Parameters shared by mixable hierarchy nodes.
pub mod node_params;

mod action;
pub use action::{Action, ActionParameter};

mod actor_mixer;
pub use actor_mixer::ActorMixer;

mod event;
pub use event::Event;

mod random_container;
pub use random_container::{PlaylistItem, RandomSequenceContainer};

mod sound;
pub use sound::{Sound, StreamType};

const OBJECT_SOUND: u8 = 2;
const OBJECT_ACTION: u8 = 3;
const OBJECT_EVENT: u8 = 4;
const OBJECT_RANDOM_CONTAINER: u8 = 5;
const OBJECT_ACTOR_MIXER: u8 = 7;

/// An object kind the crate has no model for. Its payload is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub object_type: u8,
    pub id: u32,
    pub data: ByteBuffer,
}

/// One node in the hierarchy. Every revision of the format adds kinds, so anything
/// unrecognized lands in [RawObject] rather than failing the decode.
#[derive(Debug, Clone, PartialEq)]
pub enum HircObject {
    Sound(Sound),
    Action(Action),
    Event(Event),
    RandomSequenceContainer(RandomSequenceContainer),
    ActorMixer(ActorMixer),
    Unknown(RawObject),
}

impl HircObject {
    /// The object's id, unique within the hierarchy.
    pub fn id(&self) -> u32 {
        match self {
            HircObject::Sound(sound) => sound.id,
            HircObject::Action(action) => action.id,
            HircObject::Event(event) => event.id,
            HircObject::RandomSequenceContainer(container) => container.id,
            HircObject::ActorMixer(mixer) => mixer.id,
            HircObject::Unknown(raw) => raw.id,
        }
    }

    /// The type tag the object is stored under.
    pub fn object_type(&self) -> u8 {
        match self {
            HircObject::Sound(_) => OBJECT_SOUND,
            HircObject::Action(_) => OBJECT_ACTION,
            HircObject::Event(_) => OBJECT_EVENT,
            HircObject::RandomSequenceContainer(_) => OBJECT_RANDOM_CONTAINER,
            HircObject::ActorMixer(_) => OBJECT_ACTOR_MIXER,
            HircObject::Unknown(raw) => raw.object_type,
        }
    }
}

/// The object hierarchy: a flat, ordered list of typed records describing playback
/// behavior, mixing and events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HierarchySection {
    pub objects: Vec<HircObject>,
}

impl HierarchySection {
    /// The sound objects in the hierarchy, in stored order.
    pub fn sounds(&self) -> impl Iterator<Item = &Sound> {
        self.objects.iter().filter_map(|object| match object {
            HircObject::Sound(sound) => Some(sound),
            _ => None,
        })
    }

    pub fn sounds_mut(&mut self) -> impl Iterator<Item = &mut Sound> {
        self.objects.iter_mut().filter_map(|object| match object {
            HircObject::Sound(sound) => Some(sound),
            _ => None,
        })
    }

    pub(crate) fn read<R: Read + Seek>(
        reader: &mut R,
        streams: &mut [StreamInfo],
        dialect: &BankDialect,
    ) -> Result<HierarchySection, Error> {
        let num_objects = reader.read_le::<u32>()?;

        let mut objects = Vec::new();
        for _ in 0..num_objects {
            objects.push(read_object(reader, streams, dialect)?);
        }

        Ok(HierarchySection { objects })
    }

    pub(crate) fn write<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        streams: &[StreamInfo],
        data_payload_start: u64,
    ) -> Result<(), Error> {
        writer.write_le(&(self.objects.len() as u32))?;
        for object in &mut self.objects {
            write_object(writer, object, streams, data_payload_start)?;
        }

        Ok(())
    }
}

fn read_object<R: Read + Seek>(
    reader: &mut R,
    streams: &mut [StreamInfo],
    dialect: &BankDialect,
) -> Result<HircObject, Error> {
    let object_type = reader.read_le::<u8>()?;
    let size = reader.read_le::<u32>()?;
    let id = reader.read_le::<u32>()?;

    // the id is part of the declared size
    let budget = (size as usize).checked_sub(4).ok_or(Error::Malformed {
        context: format!("hierarchy object {id}"),
    })?;
    let start = reader.stream_position()?;

    let object = match object_type {
        OBJECT_SOUND => HircObject::Sound(Sound::read(reader, id, budget, streams, dialect)?),
        OBJECT_ACTION => HircObject::Action(Action::read(reader, id, budget)?),
        OBJECT_EVENT => HircObject::Event(Event::read(reader, id, budget)?),
        OBJECT_RANDOM_CONTAINER => HircObject::RandomSequenceContainer(
            RandomSequenceContainer::read(reader, id, budget)?,
        ),
        OBJECT_ACTOR_MIXER => HircObject::ActorMixer(ActorMixer::read(reader, id, budget)?),
        _ => HircObject::Unknown(RawObject {
            object_type,
            id,
            data: read_bytes(reader, budget)?,
        }),
    };

    if reader.stream_position()? != start + budget as u64 {
        return Err(Error::Malformed {
            context: format!("hierarchy object {id}"),
        });
    }

    Ok(object)
}

fn write_object<W: Write + Seek>(
    writer: &mut W,
    object: &mut HircObject,
    streams: &[StreamInfo],
    data_payload_start: u64,
) -> Result<(), Error> {
    let mut payload = ByteBuffer::new();
    {
        let mut cursor = Cursor::new(&mut payload);
        match object {
            HircObject::Sound(sound) => sound.write(&mut cursor, streams, data_payload_start)?,
            HircObject::Action(action) => action.write(&mut cursor)?,
            HircObject::Event(event) => event.write(&mut cursor)?,
            HircObject::RandomSequenceContainer(container) => container.write(&mut cursor)?,
            HircObject::ActorMixer(mixer) => mixer.write(&mut cursor)?,
            HircObject::Unknown(raw) => cursor.write_all(&raw.data)?,
        }
    }

    writer.write_le(&object.object_type())?;
    writer.write_le(&((payload.len() + 4) as u32))?;
    writer.write_le(&object.id())?;
    writer.write_all(&payload)?;

    Ok(())
}
