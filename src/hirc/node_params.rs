// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};

use binrw::{binrw, BinReaderExt, BinWriterExt};

use crate::error::Error;
use crate::section::read_bytes;

/// Length of the raw 2D positioning parameters.
const POSITIONING_2D_LENGTH: usize = 1;
/// Length of the raw 3D positioning parameters.
const POSITIONING_3D_LENGTH: usize = 10;

/// One effect attached to a node. Stored as the slot index and the effect's id,
/// followed by two reserved zero bytes.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectSlot {
    pub index: u8,
    #[brw(pad_after = 2)]
    pub id: u32,
}

/// Ties a state group to the (state, value) pairs a node reacts to.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChunk {
    pub state_group: u32,
    pub sync_type: u8,
    #[br(temp)]
    #[bw(calc = states.len() as u16)]
    num_states: u16,
    #[br(count = num_states)]
    pub states: Vec<StateRef>,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRef {
    pub state_id: u32,
    pub value_id: u32,
}

/// A real-time parameter control: a curve mapping a game parameter onto one of the
/// node's audio properties.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct Rtpc {
    pub id: u32,
    pub parameter: u32,
    pub curve_id: i32,
    pub scaling: u8,
    #[br(temp)]
    #[bw(calc = points.len() as u16)]
    num_points: u16,
    #[br(count = num_points)]
    pub points: Vec<GraphPoint>,
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPoint {
    pub x: f32,
    pub y: f32,
    pub interpolation: u32,
}

/// The positioning block, present when its leading flag byte is nonzero. The 2D and 3D
/// parameters are not modeled beyond their lengths and round-trip as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Positioning {
    /// The flag byte that enabled the block.
    pub flag: u8,
    pub has_2d: u8,
    pub has_3d: u8,
    /// Raw 2D parameters, present when `has_2d` is nonzero.
    pub params_2d: Vec<u8>,
    /// Raw 3D parameters, present when `has_3d` is nonzero.
    pub params_3d: Vec<u8>,
}

/// Parameters shared by every mixable node in the hierarchy: effect routing, bus and
/// parent references, numeric properties, positioning, playback limits, state
/// transitions and RTPC curves.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeBaseParams {
    pub override_parent_effects: u8,
    /// Which effect slots are bypassed. Only encoded when effects are present.
    pub effect_bypass_mask: u8,
    pub effects: Vec<EffectSlot>,
    pub output_bus: u32,
    pub parent_id: u32,
    pub override_parent_priority: u8,
    pub priority_distance_factor: u8,
    /// First property set (volume, priority and friends). Encoded as all the type
    /// bytes followed by all the values, in ascending key order, which the map
    /// maintains no matter how callers insert.
    pub properties1: BTreeMap<u8, f32>,
    /// Second property set, same encoding as the first.
    pub properties2: BTreeMap<u8, f32>,
    pub positioning: Option<Positioning>,
    pub aux_params: [u8; 4],
    pub virtual_queue_behaviour: u8,
    pub kill_newest: u8,
    pub use_virtual_behaviour: u8,
    /// Maximum simultaneous playbacks of this node. Zero means unlimited.
    pub max_instances: u16,
    pub unhandled_settings: [u8; 8],
    pub state_chunks: Vec<StateChunk>,
    pub rtpcs: Vec<Rtpc>,
}

impl NodeBaseParams {
    pub(crate) fn read<R: Read + Seek>(reader: &mut R) -> Result<NodeBaseParams, Error> {
        let override_parent_effects = reader.read_le::<u8>()?;

        let num_effects = reader.read_le::<u8>()?;
        let mut effect_bypass_mask = 0;
        let mut effects = Vec::new();
        if num_effects > 0 {
            effect_bypass_mask = reader.read_le::<u8>()?;
            for _ in 0..num_effects {
                effects.push(reader.read_le::<EffectSlot>()?);
            }
        }

        let output_bus = reader.read_le::<u32>()?;
        let parent_id = reader.read_le::<u32>()?;
        let override_parent_priority = reader.read_le::<u8>()?;
        let priority_distance_factor = reader.read_le::<u8>()?;

        let properties1 = read_property_set(reader)?;
        let properties2 = read_property_set(reader)?;

        let positioning_flag = reader.read_le::<u8>()?;
        let positioning = if positioning_flag > 0 {
            let has_2d = reader.read_le::<u8>()?;
            let has_3d = reader.read_le::<u8>()?;

            let mut params_2d = Vec::new();
            let mut params_3d = Vec::new();
            if has_2d > 0 {
                params_2d = read_bytes(reader, POSITIONING_2D_LENGTH)?;
            }
            if has_3d > 0 {
                params_3d = read_bytes(reader, POSITIONING_3D_LENGTH)?;
            }

            Some(Positioning {
                flag: positioning_flag,
                has_2d,
                has_3d,
                params_2d,
                params_3d,
            })
        } else {
            None
        };

        let mut aux_params = [0u8; 4];
        reader.read_exact(&mut aux_params)?;

        let virtual_queue_behaviour = reader.read_le::<u8>()?;
        let kill_newest = reader.read_le::<u8>()?;
        let use_virtual_behaviour = reader.read_le::<u8>()?;
        let max_instances = reader.read_le::<u16>()?;

        let mut unhandled_settings = [0u8; 8];
        reader.read_exact(&mut unhandled_settings)?;

        let num_state_chunks = reader.read_le::<u32>()?;
        let mut state_chunks = Vec::new();
        for _ in 0..num_state_chunks {
            state_chunks.push(reader.read_le::<StateChunk>()?);
        }

        let num_rtpcs = reader.read_le::<u16>()?;
        let mut rtpcs = Vec::new();
        for _ in 0..num_rtpcs {
            rtpcs.push(reader.read_le::<Rtpc>()?);
        }

        Ok(NodeBaseParams {
            override_parent_effects,
            effect_bypass_mask,
            effects,
            output_bus,
            parent_id,
            override_parent_priority,
            priority_distance_factor,
            properties1,
            properties2,
            positioning,
            aux_params,
            virtual_queue_behaviour,
            kill_newest,
            use_virtual_behaviour,
            max_instances,
            unhandled_settings,
            state_chunks,
            rtpcs,
        })
    }

    pub(crate) fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_le(&self.override_parent_effects)?;

        writer.write_le(&(self.effects.len() as u8))?;
        if !self.effects.is_empty() {
            writer.write_le(&self.effect_bypass_mask)?;
            for effect in &self.effects {
                writer.write_le(effect)?;
            }
        }

        writer.write_le(&self.output_bus)?;
        writer.write_le(&self.parent_id)?;
        writer.write_le(&self.override_parent_priority)?;
        writer.write_le(&self.priority_distance_factor)?;

        write_property_set(writer, &self.properties1)?;
        write_property_set(writer, &self.properties2)?;

        match &self.positioning {
            Some(positioning) => {
                writer.write_le(&positioning.flag)?;
                writer.write_le(&positioning.has_2d)?;
                writer.write_le(&positioning.has_3d)?;
                if positioning.has_2d > 0 {
                    writer.write_all(&positioning.params_2d)?;
                }
                if positioning.has_3d > 0 {
                    writer.write_all(&positioning.params_3d)?;
                }
            }
            None => writer.write_le(&0u8)?,
        }

        writer.write_all(&self.aux_params)?;

        writer.write_le(&self.virtual_queue_behaviour)?;
        writer.write_le(&self.kill_newest)?;
        writer.write_le(&self.use_virtual_behaviour)?;
        writer.write_le(&self.max_instances)?;

        writer.write_all(&self.unhandled_settings)?;

        writer.write_le(&(self.state_chunks.len() as u32))?;
        for chunk in &self.state_chunks {
            writer.write_le(chunk)?;
        }

        writer.write_le(&(self.rtpcs.len() as u16))?;
        for rtpc in &self.rtpcs {
            writer.write_le(rtpc)?;
        }

        Ok(())
    }
}

// Property sets store all the type bytes first and all the values after, so pairing
// happens in decoded order and emission in sorted key order.
fn read_property_set<R: Read + Seek>(reader: &mut R) -> Result<BTreeMap<u8, f32>, Error> {
    let count = reader.read_le::<u8>()?;

    let mut types = Vec::new();
    for _ in 0..count {
        types.push(reader.read_le::<u8>()?);
    }

    let mut set = BTreeMap::new();
    for kind in types {
        set.insert(kind, reader.read_le::<f32>()?);
    }

    Ok(set)
}

fn write_property_set<W: Write + Seek>(
    writer: &mut W,
    set: &BTreeMap<u8, f32>,
) -> Result<(), Error> {
    writer.write_le(&(set.len() as u8))?;
    for kind in set.keys() {
        writer.write_le(kind)?;
    }
    for value in set.values() {
        writer.write_le(value)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::ByteBuffer;

    fn write_to_bytes(params: &NodeBaseParams) -> ByteBuffer {
        let mut buffer = ByteBuffer::new();
        let mut cursor = Cursor::new(&mut buffer);
        params.write(&mut cursor).unwrap();
        buffer
    }

    #[test]
    fn default_encoding() {
        let buffer = write_to_bytes(&NodeBaseParams::default());

        // effect count, bus, parent, priority bytes, empty property sets, no
        // positioning, aux, behaviour bytes, instance limit, settings, no chunks
        assert_eq!(buffer.len(), 38);
        assert!(buffer.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn properties_encode_in_key_order() {
        let mut params = NodeBaseParams::default();
        params.properties1.insert(5, 0.5);
        params.properties1.insert(0, 1.0);

        let buffer = write_to_bytes(&params);

        // count, both keys ascending, then both values in the same order
        assert_eq!(buffer[12], 2);
        assert_eq!(buffer[13..15], [0, 5]);
        assert_eq!(buffer[15..19], [0, 0, 128, 63]);
        assert_eq!(buffer[19..23], [0, 0, 0, 63]);
    }

    #[test]
    fn full_round_trip() {
        let mut params = NodeBaseParams::default();
        params.override_parent_effects = 1;
        params.effect_bypass_mask = 0b0101;
        params.effects.push(EffectSlot {
            index: 0,
            id: 0xDEADBEEF,
        });
        params.effects.push(EffectSlot { index: 3, id: 42 });
        params.output_bus = 3677413232;
        params.parent_id = 77;
        params.properties1.insert(0, -96.3);
        params.properties2.insert(6, 100.0);
        params.positioning = Some(Positioning {
            flag: 1,
            has_2d: 1,
            has_3d: 1,
            params_2d: vec![7],
            params_3d: vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
        });
        params.aux_params = [1, 2, 3, 4];
        params.max_instances = 8;
        params.unhandled_settings = [9; 8];
        params.state_chunks.push(StateChunk {
            state_group: 11,
            sync_type: 2,
            states: vec![StateRef {
                state_id: 100,
                value_id: 200,
            }],
        });
        params.rtpcs.push(Rtpc {
            id: 1,
            parameter: 2,
            curve_id: -1,
            scaling: 3,
            points: vec![GraphPoint {
                x: 0.0,
                y: 1.0,
                interpolation: 4,
            }],
        });

        let buffer = write_to_bytes(&params);
        let read_back = NodeBaseParams::read(&mut Cursor::new(buffer.as_slice())).unwrap();

        assert_eq!(read_back, params);
        assert_eq!(write_to_bytes(&read_back), buffer);
    }

    #[test]
    fn effect_mask_only_present_with_effects() {
        let mut with_effect = NodeBaseParams::default();
        with_effect.effects.push(EffectSlot { index: 0, id: 1 });
        with_effect.effect_bypass_mask = 0xFF;

        // one slot is a mask byte plus seven bytes of entry
        assert_eq!(
            write_to_bytes(&with_effect).len(),
            write_to_bytes(&NodeBaseParams::default()).len() + 8
        );
    }

    #[test]
    fn truncated_input() {
        let buffer = write_to_bytes(&NodeBaseParams::default());

        assert!(matches!(
            NodeBaseParams::read(&mut Cursor::new(&buffer[..10])),
            Err(Error::Truncated)
        ));
    }
}
