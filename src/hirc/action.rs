// SPDX-FileCopyrightText: 2025 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Read, Seek, Write};

use binrw::{binrw, BinReaderExt, BinWriterExt};

use crate::error::Error;
use crate::section::read_bytes;
use crate::ByteBuffer;

const ACTION_SET_STATE: u8 = 0x12;
const ACTION_SET_SWITCH: u8 = 0x19;

/// One parameter attached to an action. The value bytes are not interpreted.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionParameter {
    pub key: u8,
    pub value: [u8; 4],
}

/// Something the engine does to a target object when an event fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub id: u32,
    pub scope: u8,
    pub action_type: u8,
    /// The object the action applies to.
    pub target_id: u32,
    pub parameters: Vec<ActionParameter>,
    /// Only encoded for Set State and Set Switch actions.
    pub switch_group_id: u32,
    /// Only encoded for Set State and Set Switch actions.
    pub switch_id: u32,
    /// Bytes beyond the modeled fields, echoed back on save.
    pub unhandled: ByteBuffer,
}

fn has_switch_pair(action_type: u8) -> bool {
    matches!(action_type, ACTION_SET_STATE | ACTION_SET_SWITCH)
}

impl Action {
    /// A readable name for the action's scope.
    pub fn scope_name(&self) -> String {
        match self.scope {
            0x01 => "Object: Switch or Trigger".to_string(),
            0x02 => "Global".to_string(),
            0x03 => "Object".to_string(),
            0x04 => "Object: State".to_string(),
            0x05 => "All".to_string(),
            0x09 => "All Except Referenced".to_string(),
            scope => format!("Unknown (0x{scope:02x})"),
        }
    }

    /// A readable name for what the action does.
    pub fn action_type_name(&self) -> String {
        match self.action_type {
            0x01 => "Stop".to_string(),
            0x02 => "Pause".to_string(),
            0x03 => "Resume".to_string(),
            0x04 => "Play".to_string(),
            0x05 => "Trigger".to_string(),
            0x06 => "Mute".to_string(),
            0x07 => "Unmute".to_string(),
            0x08 => "Set Voice Pitch".to_string(),
            0x09 => "Reset Voice Pitch".to_string(),
            0x0A => "Set Voice Volume".to_string(),
            0x0B => "Reset Voice Volume".to_string(),
            0x0C => "Set Bus Volume".to_string(),
            0x0D => "Reset Bus Volume".to_string(),
            0x0E => "Set Voice Low-pass Filter".to_string(),
            0x0F => "Reset Voice Low-pass Filter".to_string(),
            0x10 => "Enable State".to_string(),
            0x11 => "Disable State".to_string(),
            0x12 => "Set State".to_string(),
            0x13 => "Set Game Parameter".to_string(),
            0x14 => "Reset Game Parameter".to_string(),
            0x19 => "Set Switch".to_string(),
            0x1A => "Enable/Disable Bypass".to_string(),
            0x1B => "Reset Bypass Effect".to_string(),
            0x1C => "Break".to_string(),
            0x1E => "Seek".to_string(),
            kind => format!("Unknown (0x{kind:02x})"),
        }
    }

    pub(crate) fn read<R: Read + Seek>(
        reader: &mut R,
        id: u32,
        budget: usize,
    ) -> Result<Action, Error> {
        let start = reader.stream_position()?;

        let scope = reader.read_le::<u8>()?;
        let action_type = reader.read_le::<u8>()?;
        let target_id = reader.read_le::<u32>()?;
        let _reserved = reader.read_le::<u8>()?;

        let num_parameters = reader.read_le::<u8>()?;
        let mut parameters = Vec::new();
        for _ in 0..num_parameters {
            parameters.push(reader.read_le::<ActionParameter>()?);
        }
        let _reserved = reader.read_le::<u8>()?;

        let mut switch_group_id = 0;
        let mut switch_id = 0;
        if has_switch_pair(action_type) {
            switch_group_id = reader.read_le::<u32>()?;
            switch_id = reader.read_le::<u32>()?;
        }

        let consumed = (reader.stream_position()? - start) as usize;
        let leftover = budget.checked_sub(consumed).ok_or(Error::Malformed {
            context: format!("action object {id}"),
        })?;
        let unhandled = read_bytes(reader, leftover)?;

        Ok(Action {
            id,
            scope,
            action_type,
            target_id,
            parameters,
            switch_group_id,
            switch_id,
            unhandled,
        })
    }

    pub(crate) fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<(), Error> {
        writer.write_le(&self.scope)?;
        writer.write_le(&self.action_type)?;
        writer.write_le(&self.target_id)?;
        writer.write_le(&0u8)?;

        writer.write_le(&(self.parameters.len() as u8))?;
        for parameter in &self.parameters {
            writer.write_le(parameter)?;
        }
        writer.write_le(&0u8)?;

        if has_switch_pair(self.action_type) {
            writer.write_le(&self.switch_group_id)?;
            writer.write_le(&self.switch_id)?;
        }

        writer.write_all(&self.unhandled)?;

        Ok(())
    }
}
