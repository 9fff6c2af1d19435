//! Note identity with wildcard fields.
//!
//! Hosts identify a note by up to four fields: a host-assigned note id, the
//! note port, the MIDI channel and the key. Any of them may be unset, which
//! turns that field into a wildcard when two identities are compared. On the
//! wire the convention is `-1` for "unset"; [`NoteId::from_raw`] and
//! [`NoteId::to_raw`] translate between the two representations.

/// Identifies a note trigger. Unset fields are wildcards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteId {
    /// Host-assigned note id.
    pub id: Option<u32>,
    /// Note port index.
    pub port: Option<u16>,
    /// MIDI channel (0-15).
    pub channel: Option<u16>,
    /// MIDI key (0-127).
    pub key: Option<u16>,
}

/// Raw wire form of a [`NoteId`]: `(id, port, channel, key)`, `-1` = unset.
pub type RawNoteId = (i32, i16, i16, i16);

impl NoteId {
    /// Identity where every field is a wildcard.
    pub const ANY: Self = Self {
        id: None,
        port: None,
        channel: None,
        key: None,
    };

    /// Identity with only a host note id.
    pub const fn with_id(id: u32) -> Self {
        Self {
            id: Some(id),
            ..Self::ANY
        }
    }

    /// Identity with only a key.
    pub const fn with_key(key: u16) -> Self {
        Self {
            key: Some(key),
            ..Self::ANY
        }
    }

    /// Set the note id.
    pub const fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the port.
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the channel.
    pub const fn channel(mut self, channel: u16) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Set the key.
    pub const fn key(mut self, key: u16) -> Self {
        self.key = Some(key);
        self
    }

    /// Build from host wire values. Negative values become wildcards.
    pub fn from_raw((id, port, channel, key): RawNoteId) -> Self {
        Self {
            id: u32::try_from(id).ok(),
            port: u16::try_from(port).ok(),
            channel: u16::try_from(channel).ok(),
            key: u16::try_from(key).ok(),
        }
    }

    /// Convert to host wire values, using `-1` for unset fields.
    pub fn to_raw(&self) -> RawNoteId {
        (
            self.id.and_then(|v| i32::try_from(v).ok()).unwrap_or(-1),
            self.port.and_then(|v| i16::try_from(v).ok()).unwrap_or(-1),
            self.channel.and_then(|v| i16::try_from(v).ok()).unwrap_or(-1),
            self.key.and_then(|v| i16::try_from(v).ok()).unwrap_or(-1),
        )
    }

    /// Check whether two identities refer to the same note.
    ///
    /// When both sides carry a note id, the ids alone decide. Otherwise every
    /// remaining field that is set on both sides must agree; a field unset on
    /// either side never blocks the match.
    pub fn matches(&self, other: &NoteId) -> bool {
        if let (Some(a), Some(b)) = (self.id, other.id) {
            return a == b;
        }
        field_agrees(self.port, other.port)
            && field_agrees(self.channel, other.channel)
            && field_agrees(self.key, other.key)
    }
}

#[inline]
fn field_agrees(a: Option<u16>, b: Option<u16>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}
