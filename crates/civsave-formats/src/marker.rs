//! Marker dictionary
//!
//! Markers are opaque 4-byte keys compared by raw byte equality. The tables
//! below are the markers observed in Civilization VI saves; they are plain
//! data and are looked up by linear equality scans.

use std::fmt;

use binrw::{BinRead, BinWrite};
use serde::Serialize;

/// Opaque 4-byte record identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BinRead, BinWrite)]
pub struct Marker(pub [u8; 4]);

impl Marker {
    /// Size of a marker in bytes
    pub const SIZE: usize = 4;

    /// Create a marker from raw bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Raw marker bytes
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Marker bytes reinterpreted as a little-endian integer
    pub const fn as_u32_le(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// Filler markers carry a small integer instead of a key and have no payload
    pub const fn is_filler(&self) -> bool {
        self.as_u32_le() < 256
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Marker({self})")
    }
}

impl Serialize for Marker {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Leading bytes of every save file
pub const FILE_SIGNATURE: [u8; 4] = *b"CIV6";

/// Opens an actor block when no slot header did
pub const START_ACTOR: Marker = Marker::new([0x58, 0xBA, 0x7F, 0x4C]);

/// Boundary between the plain record stream and the compressed section.
/// The same bytes separate the 64 KiB compressed blocks.
pub const END_UNCOMPRESSED: Marker = Marker::new([0x00, 0x00, 0x01, 0x00]);

/// Terminates a zlib sync-flush stream
pub const COMPRESSED_DATA_END: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

/// zlib stream header (default compression level)
pub const ZLIB_HEADER: [u8; 2] = [0x78, 0x9C];

/// Nothing after this marker is parsed; the bytes are kept as an opaque tail
pub const END_OF_DATA: Marker = Marker::new([0x01, 0xDB, 0x89, 0x32]);

/// Per-slot actor headers, in slot order
pub const SLOT_HEADERS: [Marker; 12] = [
    Marker::new([0xC8, 0x9B, 0x5F, 0x65]),
    Marker::new([0x5E, 0xAB, 0x58, 0x12]),
    Marker::new([0xE4, 0xFA, 0x51, 0x8B]),
    Marker::new([0x72, 0xCA, 0x56, 0xFC]),
    Marker::new([0xD1, 0x5F, 0x32, 0x62]),
    Marker::new([0x47, 0x6F, 0x35, 0x15]),
    Marker::new([0xFD, 0x3E, 0x3C, 0x8C]),
    Marker::new([0x6B, 0x0E, 0x3B, 0xFB]),
    Marker::new([0xFA, 0x13, 0x84, 0x6B]),
    Marker::new([0x6C, 0x23, 0x83, 0x1C]),
    Marker::new([0xF4, 0x14, 0x18, 0xAA]),
    Marker::new([0x62, 0x24, 0x1F, 0xDD]),
];

/// Slot index of a slot-header marker
pub fn slot_index(marker: Marker) -> Option<usize> {
    SLOT_HEADERS.iter().position(|slot| *slot == marker)
}

macro_rules! field_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => ($label:literal, [$($byte:literal),+])),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                #[doc = $label]
                $variant,
            )+
        }

        impl $name {
            /// Every field in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Marker bytes for this field
            pub const fn marker(self) -> Marker {
                match self {
                    $(Self::$variant => Marker::new([$($byte),+]),)+
                }
            }

            /// Field name as used in dumps
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Look up the field a marker belongs to
            pub fn from_marker(marker: Marker) -> Option<Self> {
                Self::ALL.iter().copied().find(|field| field.marker() == marker)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

field_table! {
    /// Game-wide fields recorded at top level and inside array elements
    GameDataField {
        GameTurn => ("GAME_TURN", [0x9D, 0x2C, 0xE6, 0xBD]),
        GameSpeed => ("GAME_SPEED", [0x99, 0xB0, 0xD9, 0x05]),
        ModBlock1 => ("MOD_BLOCK_1", [0x5C, 0xAE, 0x27, 0x84]),
        ModBlock2 => ("MOD_BLOCK_2", [0xC8, 0xD1, 0x8C, 0x1B]),
        ModBlock3 => ("MOD_BLOCK_3", [0x44, 0x7F, 0xD4, 0xFE]),
        ModId => ("MOD_ID", [0x54, 0x5F, 0xC4, 0x04]),
        ModTitle => ("MOD_TITLE", [0x72, 0xE1, 0x34, 0x30]),
        MapFile => ("MAP_FILE", [0x5A, 0x87, 0xD8, 0x63]),
        MapSize => ("MAP_SIZE", [0x40, 0x5C, 0x83, 0x0B]),
    }
}

field_table! {
    /// Per-actor fields
    ActorField {
        ActorName => ("ACTOR_NAME", [0x2F, 0x5C, 0x5E, 0x9D]),
        LeaderName => ("LEADER_NAME", [0x5F, 0x5E, 0xCD, 0xE8]),
        ActorType => ("ACTOR_TYPE", [0xBE, 0xAB, 0x55, 0xCA]),
        PlayerName => ("PLAYER_NAME", [0xFD, 0x6B, 0xB9, 0xDA]),
        PlayerPassword => ("PLAYER_PASSWORD", [0x6C, 0xD1, 0x7C, 0x6E]),
        PlayerAlive => ("PLAYER_ALIVE", [0xA6, 0xDF, 0xA7, 0x62]),
        IsCurrentTurn => ("IS_CURRENT_TURN", [0xCB, 0x21, 0xB0, 0x7A]),
        ActorAiHuman => ("ACTOR_AI_HUMAN", [0x95, 0xB9, 0x42, 0xCE]),
        ActorDescription => ("ACTOR_DESCRIPTION", [0x65, 0x19, 0x9B, 0xFF]),
    }
}

/// The record walk starts at the first occurrence of this field
pub const FIRST_GAME_DATA: GameDataField = GameDataField::GameSpeed;

/// ACTOR_TYPE text of a playable civilization
pub const FULL_CIV: &str = "CIVILIZATION_LEVEL_FULL_CIV";

/// ACTOR_AI_HUMAN value of a human player
pub const HUMAN_PLAYER: u32 = 3;

/// ACTOR_AI_HUMAN value of an AI player
pub const AI_PLAYER: u32 = 1;
