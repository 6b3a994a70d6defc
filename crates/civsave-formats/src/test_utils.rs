//! Test utilities for building synthetic record streams
//!
//! The builders write bytes by hand rather than through the record writer so
//! that parser and writer tests check against an independent encoding.

use crate::framing;
use crate::marker::{FILE_SIGNATURE, GameDataField, Marker};

/// Non-dictionary marker distinguished by `id`
pub fn marker(id: u8) -> Marker {
    Marker::new([id, 0xA5, 0x5A, 0xC3])
}

/// Appends encoded records to a byte buffer
#[derive(Debug, Default, Clone)]
pub struct StreamBuilder {
    data: Vec<u8>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn pad(mut self, len: usize) -> Self {
        self.data.resize(self.data.len() + len, 0);
        self
    }

    pub fn header(self, marker: Marker, tag: u32) -> Self {
        self.raw(&marker.0).raw(&tag.to_le_bytes())
    }

    pub fn integer(self, marker: Marker, value: u32) -> Self {
        self.header(marker, 2).pad(8).raw(&value.to_le_bytes())
    }

    pub fn boolean(self, marker: Marker, value: bool) -> Self {
        self.header(marker, 1)
            .pad(8)
            .raw(&u32::from(value).to_le_bytes())
    }

    pub fn narrow(self, marker: Marker, text: &str) -> Self {
        let length = (text.len() + 1) as u16;
        self.header(marker, 5)
            .raw(&length.to_le_bytes())
            .raw(&[0x00, 0x21, 0x01, 0x00, 0x00, 0x00])
            .raw(text.as_bytes())
            .raw(&[0])
    }

    pub fn wide(self, marker: Marker, text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().chain([0]).collect();
        let mut builder = self
            .header(marker, 6)
            .raw(&(units.len() as u16).to_le_bytes())
            .raw(&[0x00, 0x21, 0x02, 0x00, 0x00, 0x00]);
        for unit in units {
            builder = builder.raw(&unit.to_le_bytes());
        }
        builder
    }

    pub fn opaque(self, marker: Marker, tag: u32, width: usize) -> Self {
        self.header(marker, tag).pad(width)
    }

    /// String record that ends an array element
    pub fn terminator(self, marker: Marker) -> Self {
        self.narrow(marker, "1")
    }

    pub fn array<F>(self, marker: Marker, build: F) -> Self
    where
        F: FnOnce(ArrayBuilder) -> ArrayBuilder,
    {
        let elements = build(ArrayBuilder::default()).elements;
        let mut builder = self
            .header(marker, 0x0B)
            .pad(8)
            .raw(&(elements.len() as u32).to_le_bytes());
        for element in elements {
            builder = builder.raw(&[0x0A]).pad(15).raw(&element);
        }
        builder
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// Collects encoded array elements
#[derive(Debug, Default)]
pub struct ArrayBuilder {
    elements: Vec<Vec<u8>>,
}

impl ArrayBuilder {
    pub fn element<F>(mut self, build: F) -> Self
    where
        F: FnOnce(StreamBuilder) -> StreamBuilder,
    {
        self.elements.push(build(StreamBuilder::new()).build());
        self
    }
}

/// Wrap a record stream into a complete save file.
///
/// The stream is preceded by the signature and some header noise, and
/// followed by the framed, compressed `payload` and `footer`.
pub fn save_file(records: StreamBuilder, payload: &[u8], footer: &[u8]) -> Vec<u8> {
    let mut data = FILE_SIGNATURE.to_vec();
    data.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0xEE, 0xEE, 0xEE, 0xEE]);
    data.extend_from_slice(&records.build());
    data.extend_from_slice(&framing::compress(payload).expect("compress payload"));
    data.extend_from_slice(footer);
    data
}

/// Record stream that opens with the game-speed field
pub fn game_stream() -> StreamBuilder {
    StreamBuilder::new()
        .narrow(GameDataField::GameSpeed.marker(), "GAMESPEED_STANDARD")
        .integer(GameDataField::GameTurn.marker(), 57)
}

/// Payload with the money signature for each entry of `stored`
pub fn money_payload(stored: &[u32]) -> Vec<u8> {
    let mut payload = vec![0x33; 20];
    for value in stored {
        let start = payload.len();
        payload.resize(start + 64, 0x11);
        payload[start..start + 4].copy_from_slice(&[0x21, 0xC9, 0xAF, 0x2F]);
        payload[start + 8..start + 12].copy_from_slice(&[0x57, 0x73, 0x4A, 0x5A]);
        payload[start + 16..start + 20].copy_from_slice(&[0xB7, 0xEA, 0xA0, 0xF1]);
        payload[start + 44..start + 48].copy_from_slice(&value.to_le_bytes());
    }
    payload.extend_from_slice(&[0x44; 10]);
    payload
}
