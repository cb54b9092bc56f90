//! Entry table encoding.
//!
//! One chunk per (type, configuration). All integers are little-endian.
//!
//! ```text
//! u32 entry_count
//! u32 entries_start                  offset of the entry area from chunk start
//! u32 offsets[entry_count]           relative to entries_start, NO_ENTRY if absent
//! entries:
//!   u16 header_size                  SIMPLE_HEADER or COMPLEX_HEADER
//!   u16 flags                        FLAG_COMPLEX
//!   u32 key                          index into the package key pool
//!   simple:  value
//!   complex: u32 parent, u32 count, count * (u32 name, value)
//! value:
//!   u16 size (VALUE_SIZE), u8 reserved, u8 kind, u32 data
//! ```
//!
//! Readers never trust the bytes: every access is checked against the chunk
//! length and reported as a [`DecodeError`].

use bytes::{BufMut, Bytes, BytesMut};
use restable_primitives::{ResId, Value, ValueKind};

use crate::error::DecodeError;

pub(crate) const NO_ENTRY: u32 = u32::MAX;
pub(crate) const FLAG_COMPLEX: u16 = 0x0001;
pub(crate) const SIMPLE_HEADER: u16 = 8;
pub(crate) const COMPLEX_HEADER: u16 = 16;
pub(crate) const VALUE_SIZE: u16 = 8;
const CHUNK_HEADER: usize = 8;
const MAP_ITEM_SIZE: usize = 12;

fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, DecodeError> {
	bytes
		.get(offset..offset.saturating_add(2))
		.map(|b| u16::from_le_bytes([b[0], b[1]]))
		.ok_or(DecodeError::Truncated {
			offset,
			needed: 2,
			len: bytes.len(),
		})
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, DecodeError> {
	bytes
		.get(offset..offset.saturating_add(4))
		.map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
		.ok_or(DecodeError::Truncated {
			offset,
			needed: 4,
			len: bytes.len(),
		})
}

fn read_value(bytes: &[u8], offset: usize) -> Result<Value, DecodeError> {
	let size = read_u16(bytes, offset)?;
	if size < VALUE_SIZE {
		return Err(DecodeError::BadEntryHeader { offset, size });
	}
	let raw_kind = *bytes.get(offset + 3).ok_or(DecodeError::Truncated {
		offset: offset + 3,
		needed: 1,
		len: bytes.len(),
	})?;
	let kind = ValueKind::from_u8(raw_kind).ok_or(DecodeError::UnknownValueKind(raw_kind))?;
	Ok(Value::new(kind, read_u32(bytes, offset + 4)?))
}

/// A complex entry located inside a chunk. Holds its chunk alive, so it
/// can outlive the lookup that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapHandle {
	chunk: Bytes,
	offset: usize,
}

impl MapHandle {
	pub fn parent(&self) -> Result<ResId, DecodeError> {
		read_u32(&self.chunk, self.offset + SIMPLE_HEADER as usize).map(ResId)
	}

	pub fn len(&self) -> Result<u32, DecodeError> {
		read_u32(&self.chunk, self.offset + SIMPLE_HEADER as usize + 4)
	}

	pub fn is_empty(&self) -> Result<bool, DecodeError> {
		Ok(self.len()? == 0)
	}

	/// Decodes the `(key, value)` pairs in declaration order.
	pub fn items(&self) -> Result<Vec<(ResId, Value)>, DecodeError> {
		let count = self.len()? as usize;
		let start = self.offset + COMPLEX_HEADER as usize;
		let needed = count.saturating_mul(MAP_ITEM_SIZE);
		if start.saturating_add(needed) > self.chunk.len() {
			return Err(DecodeError::Truncated {
				offset: start,
				needed,
				len: self.chunk.len(),
			});
		}
		(0..count)
			.map(|i| {
				let at = start + i * MAP_ITEM_SIZE;
				Ok((ResId(read_u32(&self.chunk, at)?), read_value(&self.chunk, at + 4)?))
			})
			.collect()
	}
}

/// Decoded entry body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
	Value(Value),
	Map(MapHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
	pub key: u32,
	pub body: EntryBody,
}

/// Read view over one encoded entry table.
#[derive(Debug, Clone)]
pub struct TypeChunk {
	bytes: Bytes,
	entry_count: u32,
	entries_start: usize,
}

impl TypeChunk {
	pub fn parse(bytes: Bytes) -> Result<Self, DecodeError> {
		let entry_count = read_u32(&bytes, 0)?;
		let entries_start = read_u32(&bytes, 4)? as usize;
		let table_end = CHUNK_HEADER.saturating_add((entry_count as usize).saturating_mul(4));
		if entries_start < table_end || entries_start > bytes.len() {
			return Err(DecodeError::Truncated {
				offset: CHUNK_HEADER,
				needed: table_end.max(entries_start),
				len: bytes.len(),
			});
		}
		Ok(Self {
			bytes,
			entry_count,
			entries_start,
		})
	}

	pub fn entry_count(&self) -> u32 {
		self.entry_count
	}

	/// Returns the entry's offset within the chunk, or `None` when this
	/// configuration has no value for the index.
	pub fn entry_offset(&self, index: u16) -> Result<Option<usize>, DecodeError> {
		if u32::from(index) >= self.entry_count {
			return Ok(None);
		}
		match read_u32(&self.bytes, CHUNK_HEADER + index as usize * 4)? {
			NO_ENTRY => Ok(None),
			rel => Ok(Some(self.entries_start.saturating_add(rel as usize))),
		}
	}

	pub fn entry_at(&self, offset: usize) -> Result<RawEntry, DecodeError> {
		let size = read_u16(&self.bytes, offset)?;
		let flags = read_u16(&self.bytes, offset + 2)?;
		let key = read_u32(&self.bytes, offset + 4)?;
		let complex = flags & FLAG_COMPLEX != 0;
		let expected = if complex { COMPLEX_HEADER } else { SIMPLE_HEADER };
		if size != expected {
			return Err(DecodeError::BadEntryHeader { offset, size });
		}
		let body = if complex {
			let handle = MapHandle {
				chunk: self.bytes.clone(),
				offset,
			};
			handle.len()?;
			EntryBody::Map(handle)
		} else {
			EntryBody::Value(read_value(&self.bytes, offset + size as usize)?)
		};
		Ok(RawEntry { key, body })
	}

	pub fn entry(&self, index: u16) -> Result<Option<RawEntry>, DecodeError> {
		self.entry_offset(index)?.map(|offset| self.entry_at(offset)).transpose()
	}

	/// Iterates the live entries as `(index, key)`, skipping corrupt ones.
	pub fn keys(&self) -> impl Iterator<Item = (u16, u32)> + '_ {
		(0..self.entry_count.min(u32::from(u16::MAX) + 1)).filter_map(move |i| {
			let index = i as u16;
			let offset = self.entry_offset(index).ok()??;
			read_u32(&self.bytes, offset + 4).ok().map(|key| (index, key))
		})
	}
}

/// An entry ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedEntry {
	Value { key: u32, value: Value },
	Map { key: u32, parent: ResId, items: Vec<(ResId, Value)> },
}

fn put_value(buf: &mut BytesMut, value: Value) {
	buf.put_u16_le(VALUE_SIZE);
	buf.put_u8(0);
	buf.put_u8(value.kind.as_u8());
	buf.put_u32_le(value.data);
}

/// Appends one chunk to `arena` and returns its byte range. `entries` is
/// indexed by entry id.
pub(crate) fn encode_chunk(arena: &mut BytesMut, entries: &[Option<EncodedEntry>]) -> std::ops::Range<usize> {
	let start = arena.len();
	let entries_start = CHUNK_HEADER + entries.len() * 4;
	arena.put_u32_le(entries.len() as u32);
	arena.put_u32_le(entries_start as u32);

	let mut body = BytesMut::new();
	let mut offsets = Vec::with_capacity(entries.len());
	for entry in entries {
		let Some(entry) = entry else {
			offsets.push(NO_ENTRY);
			continue;
		};
		offsets.push(body.len() as u32);
		match entry {
			EncodedEntry::Value { key, value } => {
				body.put_u16_le(SIMPLE_HEADER);
				body.put_u16_le(0);
				body.put_u32_le(*key);
				put_value(&mut body, *value);
			}
			EncodedEntry::Map { key, parent, items } => {
				body.put_u16_le(COMPLEX_HEADER);
				body.put_u16_le(FLAG_COMPLEX);
				body.put_u32_le(*key);
				body.put_u32_le(parent.get());
				body.put_u32_le(items.len() as u32);
				for (name, value) in items {
					body.put_u32_le(name.get());
					put_value(&mut body, *value);
				}
			}
		}
	}
	for offset in offsets {
		arena.put_u32_le(offset);
	}
	arena.extend_from_slice(&body);
	start..arena.len()
}
