//! Reassembly of the fragmented directory listing
//!
//! The directory server splits the listing over many `00 03` envelopes. The
//! payload of each envelope starts with a two-byte sub-type marker selecting
//! one of two fragmentation schemes:
//!
//! - **Plain** (`00 08` for a chunk, `00 09` for the final chunk): two bytes of
//!   header, and the sender marks the last fragment explicitly.
//! - **Length-prefixed** (`00 0a`): the marker is followed by a little-endian
//!   `u32` total length. There is no final marker; the listing is complete once
//!   the collected bytes reach the declared total.
//!
//! A [`FragmentStore`] holds the fragments of one scheme keyed by sequence id.
//! Arrival order never matters: consolidation always walks ids in ascending
//! order, and a repeated id replaces the earlier fragment.

use std::collections::BTreeMap;

use crate::packets::ProtocolError;

/// The reassembly scheme a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubFormat {
    Plain,
    LengthPrefixed,
}

impl SubFormat {
    /// Bytes stripped from the front of every stored fragment.
    pub fn header_len(self) -> usize {
        match self {
            SubFormat::Plain => 2,
            SubFormat::LengthPrefixed => 6,
        }
    }
}

/// The sub-type marker at the front of a fragment payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// `00 08`
    Chunk,
    /// `00 09`
    FinalChunk,
    /// `00 0a`
    SizedChunk,
}

impl FragmentKind {
    pub fn classify(payload: &[u8]) -> Result<Self, ProtocolError> {
        match payload {
            [0x00, 0x08, ..] => Ok(FragmentKind::Chunk),
            [0x00, 0x09, ..] => Ok(FragmentKind::FinalChunk),
            [0x00, 0x0a, ..] => Ok(FragmentKind::SizedChunk),
            [a, b, ..] => Err(ProtocolError::UnknownSubType(*a, *b)),
            _ => Err(ProtocolError::Truncated {
                what: "fragment payload",
                expected: 2,
                actual: payload.len(),
            }),
        }
    }

    pub fn format(self) -> SubFormat {
        match self {
            FragmentKind::Chunk | FragmentKind::FinalChunk => SubFormat::Plain,
            FragmentKind::SizedChunk => SubFormat::LengthPrefixed,
        }
    }

    pub fn is_final(self) -> bool {
        self == FragmentKind::FinalChunk
    }
}

/// Fragments of a single sub-format, keyed by sequence id.
#[derive(Debug, Clone)]
pub struct FragmentStore {
    format: SubFormat,
    fragments: BTreeMap<u32, Vec<u8>>,
}

impl FragmentStore {
    pub fn new(format: SubFormat) -> Self {
        Self {
            format,
            fragments: BTreeMap::new(),
        }
    }

    pub fn format(&self) -> SubFormat {
        self.format
    }

    /// Stores `raw` (marker and header included) under `id`, replacing any
    /// fragment already held for that id.
    ///
    /// Fails without touching the store when `raw` is shorter than the
    /// sub-format header.
    pub fn add(&mut self, id: u32, raw: Vec<u8>) -> Result<(), ProtocolError> {
        let header_len = self.format.header_len();
        if raw.len() < header_len {
            return Err(ProtocolError::Truncated {
                what: "fragment header",
                expected: header_len,
                actual: raw.len(),
            });
        }

        self.fragments.insert(id, raw);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Sum of the header-stripped fragment lengths.
    pub fn aggregate_size(&self) -> usize {
        let header_len = self.format.header_len();
        self.fragments
            .values()
            .map(|raw| raw.len() - header_len)
            .sum()
    }

    /// Total listing length announced by the length-prefixed header.
    ///
    /// All fragments of one listing carry the same value; the one with the
    /// lowest id is read. Always `None` for the plain sub-format.
    pub fn declared_length(&self) -> Option<usize> {
        if self.format != SubFormat::LengthPrefixed {
            return None;
        }
        self.fragments.values().next().map(|raw| {
            let mut len = [0u8; 4];
            len.copy_from_slice(&raw[2..6]);
            u32::from_le_bytes(len) as usize
        })
    }

    /// True once the collected bytes cover the declared length.
    ///
    /// Only meaningful for the length-prefixed sub-format; plain listings are
    /// finished by the final-chunk marker, which the session watches for.
    pub fn is_length_satisfied(&self) -> bool {
        self.declared_length()
            .is_some_and(|declared| self.aggregate_size() >= declared)
    }

    /// Concatenates the header-stripped fragments in ascending id order.
    pub fn consolidate(&self) -> Vec<u8> {
        let header_len = self.format.header_len();
        let mut out = Vec::with_capacity(self.aggregate_size());
        for raw in self.fragments.values() {
            out.extend_from_slice(&raw[header_len..]);
        }
        out
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(marker: u8, body: &[u8]) -> Vec<u8> {
        let mut raw = vec![0x00, marker];
        raw.extend_from_slice(body);
        raw
    }

    fn sized(total: u32, body: &[u8]) -> Vec<u8> {
        let mut raw = vec![0x00, 0x0a];
        raw.extend_from_slice(&total.to_le_bytes());
        raw.extend_from_slice(body);
        raw
    }

    #[test]
    fn test_classify_markers() {
        assert_eq!(
            FragmentKind::classify(&[0x00, 0x08, 1]).unwrap(),
            FragmentKind::Chunk
        );
        assert_eq!(
            FragmentKind::classify(&[0x00, 0x09]).unwrap(),
            FragmentKind::FinalChunk
        );
        assert_eq!(
            FragmentKind::classify(&[0x00, 0x0a, 0, 0, 0, 0]).unwrap(),
            FragmentKind::SizedChunk
        );
        assert_eq!(
            FragmentKind::classify(&[0x00, 0x0b]),
            Err(ProtocolError::UnknownSubType(0x00, 0x0b))
        );
        assert!(matches!(
            FragmentKind::classify(&[0x00]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_kind_formats() {
        assert_eq!(FragmentKind::Chunk.format(), SubFormat::Plain);
        assert_eq!(FragmentKind::FinalChunk.format(), SubFormat::Plain);
        assert_eq!(FragmentKind::SizedChunk.format(), SubFormat::LengthPrefixed);
        assert!(FragmentKind::FinalChunk.is_final());
        assert!(!FragmentKind::Chunk.is_final());
    }

    #[test]
    fn test_consolidation_is_independent_of_arrival_order() {
        let fragments = [
            (0u32, plain(0x08, b"AA")),
            (1, plain(0x08, b"BB")),
            (2, plain(0x08, b"CC")),
            (3, plain(0x09, b"ZZ")),
        ];
        let orders: [[usize; 4]; 6] = [
            [0, 1, 2, 3],
            [3, 2, 1, 0],
            [2, 0, 1, 3],
            [1, 3, 0, 2],
            [3, 0, 2, 1],
            [0, 2, 3, 1],
        ];

        for order in orders {
            let mut store = FragmentStore::new(SubFormat::Plain);
            for i in order {
                let (id, raw) = &fragments[i];
                store.add(*id, raw.clone()).unwrap();
            }
            assert_eq!(store.consolidate(), b"AABBCCZZ", "order {:?}", order);
        }
    }

    #[test]
    fn test_ids_sort_numerically() {
        let mut store = FragmentStore::new(SubFormat::Plain);
        store.add(10, plain(0x08, b"c")).unwrap();
        store.add(2, plain(0x08, b"b")).unwrap();
        store.add(1, plain(0x08, b"a")).unwrap();

        assert_eq!(store.consolidate(), b"abc");
    }

    #[test]
    fn test_readding_an_id_overwrites() {
        let mut twice = FragmentStore::new(SubFormat::Plain);
        twice.add(4, plain(0x08, b"first")).unwrap();
        twice.add(4, plain(0x08, b"2nd")).unwrap();

        let mut once = FragmentStore::new(SubFormat::Plain);
        once.add(4, plain(0x08, b"2nd")).unwrap();

        assert_eq!(twice.len(), 1);
        assert_eq!(twice.aggregate_size(), once.aggregate_size());
        assert_eq!(twice.consolidate(), once.consolidate());
    }

    #[test]
    fn test_aggregate_size_strips_headers() {
        let mut store = FragmentStore::new(SubFormat::Plain);
        store.add(0, plain(0x08, b"1234")).unwrap();
        store.add(1, plain(0x09, b"56")).unwrap();
        assert_eq!(store.aggregate_size(), 6);

        let mut store = FragmentStore::new(SubFormat::LengthPrefixed);
        store.add(0, sized(100, b"1234")).unwrap();
        store.add(1, sized(100, b"")).unwrap();
        assert_eq!(store.aggregate_size(), 4);
    }

    #[test]
    fn test_length_prefixed_completion_boundary() {
        let mut store = FragmentStore::new(SubFormat::LengthPrefixed);
        assert!(!store.is_length_satisfied());

        store.add(0, sized(6, b"abc")).unwrap();
        assert_eq!(store.declared_length(), Some(6));
        assert!(!store.is_length_satisfied());

        // One byte short
        store.add(1, sized(6, b"de")).unwrap();
        assert_eq!(store.aggregate_size(), 5);
        assert!(!store.is_length_satisfied());

        // Exactly equal
        store.add(1, sized(6, b"def")).unwrap();
        assert_eq!(store.aggregate_size(), 6);
        assert!(store.is_length_satisfied());

        assert_eq!(store.consolidate(), b"abcdef");
    }

    #[test]
    fn test_length_prefixed_overshoot_is_complete() {
        let mut store = FragmentStore::new(SubFormat::LengthPrefixed);
        store.add(7, sized(2, b"xyz")).unwrap();
        assert!(store.is_length_satisfied());
    }

    #[test]
    fn test_plain_store_never_reports_declared_length() {
        let mut store = FragmentStore::new(SubFormat::Plain);
        store.add(0, plain(0x09, b"done")).unwrap();

        assert_eq!(store.declared_length(), None);
        assert!(!store.is_length_satisfied());
    }

    #[test]
    fn test_add_rejects_short_fragment() {
        let mut store = FragmentStore::new(SubFormat::LengthPrefixed);
        let err = store.add(0, vec![0x00, 0x0a, 0x01]).unwrap_err();

        assert_eq!(
            err,
            ProtocolError::Truncated {
                what: "fragment header",
                expected: 6,
                actual: 3
            }
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_consolidate_does_not_mutate_and_clear_empties() {
        let mut store = FragmentStore::new(SubFormat::Plain);
        store.add(0, plain(0x08, b"keep")).unwrap();

        assert_eq!(store.consolidate(), b"keep");
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
        assert!(store.consolidate().is_empty());
    }
}
