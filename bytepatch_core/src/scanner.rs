use crate::pattern::SearchPattern;
use serde::Serialize;
use std::ops::Range;

/// One match of a search pattern: its start offset and length in the scanned buffer.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurrence {
    pub offset: usize,
    pub len: usize,
}

impl Occurrence {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Left-to-right, non-overlapping scan of a buffer for a [`SearchPattern`].
///
/// Once a match is found the cursor jumps past it, so a later occurrence never starts
/// inside an earlier one. For `"aaaa"` and pattern `"aa"` this yields offsets 0 and 2.
#[derive(Debug, Clone)]
pub struct ByteScanner<'a> {
    haystack: &'a [u8],
    needle: &'a [u8],
    cursor: usize,
}

impl<'a> ByteScanner<'a> {
    pub fn new(haystack: &'a [u8], pattern: &'a SearchPattern) -> Self {
        Self {
            haystack,
            needle: pattern.as_bytes(),
            cursor: 0,
        }
    }
}

impl Iterator for ByteScanner<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        let len = self.needle.len();
        while self.cursor + len <= self.haystack.len() {
            let start = self.cursor;
            if &self.haystack[start..start + len] == self.needle {
                self.cursor += len;
                return Some(Occurrence { offset: start, len });
            }
            self.cursor += 1;
        }
        None
    }
}

/// All occurrences of `pattern` in `buffer`, in ascending offset order.
pub fn find_all(buffer: &[u8], pattern: &SearchPattern) -> Vec<Occurrence> {
    ByteScanner::new(buffer, pattern).collect()
}

pub fn count(buffer: &[u8], pattern: &SearchPattern) -> usize {
    ByteScanner::new(buffer, pattern).count()
}

pub fn first(buffer: &[u8], pattern: &SearchPattern) -> Option<Occurrence> {
    ByteScanner::new(buffer, pattern).next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pattern(bytes: &[u8]) -> SearchPattern {
        SearchPattern::new(bytes.to_vec()).unwrap()
    }

    #[test]
    fn finds_every_occurrence_in_order() {
        let found = find_all(b"foobarfoo", &pattern(b"foo"));
        assert_eq!(
            found,
            vec![
                Occurrence { offset: 0, len: 3 },
                Occurrence { offset: 6, len: 3 }
            ]
        );
    }

    #[test]
    fn matches_do_not_overlap() {
        let offsets: Vec<usize> = find_all(b"aaaaa", &pattern(b"aa"))
            .iter()
            .map(|o| o.offset)
            .collect();
        assert_eq!(offsets, vec![0, 2]);
    }

    #[test]
    fn empty_and_short_buffers_yield_nothing() {
        assert!(find_all(b"", &pattern(b"x")).is_empty());
        assert!(find_all(b"ab", &pattern(b"abc")).is_empty());
        assert_eq!(first(b"", &pattern(b"x")), None);
    }

    #[test]
    fn match_at_end_of_buffer_is_found() {
        assert_eq!(
            first(b"\x00\x01\x02", &pattern(&[0x01, 0x02])),
            Some(Occurrence { offset: 1, len: 2 })
        );
        assert_eq!(count(b"xyxyxy", &pattern(b"xy")), 3);
    }

    proptest! {
        #[test]
        fn prop_occurrences_ascending_disjoint_and_exact(
            buffer in proptest::collection::vec(0u8..4, 0..256),
            needle in proptest::collection::vec(0u8..4, 1..4)
        ) {
            let p = pattern(&needle);
            let found = find_all(&buffer, &p);
            let mut previous_end = 0usize;
            for occ in &found {
                prop_assert!(occ.offset >= previous_end);
                prop_assert_eq!(occ.len, needle.len());
                prop_assert_eq!(&buffer[occ.range()], needle.as_slice());
                previous_end = occ.end();
            }
        }

        #[test]
        fn prop_no_match_is_missed_between_occurrences(
            buffer in proptest::collection::vec(0u8..3, 0..128),
            needle in proptest::collection::vec(0u8..3, 1..3)
        ) {
            // A greedy scan must pick the leftmost window at or after the previous match end.
            let p = pattern(&needle);
            let found = find_all(&buffer, &p);
            let mut cursor = 0usize;
            for occ in &found {
                for start in cursor..occ.offset {
                    prop_assert_ne!(&buffer[start..start + needle.len()], needle.as_slice());
                }
                cursor = occ.end();
            }
            let mut start = cursor;
            while start + needle.len() <= buffer.len() {
                prop_assert_ne!(&buffer[start..start + needle.len()], needle.as_slice());
                start += 1;
            }
        }
    }
}
