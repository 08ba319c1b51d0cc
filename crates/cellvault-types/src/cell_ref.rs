//! A1-style cell references and ranges.
//!
//! Columns use the bijective base-26 letter scheme (A, B, ..., Z, AA, AB, ...)
//! and map to 0-based indices. Rows are 1-based, as written in a cell key.

use std::fmt;

/// Largest column index accepted (`XFD`, the conventional spreadsheet limit).
pub const MAX_COLUMN_INDEX: u32 = 16_383;

/// Convert column letters to a 0-based column index.
///
/// Computes `Σ(v_i × 26^(n-1-i)) − 1` where `v_i` is the letter value
/// (`A` = 1 ... `Z` = 26). Letters are case-insensitive. Returns `None` for
/// empty input, non-letters, or indices past [`MAX_COLUMN_INDEX`].
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut acc: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let value = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        acc = acc.checked_mul(26)?.checked_add(value)?;
        if acc - 1 > MAX_COLUMN_INDEX {
            return None;
        }
    }
    Some(acc - 1)
}

/// Convert a 0-based column index to its letters (`0` → `"A"`, `26` → `"AA"`).
pub fn column_letters(index: u32) -> String {
    let mut n = u64::from(index) + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// A single cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    /// 1-based row number.
    pub row: u32,
    /// 0-based column index.
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse a key such as `"B12"` (case-insensitive, no `$` anchors).
    pub fn parse(key: &str) -> Option<Self> {
        let split = key.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = key.split_at(split);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let col = column_index(letters)?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self { row, col })
    }

    /// The canonical key string (`"B12"`).
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Column letters of this reference.
    pub fn column_letters(&self) -> String {
        column_letters(self.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

/// A rectangular range, normalized so `start` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    /// Build a range from two corners in any order.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse `"A1:C3"`; a bare `"B2"` is a single-cell range.
    pub fn parse(text: &str) -> Option<Self> {
        match text.split_once(':') {
            Some((a, b)) => Some(Self::new(CellRef::parse(a.trim())?, CellRef::parse(b.trim())?)),
            None => {
                let cell = CellRef::parse(text.trim())?;
                Some(Self::new(cell, cell))
            }
        }
    }

    /// Range anchored at `origin` spanning `rows × cols` cells, or `None`
    /// when the far corner is past `u32::MAX`.
    pub fn from_span(origin: CellRef, rows: u32, cols: u32) -> Option<Self> {
        let end = CellRef::new(
            origin.row.checked_add(rows.max(1) - 1)?,
            origin.col.checked_add(cols.max(1) - 1)?,
        );
        Some(Self { start: origin, end })
    }

    pub fn contains(&self, cell: &CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn column_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row)
            .flat_map(move |row| (self.start.col..=self.end.col).map(move |col| CellRef::new(row, col)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_known_values() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("AZ"), Some(51));
        assert_eq!(column_index("BA"), Some(52));
        assert_eq!(column_index("xfd"), Some(MAX_COLUMN_INDEX));
    }

    #[test]
    fn test_column_index_rejects_garbage() {
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
        assert_eq!(column_index("XFE"), None);
        assert_eq!(column_index("ZZZZZZZZZ"), None);
    }

    #[test]
    fn test_column_letters_inverts_index() {
        for idx in [0, 1, 25, 26, 51, 52, 701, 702, 16_383] {
            assert_eq!(column_index(&column_letters(idx)), Some(idx));
        }
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn test_cell_ref_parse() {
        assert_eq!(CellRef::parse("A1"), Some(CellRef::new(1, 0)));
        assert_eq!(CellRef::parse("b12"), Some(CellRef::new(12, 1)));
        assert_eq!(CellRef::parse("A0"), None);
        assert_eq!(CellRef::parse("12"), None);
        assert_eq!(CellRef::parse("A"), None);
        assert_eq!(CellRef::parse("A1B"), None);
        assert_eq!(CellRef::new(12, 1).key(), "B12");
    }

    #[test]
    fn test_range_parse_and_normalize() {
        let r = CellRange::parse("C3:A1").unwrap();
        assert_eq!(r.start, CellRef::new(1, 0));
        assert_eq!(r.end, CellRef::new(3, 2));
        assert_eq!(r.to_string(), "A1:C3");
        assert_eq!(CellRange::parse("B2").unwrap().to_string(), "B2");
        assert!(CellRange::parse("A1:").is_none());
    }

    #[test]
    fn test_range_contains_and_overlaps() {
        let r = CellRange::parse("B2:C3").unwrap();
        assert!(r.contains(&CellRef::parse("C2").unwrap()));
        assert!(!r.contains(&CellRef::parse("A1").unwrap()));
        assert!(r.overlaps(&CellRange::parse("C3:D4").unwrap()));
        assert!(!r.overlaps(&CellRange::parse("D1:E9").unwrap()));
    }

    #[test]
    fn test_range_cells_row_major() {
        let keys: Vec<String> = CellRange::parse("A1:B2").unwrap().cells().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["A1", "B1", "A2", "B2"]);
    }

    #[test]
    fn test_from_span() {
        let r = CellRange::from_span(CellRef::parse("B2").unwrap(), 2, 3).unwrap();
        assert_eq!(r.to_string(), "B2:D3");
        assert_eq!(r.row_count(), 2);
        assert_eq!(r.column_count(), 3);
    }

    #[test]
    fn test_from_span_overflow() {
        let origin = CellRef::parse("B2").unwrap();
        assert!(CellRange::from_span(origin, u32::MAX, 1).is_none());
        assert!(CellRange::from_span(origin, 1, u32::MAX).is_none());
        // Row u32::MAX - 1 plus one more row still fits.
        assert!(CellRange::from_span(CellRef::new(u32::MAX - 1, 0), 2, 1).is_some());
    }

    #[test]
    fn test_column_letters_at_u32_max() {
        assert!(!column_letters(u32::MAX).is_empty());
    }
}
