use std::cmp::Ordering;

/// Anatomical plane used to cut a 2-D view out of a [`Volume`](crate::volume::Volume).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Fixed slice index, the acquisition plane.
    Axial,
    /// Fixed row index.
    Coronal,
    /// Fixed column index.
    Sagittal,
}

/// Sort key of a single slice.
///
/// `Geometric` is the signed distance of the slice origin along the plane
/// normal, `Sequential` is the InstanceNumber. Slices with neither collapse to
/// `Unordered`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SortKey {
    Geometric(f64),
    Sequential(i64),
    Unordered,
}

impl SortKey {
    pub fn is_geometric(&self) -> bool {
        matches!(self, SortKey::Geometric(_))
    }

    /// Total order over keys: geometric keys by `f64::total_cmp`, sequential
    /// keys by number, and keys of different kinds by kind (geometric first,
    /// unordered last). Equal keys keep discovery order under a stable sort.
    pub fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Geometric(a), SortKey::Geometric(b)) => a.total_cmp(b),
            (SortKey::Sequential(a), SortKey::Sequential(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Geometric(_) => 0,
            SortKey::Sequential(_) => 1,
            SortKey::Unordered => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_is_total_with_nan_and_mixed_kinds() {
        let mut keys = vec![
            SortKey::Unordered,
            SortKey::Geometric(3.0),
            SortKey::Sequential(2),
            SortKey::Geometric(f64::NAN),
            SortKey::Geometric(-1.0),
            SortKey::Sequential(1),
        ];
        keys.sort_by(SortKey::compare);
        assert_eq!(keys[0], SortKey::Geometric(-1.0));
        assert_eq!(keys[1], SortKey::Geometric(3.0));
        assert!(matches!(keys[2], SortKey::Geometric(d) if d.is_nan()));
        assert_eq!(keys[3..], [SortKey::Sequential(1), SortKey::Sequential(2), SortKey::Unordered]);
    }
}

/// Basis that was actually used to order a series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceOrder {
    /// Every slice had position and orientation.
    Geometric,
    /// Fell back to InstanceNumber.
    Sequential,
    /// No usable key, slices kept in discovery order.
    Unordered,
}

/// What the loader does when a series has no usable ordering key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnorderedPolicy {
    /// Keep the file-name order of discovery.
    #[default]
    KeepDiscoveryOrder,
    /// Refuse to assemble the volume.
    Reject,
}
