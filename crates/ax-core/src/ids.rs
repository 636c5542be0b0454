use core::fmt;
use core::num::NonZeroU32;

/// Dense index of a node, element, body, joint or lifting surface.
///
/// Stored shifted by one in a `NonZeroU32`, so `Option<Id>` costs nothing
/// extra in the per-node tables.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    pub fn from_usize(index: usize) -> Self {
        Self::from_index(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Position in the owning table.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    pub fn idx(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

pub type NodeId = Id;
pub type ElemId = Id;
pub type BodyId = Id;
pub type JointId = Id;
pub type SurfaceId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_survives_the_offset() {
        for i in [0_usize, 1, 7, 4096] {
            assert_eq!(Id::from_usize(i).idx(), i);
        }
        assert_eq!(Id::from_index(3).to_string(), "3");
        assert_eq!(format!("{:?}", Id::from_index(3)), "#3");
    }

    #[test]
    fn optional_ids_need_no_tag() {
        assert_eq!(size_of::<Option<NodeId>>(), size_of::<NodeId>());
    }
}
