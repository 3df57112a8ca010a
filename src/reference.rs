use std::fmt::{Display, Formatter};

/// Handle to an expression node owned by a [`Zen`][crate::zen::Zen] manager.
///
/// The wrapped integer is the arena slot of the node. Slots are handed out in
/// increasing order and never reused, so the index doubles as the node's
/// `id`, unique within its manager. Two handles are equal iff they denote the
/// same node instance.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ExprRef(u32);

impl ExprRef {
    pub const fn new(index: u32) -> Self {
        assert!(index != 0, "Index 0 is reserved");
        Self(index)
    }

    /// Return the id of the referenced node.
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Return the arena index of the referenced node.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for ExprRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}
