use sha2::digest::Digest;
use smallvec::SmallVec;

use crate::cell::{Cell, HashBytes};

/// Representation hash and max depth of a cell.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct CellHashInfo {
    /// SHA-256 of the cell representation.
    pub hash: HashBytes,
    /// Max depth of the cell tree.
    pub depth: u16,
}

/// Memoization scope for hash and depth computation.
///
/// Values are cached by cell identity and live only as long as the context,
/// which keeps every visited cell borrowed. Create a new context for each
/// independent computation so that modified cells are never served from
/// a stale cache.
///
/// The tree is traversed with an explicit stack, so the depth of the cell
/// graph is not limited by the call stack.
pub struct HashContext<'a> {
    cache: ahash::HashMap<*const Cell, CellHashInfo>,
    stack: Vec<&'a Cell>,
    repr: Vec<u8>,
    hashes_computed: usize,
}

impl Default for HashContext<'_> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> HashContext<'a> {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self {
            cache: Default::default(),
            stack: Vec::new(),
            repr: Vec::new(),
            hashes_computed: 0,
        }
    }

    /// Returns the representation hash of the cell.
    #[inline]
    pub fn hash(&mut self, cell: &'a Cell) -> HashBytes {
        self.compute(cell).hash
    }

    /// Returns the max depth of the cell tree.
    #[inline]
    pub fn depth(&mut self, cell: &'a Cell) -> u16 {
        self.compute(cell).depth
    }

    /// Returns an already computed value for the cell.
    #[inline]
    pub fn get(&self, cell: &Cell) -> Option<CellHashInfo> {
        self.cache.get(&key(cell)).copied()
    }

    /// Number of SHA-256 digests computed by this context.
    #[inline]
    pub fn hashes_computed(&self) -> usize {
        self.hashes_computed
    }

    /// Computes hash and depth for the cell and all its descendants.
    pub fn compute(&mut self, root: &'a Cell) -> CellHashInfo {
        if let Some(info) = self.get(root) {
            return info;
        }

        let mut stack = std::mem::take(&mut self.stack);
        stack.push(root);

        let mut last = CellHashInfo::default();
        while let Some(&cell) = stack.last() {
            if self.cache.contains_key(&key(cell)) {
                stack.pop();
                continue;
            }

            let mut children = SmallVec::<[CellHashInfo; 4]>::new();
            let mut ready = true;
            for child in cell.references() {
                match self.cache.get(&key(child)) {
                    Some(info) => children.push(*info),
                    None => {
                        ready = false;
                        stack.push(child.as_ref());
                    }
                }
            }

            if ready {
                stack.pop();
                last = self.finalize(cell, &children);
                self.cache.insert(key(cell), last);
            }
        }

        // Root is always the last finalized cell
        self.stack = stack;
        last
    }

    /// Writes the canonical representation of the cell,
    /// i.e. the bytes which are hashed to obtain its representation hash.
    pub fn write_repr(&mut self, cell: &'a Cell, target: &mut Vec<u8>) {
        let mut children = SmallVec::<[CellHashInfo; 4]>::new();
        for child in cell.references() {
            children.push(self.compute(child));
        }
        write_repr(cell, &children, target);
    }

    fn finalize(&mut self, cell: &Cell, children: &[CellHashInfo]) -> CellHashInfo {
        debug_assert_eq!(cell.references().len(), children.len());

        self.repr.clear();
        write_repr(cell, children, &mut self.repr);
        self.hashes_computed += 1;

        let depth = match children.iter().map(|child| child.depth).max() {
            // NOTE: deeper trees are rejected by the decoder
            Some(depth) => depth.saturating_add(1),
            None => 0,
        };

        CellHashInfo {
            hash: HashBytes(sha2::Sha256::digest(&self.repr).into()),
            depth,
        }
    }
}

#[inline(always)]
fn key(cell: &Cell) -> *const Cell {
    cell as *const Cell
}

fn write_repr(cell: &Cell, children: &[CellHashInfo], target: &mut Vec<u8>) {
    let descriptor = cell.descriptor();
    target.extend_from_slice(&[descriptor.d1, descriptor.d2]);

    if cell.is_exotic() {
        target.push(cell.cell_type().to_byte());
    }
    cell.bits().write_top_upped(target);

    for child in children {
        target.extend_from_slice(&child.depth.to_be_bytes());
    }
    for child in children {
        target.extend_from_slice(child.hash.as_slice());
    }
}
