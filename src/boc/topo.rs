//! Cell graph linearization.

use smallvec::SmallVec;

use crate::cell::{Cell, HashBytes, HashContext};

/// A unique cell with references resolved to positions in the sorted list.
pub struct SortedCell<'a> {
    pub cell: &'a Cell,
    pub references: SmallVec<[u32; 4]>,
}

/// Orders unique cells of the tree so that the root comes first
/// and each cell precedes all of its children.
///
/// Cells with the same representation hash are stored once.
pub fn sort<'a>(root: &'a Cell, ctx: &mut HashContext<'a>) -> Vec<SortedCell<'a>> {
    struct Frame<'a> {
        cell: &'a Cell,
        next: usize,
        references: SmallVec<[u32; 4]>,
    }

    impl<'a> Frame<'a> {
        fn new(cell: &'a Cell) -> Self {
            Self {
                cell,
                next: 0,
                references: SmallVec::new(),
            }
        }
    }

    let mut rev_indices = ahash::HashMap::<HashBytes, u32>::default();
    let mut rev_cells = Vec::<(&'a Cell, SmallVec<[u32; 4]>)>::new();

    let mut stack = vec![Frame::new(root)];
    while let Some(frame) = stack.last_mut() {
        let cell = frame.cell;
        if let Some(child) = cell.references().get(frame.next) {
            match rev_indices.get(&ctx.hash(child)) {
                Some(&rev_index) => {
                    frame.references.push(rev_index);
                    frame.next += 1;
                }
                None => stack.push(Frame::new(child)),
            }
            continue;
        }

        // All children are already sorted
        let Some(Frame { references, .. }) = stack.pop() else {
            break;
        };

        let rev_index = rev_cells.len() as u32;
        rev_indices.insert(ctx.hash(cell), rev_index);
        rev_cells.push((cell, references));

        if let Some(parent) = stack.last_mut() {
            parent.references.push(rev_index);
            parent.next += 1;
        }
    }

    let cell_count = rev_cells.len() as u32;
    rev_cells
        .into_iter()
        .rev()
        .map(|(cell, references)| SortedCell {
            cell,
            references: references
                .into_iter()
                .map(|rev_index| cell_count - rev_index - 1)
                .collect(),
        })
        .collect()
}
