//! Blocks produced by mining events

use std::{collections::BTreeSet, fmt::Display};

use crate::miner::MinerId;

/// Unique identifier of a [`Block`]. Corresponds to the index of the block
/// within the [`Blockchain`](crate::blockchain::Blockchain) of a simulation
/// run.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Returns the [`usize`] corresponding to this [`BlockId`].
    pub fn get(&self) -> usize {
        self.0
    }
}

impl From<usize> for BlockId {
    fn from(value: usize) -> Self {
        BlockId(value)
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Representation of a mined block. Blocks never change after being
/// published to a [`Blockchain`](crate::blockchain::Blockchain).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    /// `None` only for the root genesis block.
    pub parent_id: Option<BlockId>,
    /// Blocks referenced as uncles by this block.
    pub uncles: BTreeSet<BlockId>,
    pub miner_id: MinerId,
    /// Length of the path from this block to the root genesis block.
    pub height: u64,
    /// Chain weight: the parent's score, plus one for this block, plus one
    /// for every uncle it claims.
    pub score: u64,
}

impl Block {
    /// Creates a synthetic genesis block at the given height. Genesis blocks
    /// form a straight chain with `score == height`.
    pub(crate) fn genesis(height: u64) -> Self {
        let id = BlockId(height as usize);
        let parent_id = height.checked_sub(1).map(|h| BlockId(h as usize));

        Block {
            id,
            parent_id,
            uncles: BTreeSet::new(),
            miner_id: MinerId::GENESIS,
            height,
            score: height,
        }
    }

    /// Returns true iff this block was created by the genesis miner.
    #[inline]
    pub fn is_genesis(&self) -> bool {
        self.miner_id == MinerId::GENESIS
    }
}
