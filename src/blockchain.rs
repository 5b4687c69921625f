use std::{collections::BTreeSet, ops::Index};

use thiserror::Error;

use crate::{
    block::{Block, BlockId},
    miner::MinerId,
};

/// Store of every [`Block`] created during one simulation run, indexed by
/// [`BlockId`]. [Miners](crate::miner::Miner) only ever hold IDs referencing
/// blocks in this store.
///
/// A new blockchain contains `uncle_depth + 2` synthetic genesis blocks
/// forming a straight chain, so that uncle selection always has enough
/// ancestors to walk.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    uncle_depth: usize,
}

#[derive(Debug, Error)]
pub enum BlockPublishingError {
    #[error("block ID {0} is not the next available ID {1}")]
    NonSequentialId(BlockId, BlockId),
    #[error("block does not contain a parent block ID")]
    NoParentGiven,
    #[error("block's parent {0} was not found in this chain")]
    ParentNotFound(BlockId),
    #[error("block's uncle {0} was not found in this chain")]
    UncleNotFound(BlockId),
    #[error("block height {0} does not follow its parent's height")]
    InvalidHeight(u64),
    #[error("block score {0} does not match its parent and uncles")]
    InvalidScore(u64),
    #[error("only the genesis miner may publish genesis blocks")]
    GenesisMiner,
}

impl Blockchain {
    /// Creates a new blockchain containing the genesis blocks needed for an
    /// uncle depth of `uncle_depth`.
    pub fn new(uncle_depth: usize) -> Self {
        let blocks = (0..uncle_depth as u64 + 2).map(Block::genesis).collect();

        Blockchain { blocks, uncle_depth }
    }

    /// Maximum number of generations an uncle may be behind the block which
    /// includes it.
    #[inline]
    pub fn uncle_depth(&self) -> usize {
        self.uncle_depth
    }

    /// Returns the genesis blocks in ascending order of height.
    #[inline]
    pub fn genesis(&self) -> &[Block] {
        &self.blocks[..self.uncle_depth + 2]
    }

    /// Returns the ID of the highest genesis block.
    #[inline]
    pub fn genesis_tip(&self) -> BlockId {
        BlockId(self.uncle_depth + 1)
    }

    /// Height of the highest genesis block. Blocks above this height were
    /// produced by miners.
    #[inline]
    pub fn genesis_height(&self) -> u64 {
        self.uncle_depth as u64 + 1
    }

    /// Returns true iff the given block ID is associated with a block in this
    /// chain.
    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        id.0 < self.blocks.len()
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    /// Total number of blocks, including genesis blocks.
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Number of blocks produced by miners.
    #[inline]
    pub fn num_mined(&self) -> usize {
        self.blocks.len() - self.genesis().len()
    }

    /// Returns all blocks produced by miners, in order of creation.
    pub fn mined(&self) -> impl Iterator<Item = &Block> {
        self.blocks[self.uncle_depth + 2..].iter()
    }

    /// The ID that the next published block must carry.
    #[inline]
    pub fn next_id(&self) -> BlockId {
        BlockId(self.blocks.len())
    }

    /// Returns an iterator over `id` and all of its ancestors, in descending
    /// order of height.
    ///
    /// ## Panics
    /// If a block with [`BlockId`] `id` is not present on the chain.
    pub fn ancestors_of(&self, id: BlockId) -> Ancestors<'_> {
        assert!(
            self.contains(id),
            "blockchain does not contain a block with ID: {}",
            id
        );

        Ancestors { chain: self, next: Some(id) }
    }

    /// Returns true iff `ancestor` lies on the path from `id` to the root
    /// genesis block, `id` itself included.
    pub fn is_ancestor(&self, ancestor: BlockId, id: BlockId) -> bool {
        let height = self[ancestor].height;

        self.ancestors_of(id)
            .take_while(|block| block.height >= height)
            .any(|block| block.id == ancestor)
    }

    /// Adds a mined block to the chain and returns its ID.
    pub fn publish(
        &mut self,
        block: Block,
    ) -> Result<BlockId, BlockPublishingError> {
        use BlockPublishingError::*;

        if block.id != self.next_id() {
            return Err(NonSequentialId(block.id, self.next_id()));
        }
        if block.miner_id == MinerId::GENESIS {
            return Err(GenesisMiner);
        }
        let parent = match block.parent_id {
            None => return Err(NoParentGiven),
            Some(parent) => match self.get(parent) {
                Some(parent) => parent,
                None => return Err(ParentNotFound(parent)),
            },
        };
        if let Some(&uncle) = block.uncles.iter().find(|&&u| !self.contains(u))
        {
            return Err(UncleNotFound(uncle));
        }
        if block.height != parent.height + 1 {
            return Err(InvalidHeight(block.height));
        }
        if block.score != parent.score + 1 + block.uncles.len() as u64 {
            return Err(InvalidScore(block.score));
        }

        let id = block.id;
        self.blocks.push(block);

        Ok(id)
    }

    /// Builds the block which `miner_id` would mine on top of `parent_id`
    /// while claiming `uncles`. The block is not published.
    pub fn block_on(
        &self,
        parent_id: BlockId,
        uncles: BTreeSet<BlockId>,
        miner_id: MinerId,
    ) -> Block {
        let parent = &self[parent_id];

        Block {
            id: self.next_id(),
            parent_id: Some(parent_id),
            height: parent.height + 1,
            score: parent.score + 1 + uncles.len() as u64,
            uncles,
            miner_id,
        }
    }
}

impl Index<BlockId> for Blockchain {
    type Output = Block;

    fn index(&self, index: BlockId) -> &Self::Output {
        self.blocks.index(index.0)
    }
}

impl Index<&BlockId> for Blockchain {
    type Output = Block;

    fn index(&self, index: &BlockId) -> &Self::Output {
        self.blocks.index(index.0)
    }
}

/// Iterator over a block and its ancestors. Created by
/// [`Blockchain::ancestors_of`].
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    chain: &'a Blockchain,
    next: Option<BlockId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = &self.chain[self.next?];
        self.next = block.parent_id;

        Some(block)
    }
}
