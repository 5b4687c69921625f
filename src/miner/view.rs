//! A miner's local, possibly incomplete view of the block tree

use std::collections::{BTreeSet, HashMap, HashSet};

use log::trace;

use crate::{block::BlockId, blockchain::Blockchain};

/// The set of blocks a miner knows about, together with the forward
/// adjacency between them and the miner's preferred tip.
///
/// A view never owns blocks. It references entries of the run's
/// [`Blockchain`], which must be the same chain for every call made on a
/// given view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainView {
    known: HashSet<BlockId>,
    children: HashMap<BlockId, Vec<BlockId>>,
    head: BlockId,
}

impl ChainView {
    /// Creates a view which knows every genesis block of `chain`, with its
    /// head set to the highest of them.
    pub fn new(chain: &Blockchain) -> Self {
        let mut known = HashSet::new();
        let mut children: HashMap<BlockId, Vec<BlockId>> = HashMap::new();

        for block in chain.genesis() {
            known.insert(block.id);
            if let Some(parent) = block.parent_id {
                children.entry(parent).or_default().push(block.id);
            }
        }

        ChainView { known, children, head: chain.genesis_tip() }
    }

    /// The tip with the highest score seen so far. Ties are resolved in
    /// favor of the block seen first.
    #[inline]
    pub fn head(&self) -> BlockId {
        self.head
    }

    #[inline]
    pub fn contains(&self, id: BlockId) -> bool {
        self.known.contains(&id)
    }

    /// Number of blocks known, genesis blocks included.
    #[inline]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Known direct children of `id`, in the order they were received.
    pub fn children_of(&self, id: BlockId) -> &[BlockId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Adds the block with the given ID to this view. Returns false and leaves
    /// the view untouched if the block is already known, if its parent is
    /// unknown, or if the block does not exist in `chain`.
    pub fn receive(&mut self, chain: &Blockchain, id: BlockId) -> bool {
        if self.known.contains(&id) {
            return false;
        }
        let Some(block) = chain.get(id) else {
            return false;
        };
        let parent = match block.parent_id {
            Some(parent) if self.known.contains(&parent) => parent,
            _ => return false,
        };

        self.known.insert(id);
        self.children.entry(parent).or_default().push(id);

        if block.score > chain[self.head].score {
            trace!("head {} -> {} (score {})", self.head, id, block.score);
            self.head = id;
        }

        true
    }

    /// Returns the uncles a block mined on top of the current head would
    /// include.
    ///
    /// Candidates are the children of the head's ancestors up to
    /// `chain.uncle_depth()` generations back. Ancestors of the head and
    /// blocks already claimed as uncles by those ancestors are excluded.
    pub fn uncle_candidates(&self, chain: &Blockchain) -> BTreeSet<BlockId> {
        let lineage: Vec<_> = chain
            .ancestors_of(self.head)
            .take(chain.uncle_depth() + 1)
            .collect();

        let mut uncles = BTreeSet::new();
        let mut excluded = HashSet::new();
        for pair in lineage.windows(2) {
            let (block, parent) = (pair[0], pair[1]);

            uncles.extend(self.children_of(parent.id).iter().copied());
            excluded.insert(block.id);
            excluded.extend(block.uncles.iter().copied());
        }

        uncles.retain(|id| !excluded.contains(id));
        uncles
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::ChainView;
    use crate::{block::BlockId, blockchain::Blockchain, miner::MinerId};

    fn publish_on(
        chain: &mut Blockchain,
        parent: BlockId,
        uncles: &[BlockId],
        miner: usize,
    ) -> BlockId {
        let uncles = uncles.iter().copied().collect();
        let block = chain.block_on(parent, uncles, MinerId(miner));
        chain.publish(block).unwrap()
    }

    #[test]
    fn new_view_knows_genesis() {
        let chain = Blockchain::new(4);
        let view = ChainView::new(&chain);

        assert_eq!(view.len(), 6);
        assert_eq!(view.head(), chain.genesis_tip());
        assert_eq!(view.children_of(BlockId(0)), &[BlockId(1)]);
        assert!(view.children_of(chain.genesis_tip()).is_empty());
    }

    #[test]
    fn receive_duplicate_is_noop() {
        let mut chain = Blockchain::new(3);
        let tip = chain.genesis_tip();
        let a = publish_on(&mut chain, tip, &[], 1);

        let mut view = ChainView::new(&chain);
        assert!(view.receive(&chain, a));
        let before = view.clone();

        assert!(!view.receive(&chain, a));
        assert_eq!(view, before);
    }

    #[test]
    fn receive_rejects_orphans_and_unknown_ids() {
        let mut chain = Blockchain::new(3);
        let tip = chain.genesis_tip();
        let a = publish_on(&mut chain, tip, &[], 1);
        let b = publish_on(&mut chain, a, &[], 1);

        let mut view = ChainView::new(&chain);
        let before = view.clone();
        assert!(!view.receive(&chain, b));
        assert!(!view.receive(&chain, BlockId(1000)));
        assert_eq!(view, before);

        assert!(view.receive(&chain, a));
        assert!(view.receive(&chain, b));
        assert_eq!(view.head(), b);
    }

    #[test]
    fn ties_keep_first_seen_head() {
        let mut chain = Blockchain::new(3);
        let tip = chain.genesis_tip();
        let a = publish_on(&mut chain, tip, &[], 1);
        let b = publish_on(&mut chain, tip, &[], 2);

        let mut view = ChainView::new(&chain);
        view.receive(&chain, a);
        view.receive(&chain, b);
        assert_eq!(view.head(), a);
        assert_eq!(view.children_of(tip), &[a, b]);
    }

    #[test]
    fn head_score_never_decreases() {
        let mut chain = Blockchain::new(2);
        let tip = chain.genesis_tip();
        let a = publish_on(&mut chain, tip, &[], 1);
        let a2 = publish_on(&mut chain, a, &[], 1);
        let b = publish_on(&mut chain, tip, &[], 2);
        let c = publish_on(&mut chain, a2, &[b], 1);

        let mut view = ChainView::new(&chain);
        let mut score = chain[view.head()].score;
        for id in [a, a2, b, c] {
            view.receive(&chain, id);
            let new_score = chain[view.head()].score;
            assert!(new_score >= score);
            score = new_score;
        }
        assert_eq!(view.head(), c);
    }

    #[test]
    fn uncle_candidates_are_siblings_of_ancestors() {
        let mut chain = Blockchain::new(4);
        let tip = chain.genesis_tip();
        let a = publish_on(&mut chain, tip, &[], 1);
        let b = publish_on(&mut chain, tip, &[], 2);
        let a2 = publish_on(&mut chain, a, &[], 1);

        let mut view = ChainView::new(&chain);
        for id in [a, b, a2] {
            view.receive(&chain, id);
        }
        assert_eq!(view.head(), a2);
        assert_eq!(view.uncle_candidates(&chain), BTreeSet::from([b]));
    }

    #[test]
    fn claimed_uncles_are_not_candidates() {
        let mut chain = Blockchain::new(4);
        let tip = chain.genesis_tip();
        let a = publish_on(&mut chain, tip, &[], 1);
        let b = publish_on(&mut chain, tip, &[], 2);
        let a2 = publish_on(&mut chain, a, &[b], 1);

        let mut view = ChainView::new(&chain);
        for id in [a, b, a2] {
            view.receive(&chain, id);
        }
        assert!(view.uncle_candidates(&chain).is_empty());
    }

    #[test]
    fn uncles_outside_depth_window_are_not_candidates() {
        let mut chain = Blockchain::new(2);
        let tip = chain.genesis_tip();
        let stale = publish_on(&mut chain, tip, &[], 2);

        let mut view = ChainView::new(&chain);
        view.receive(&chain, stale);

        let mut parent = tip;
        let mut heads = vec![];
        for _ in 0..3 {
            parent = publish_on(&mut chain, parent, &[], 1);
            heads.push(parent);
        }
        for id in heads {
            view.receive(&chain, id);
        }

        // The head is three blocks above the genesis tip, so siblings of the
        // first block are out of reach with a depth of two.
        assert!(view.uncle_candidates(&chain).is_empty());
    }
}
