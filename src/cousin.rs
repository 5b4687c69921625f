//! Generation distance between blocks

use crate::{block::BlockId, blockchain::Blockchain, miner::ChainView};

/// If `b1` is the n-th degree descendant and `b2` the m-th degree descendant
/// of their nearest common ancestor, returns `min(n, m)`.
///
/// Ancestry is resolved through `chain`, restricted to the blocks known to
/// `view`. A block is at distance 0 from itself and from its own ancestors.
///
/// ## Panics
/// If either block is unknown to `view`.
pub fn cousin_degree(
    chain: &Blockchain,
    view: &ChainView,
    b1: BlockId,
    b2: BlockId,
) -> u64 {
    assert!(view.contains(b1), "view does not contain block {}", b1);
    assert!(view.contains(b2), "view does not contain block {}", b2);

    let height = chain[b1].height.min(chain[b2].height);
    let at_height = |id: BlockId| {
        chain
            .ancestors_of(id)
            .find(|block| block.height == height)
            .map(|block| block.id)
            .expect("every block descends from the root genesis block")
    };

    let mut b1 = at_height(b1);
    let mut b2 = at_height(b2);
    let mut degree = 0;
    while b1 != b2 {
        b1 = parent_of(chain, b1);
        b2 = parent_of(chain, b2);
        degree += 1;
    }

    degree
}

fn parent_of(chain: &Blockchain, id: BlockId) -> BlockId {
    chain[id]
        .parent_id
        .expect("blocks at equal height share the root genesis block")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::cousin_degree;
    use crate::{
        block::BlockId,
        blockchain::Blockchain,
        miner::{ChainView, MinerId},
    };

    fn extend(
        chain: &mut Blockchain,
        parent: BlockId,
        n: usize,
    ) -> Vec<BlockId> {
        let mut ids = vec![];
        let mut parent = parent;
        for _ in 0..n {
            let block = chain.block_on(parent, BTreeSet::new(), MinerId(1));
            parent = chain.publish(block).unwrap();
            ids.push(parent);
        }
        ids
    }

    fn view_of(chain: &Blockchain) -> ChainView {
        let mut view = ChainView::new(chain);
        for block in chain.mined() {
            view.receive(chain, block.id);
        }
        view
    }

    #[test]
    fn degree_of_related_blocks() {
        let mut chain = Blockchain::new(4);
        let tip = chain.genesis_tip();
        let left = extend(&mut chain, tip, 3);
        let right = extend(&mut chain, tip, 2);
        let view = view_of(&chain);

        // Siblings are first cousins.
        assert_eq!(cousin_degree(&chain, &view, left[0], right[0]), 1);
        assert_eq!(cousin_degree(&chain, &view, left[1], right[1]), 2);
        // Heights differ: counted from the shallower block.
        assert_eq!(cousin_degree(&chain, &view, left[2], right[0]), 1);
        // A block and its ancestor.
        assert_eq!(cousin_degree(&chain, &view, left[2], left[0]), 0);
        assert_eq!(cousin_degree(&chain, &view, left[1], tip), 0);
    }

    #[test]
    fn degree_is_symmetric_and_reflexive() {
        let mut chain = Blockchain::new(3);
        let tip = chain.genesis_tip();
        let mut blocks = extend(&mut chain, tip, 2);
        let first = blocks[0];
        blocks.extend(extend(&mut chain, first, 2));
        blocks.extend(extend(&mut chain, BlockId(2), 3));
        let view = view_of(&chain);

        for &a in &blocks {
            assert_eq!(cousin_degree(&chain, &view, a, a), 0);
            for &b in &blocks {
                assert_eq!(
                    cousin_degree(&chain, &view, a, b),
                    cousin_degree(&chain, &view, b, a)
                );
            }
        }
    }

    #[test]
    #[should_panic]
    fn unknown_block_panics() {
        let mut chain = Blockchain::new(2);
        let tip = chain.genesis_tip();
        let ids = extend(&mut chain, tip, 1);
        let view = ChainView::new(&chain);

        cousin_degree(&chain, &view, ids[0], tip);
    }
}
