/*!
Miners and the GHOST mining procedure

A [`Miner`] owns a [`ChainView`] over the blocks of a simulation run and
extends its preferred tip whenever it finds a block, claiming every eligible
uncle along the way.

# Examples
Two miners find competing blocks; once the blocks are exchanged, the next block
mined claims the losing one as an uncle.

```
use ghost_sim::prelude::*;

let mut chain = Blockchain::new(4);
let mut alice = Miner::new(MinerId::from(1), 1.0, &chain);
let mut bob = Miner::new(MinerId::from(2), 1.0, &chain);

let a = alice.mine(&mut chain).unwrap();
let b = bob.mine(&mut chain).unwrap();
alice.receive(&chain, b);

let c = alice.mine(&mut chain).unwrap();
assert_eq!(chain[c].parent_id, Some(a));
assert!(chain[c].uncles.contains(&b));
```
*/

pub mod view;

pub use view::ChainView;

use log::trace;

use crate::{
    block::BlockId,
    blockchain::{BlockPublishingError, Blockchain},
    power_dist::PowerValue,
};

/// Unique identifier of a [`Miner`]. Corresponds to a [`usize`].
///
/// # Invariants
///
/// `MinerId(0)` is reserved for [`MinerId::GENESIS`], and as such cannot be
/// instantiated outside of this crate. [`MinerId::default`] returns
/// `MinerId(1)`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinerId(pub(crate) usize);

impl MinerId {
    /// The miner credited with the synthetic genesis blocks.
    pub const GENESIS: MinerId = MinerId(0);

    /// Returns the [`usize`] corresponding to this [`MinerId`].
    pub fn get(&self) -> usize {
        self.0
    }
}

impl From<usize> for MinerId {
    fn from(value: usize) -> Self {
        assert_ne!(value, 0, "newly made MinerId must be greater than 0");
        Self(value)
    }
}

impl Default for MinerId {
    fn default() -> Self {
        Self(1)
    }
}

impl std::fmt::Display for MinerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// A miner following the GHOST protocol honestly.
#[derive(Debug, Clone, PartialEq)]
pub struct Miner {
    id: MinerId,
    power: PowerValue,
    view: ChainView,
}

impl Miner {
    /// Creates a miner with hashpower `power` whose view contains the genesis
    /// blocks of `chain`.
    pub fn new(id: MinerId, power: PowerValue, chain: &Blockchain) -> Self {
        Miner { id, power, view: ChainView::new(chain) }
    }

    #[inline]
    pub fn id(&self) -> MinerId {
        self.id
    }

    #[inline]
    pub fn power(&self) -> PowerValue {
        self.power
    }

    #[inline]
    pub fn view(&self) -> &ChainView {
        &self.view
    }

    /// This miner's preferred tip.
    #[inline]
    pub fn head(&self) -> BlockId {
        self.view.head()
    }

    /// Hear about a block. See [`ChainView::receive`].
    #[inline]
    pub fn receive(&mut self, chain: &Blockchain, id: BlockId) -> bool {
        self.view.receive(chain, id)
    }

    /// Mines a block on top of this miner's head, claiming all eligible
    /// uncles, publishes it to `chain` and adopts it as the new head.
    pub fn mine(
        &mut self,
        chain: &mut Blockchain,
    ) -> Result<BlockId, BlockPublishingError> {
        let uncles = self.view.uncle_candidates(chain);
        let block = chain.block_on(self.view.head(), uncles, self.id);
        let id = chain.publish(block)?;

        let adopted = self.view.receive(chain, id);
        debug_assert!(adopted && self.view.head() == id);

        trace!(
            "miner {} mined block {} at height {} with {} uncles",
            self.id,
            id,
            chain[id].height,
            chain[id].uncles.len()
        );

        Ok(id)
    }
}
