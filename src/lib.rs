/*!
Simulator for proof-of-work mining under a GHOST-style fork-choice rule.

Miners extend the tip with the highest score in their local view, where a
block's score counts every block on its chain plus every uncle those blocks
include. Blocks reach other miners after a fixed transit delay, and rewards
are tallied along the canonical chain once all rounds have been simulated.

```
use ghost_sim::prelude::*;

let sim = SimulationBuilder::new()
    .add_miners(1.0, 4)
    .add_miner(4.0)
    .rounds(2_000)
    .seed(42)
    .build()
    .unwrap();

let output = sim.run_all().unwrap().data().remove(0);
let rewards = &output.rewards;

assert!(rewards.blocks_in_chain() <= rewards.blocks_mined());
println!("{}", output.report());
```
*/

pub mod block;
pub mod blockchain;
pub mod cousin;
pub mod miner;
pub mod network;
pub mod params;
pub mod power_dist;
pub mod prelude;
pub mod results;
pub mod rewards;
pub mod simulation;

pub(crate) mod utils;
