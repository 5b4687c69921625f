/*!
Re-export of common values and datatypes

Must be imported manually.

```
use ghost_sim::prelude::*;
```
*/

use crate::{
    block, blockchain, cousin, miner, network, params, power_dist, results,
    rewards, simulation,
};

pub use block::{Block, BlockId};

pub use blockchain::{BlockPublishingError, Blockchain};

pub use cousin::cousin_degree;

pub use miner::{ChainView, Miner, MinerId};

pub use network::{Delivery, DeliveryQueue};

pub use params::Params;

pub use power_dist::{
    Cohort, PowerDistribution, PowerDistributionError, PowerValue,
};

pub use results::{Average, Format, ResultsBuilder, ResultsTable, RunReport};

pub use rewards::{CohortReward, RewardAccounting};

pub use simulation::{
    SimulationBuildError, SimulationBuilder, SimulationError, SimulationGroup,
    SimulationOutput,
};
