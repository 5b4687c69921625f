use anyhow::Result;
use ghost_sim::prelude::*;

const TRANSIT_TIMES: [usize; 5] = [0, 5, 10, 20, 40];

fn main() -> Result<()> {
    env_logger::init();

    for (i, transit_time) in TRANSIT_TIMES.into_iter().enumerate() {
        let simulation = SimulationBuilder::new()
            .rounds(50_000)
            .repeat_all(20)
            .seed(1000 * i as u64)
            .transit_time(transit_time)
            .add_miners(1.0, 2)
            .build()?;

        let results = simulation
            .run_all()?
            .average(Average::Mean)
            .blocks()
            .efficiency()
            .average_uncles()
            .block_time()
            .miner_rewards()
            .format(Format::CSV)
            .build();

        println!("Transit time {}", transit_time);
        println!("{}", results);
    }

    Ok(())
}
