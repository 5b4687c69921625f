use std::env;

use anyhow::{Context, Result};
use ghost_sim::prelude::*;

fn env_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => {
            let parsed = value
                .parse()
                .with_context(|| format!("invalid value for {}", name))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut builder = SimulationBuilder::new()
        .params(Params::default())
        .add_miners(1.0, 25)
        .power_values([5.0, 5.0, 5.0, 5.0, 5.0, 10.0, 15.0, 25.0]);

    if let Some(rounds) = env_var("GHOST_ROUNDS")? {
        builder = builder.rounds(rounds);
    }
    if let Some(seed) = env_var("GHOST_SEED")? {
        builder = builder.seed(seed);
    }
    let print_chain = env_var("GHOST_PRINT_CHAIN")?.unwrap_or(false);

    let output = builder.build()?.run_all()?.data().remove(0);

    println!("{}", output.report().with_chain(print_chain));

    Ok(())
}
