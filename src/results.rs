/*!
Presenting simulation result data

# Working with [`ResultsBuilder`]

## Examples

Creating a [`ResultsTable`] after running a simulation group:

```
use ghost_sim::prelude::*;

let sim = SimulationBuilder::new()
    .add_miners(1.0, 2)
    .add_miner(2.0)
    .rounds(500)
    .transit_time(3)
    .repeat_all(4)
    .seed(1)
    .build()
    .unwrap();

let results_builder = sim.run_all().unwrap();

let results = results_builder
    .average(Average::Median) // Take the median of repeated runs' results
    .cohort_rewards()         // Include normalized reward per hashpower cohort
    .average_uncles()         // Include the mean number of uncles per block
    .format(Format::CSV)      // Output results as CSV
    .build();

println!("{}", results);
```

A single run can be printed with [`RunReport`]:

```
use ghost_sim::prelude::*;

let output = SimulationBuilder::new()
    .add_miners(1.0, 3)
    .rounds(300)
    .seed(2)
    .build()
    .unwrap()
    .run_all()
    .unwrap()
    .data()
    .remove(0);

println!("{}", output.report());
```
*/

use std::{collections::BTreeSet, fmt::Display, num::NonZeroUsize};

use crate::{miner::MinerId, simulation::SimulationOutput};

/// Floating point precision of results data.
pub const FLOAT_PRECISION_DIGITS: usize = 6;

/// Builder for [`ResultsTable`]. Produced by running a
/// [`SimulationGroup`](crate::simulation::SimulationGroup).
#[derive(Debug, Clone)]
pub struct ResultsBuilder {
    average: Average,
    columns: BTreeSet<Column>,
    data: Vec<SimulationOutput>,
    format: Format,
    repeated: NonZeroUsize,
}

/// Describes the appearance of a [`ResultsTable`] table as given by its
/// [`Display`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub enum Format {
    /// Comma-separated, without extra whitespace.
    CSV,
    /// Human-readable.
    #[default]
    PrettyPrint,
}

impl ResultsBuilder {
    pub(crate) fn new(
        data: Vec<SimulationOutput>,
        repeated: NonZeroUsize,
    ) -> Self {
        Self {
            data,
            repeated,
            average: Average::default(),
            columns: BTreeSet::default(),
            format: Format::default(),
        }
    }

    /// Include every column except averaging, which must still be requested
    /// with [`ResultsBuilder::average`].
    pub fn all(self) -> Self {
        self.miner_rewards()
            .cohort_rewards()
            .blocks()
            .efficiency()
            .average_uncles()
            .chain_length()
            .block_time()
            .rounds()
    }

    /// Average the results of repeated simulations based on the given
    /// [`Average`] type. For types other than [`Average::None`], a column
    /// describing the averaging method will be included in the results table.
    pub fn average(mut self, average: Average) -> Self {
        self.average = average;

        self
    }

    /// Include a "Miner `X` Reward" column for each miner `X`.
    pub fn miner_rewards(mut self) -> Self {
        for (miner_id, _) in self.data[0].powers.miners() {
            self.columns.insert(Column::MinerReward(miner_id));
        }

        self
    }

    /// Include a "Power `P` Normalized Reward" column for each group of miners
    /// with equal power `P`.
    pub fn cohort_rewards(mut self) -> Self {
        for i in 0..self.data[0].powers.cohorts().len() {
            self.columns.insert(Column::CohortReward(i));
        }

        self
    }

    /// Include the "Blocks Mined" and "Blocks In Chain" columns.
    pub fn blocks(mut self) -> Self {
        self.columns.insert(Column::BlocksMined);
        self.columns.insert(Column::BlocksInChain);

        self
    }

    pub fn efficiency(mut self) -> Self {
        self.columns.insert(Column::Efficiency);

        self
    }

    pub fn average_uncles(mut self) -> Self {
        self.columns.insert(Column::AverageUncles);

        self
    }

    pub fn chain_length(mut self) -> Self {
        self.columns.insert(Column::ChainLength);

        self
    }

    pub fn block_time(mut self) -> Self {
        self.columns.insert(Column::BlockTime);

        self
    }

    /// Include the "Simulated Rounds" column.
    pub fn rounds(mut self) -> Self {
        self.columns.insert(Column::Rounds);

        self
    }

    /// Specify the [`Format`] of the results table.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;

        self
    }

    /// Extract the raw [`SimulationOutput`] data from this [`ResultsBuilder`],
    /// in the order the runs were seeded.
    pub fn data(self) -> Vec<SimulationOutput> {
        self.data
    }

    /// Create new [`ResultsTable`].
    pub fn build(self) -> ResultsTable {
        let ResultsBuilder { average, mut columns, data, format, repeated } =
            self;

        for (miner_id, _) in data[0].powers.miners() {
            columns.insert(Column::MiningPower(miner_id));
        }

        if average != Average::None {
            columns.insert(Column::AverageOf(average));
        }

        let columns = Vec::from_iter(columns);
        let titles = columns.iter().map(|col| col.title(&data[0])).collect();
        let rows = match average {
            Average::None => data
                .iter()
                .map(|output| {
                    columns.iter().map(|col| col.get_value(output)).collect()
                })
                .collect(),
            _ => data
                .chunks(repeated.get())
                .map(|outputs| {
                    columns
                        .iter()
                        .map(|col| col.get_average_value(average, outputs))
                        .collect()
                })
                .collect(),
        };

        ResultsTable { titles, format, rows }
    }
}

/// Formatted results from the completion of a
/// [`SimulationGroup`](crate::simulation::SimulationGroup). The results table
/// is given by the struct's [`Display`] implementation, as specified by its
/// [`Format`].
pub struct ResultsTable {
    titles: Vec<String>,
    format: Format,
    rows: Vec<Vec<Value>>,
}

impl ResultsTable {
    const SEPARATOR_VERTICAL: char = '|';
    const SEPARATOR_HORIZONTAL: char = '-';

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }
}

impl Display for ResultsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.format {
            Format::CSV => {
                write!(f, "{}", self.titles.join(","))?;

                for row in self.rows.iter() {
                    writeln!(f)?;

                    let row: Vec<_> =
                        row.iter().map(|val| val.to_string()).collect();

                    write!(f, "{}", row.join(","))?;
                }
            }
            Format::PrettyPrint => {
                let mut text_widths: Vec<_> =
                    self.titles.iter().map(|title| title.len()).collect();

                for row in self.rows.iter() {
                    for (i, val) in row.iter().enumerate() {
                        let width = val.to_string().len();
                        text_widths[i] = text_widths[i].max(width);
                    }
                }

                for (i, title) in self.titles.iter().enumerate() {
                    write!(
                        f,
                        " {:1$} {2}",
                        title,
                        text_widths[i],
                        Self::SEPARATOR_VERTICAL
                    )?;
                }
                writeln!(f)?;

                let total_width: usize =
                    text_widths.iter().map(|x| x + 3).sum();
                for _ in 0..total_width {
                    write!(f, "{}", Self::SEPARATOR_HORIZONTAL)?;
                }

                for row in self.rows.iter() {
                    writeln!(f)?;

                    for (i, val) in row.iter().enumerate() {
                        write!(
                            f,
                            " {:1$} {2}",
                            val.to_string(),
                            text_widths[i],
                            Self::SEPARATOR_VERTICAL
                        )?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Methods of extracting an average/central value from a set of repeated
/// simulations.
///
/// Only applied to the values of columns which change between runs. Runs for
/// which a statistic is undefined are left out of its average.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Average {
    /// Include all repeated values.
    #[default]
    None,
    /// Arithmetic mean of all values.
    Mean,
    /// Median of all values.
    Median,
    /// Maximum of all values.
    Max,
    /// Minimum of all values.
    Min,
}

/// Type of column that can appear in a results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Column {
    // Variant order determines the order of columns in results tables
    MiningPower(MinerId),
    MinerReward(MinerId),
    /// Index into the cohorts of the simulation's power distribution.
    CohortReward(usize),
    Rounds,
    AverageOf(Average),
    BlocksMined,
    BlocksInChain,
    Efficiency,
    AverageUncles,
    ChainLength,
    BlockTime,
}

/// Single cell of a results table.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(usize),
    Float(f64),
    Missing,
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Value::Missing, Value::Float)
    }
}

impl Value {
    fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(i) => Some(i as f64),
            Value::Float(fl) => Some(fl),
            Value::Missing => None,
        }
    }
}

impl Column {
    fn title(&self, output: &SimulationOutput) -> String {
        match &self {
            Self::MiningPower(miner_id) => format!("Miner {} Power", miner_id),
            Self::MinerReward(miner_id) => format!("Miner {} Reward", miner_id),
            Self::CohortReward(i) => {
                let power = output.powers.cohorts()[*i].power;
                format!("Power {} Normalized Reward", power)
            }
            Self::Rounds => "Simulated Rounds".into(),
            Self::AverageOf(method) => match method {
                Average::Mean => "Mean Of".into(),
                Average::Median => "Median Of".into(),
                Average::Max => "Max Of".into(),
                Average::Min => "Min Of".into(),
                Average::None => unreachable!(),
            },
            Self::BlocksMined => "Blocks Mined".into(),
            Self::BlocksInChain => "Blocks In Chain".into(),
            Self::Efficiency => "Efficiency".into(),
            Self::AverageUncles => "Average Uncles".into(),
            Self::ChainLength => "Chain Length".into(),
            Self::BlockTime => "Block Time".into(),
        }
    }

    fn get_value(&self, output: &SimulationOutput) -> Value {
        let rewards = &output.rewards;

        match &self {
            Self::MiningPower(miner_id) => {
                output.powers.power_of(*miner_id).into()
            }
            Self::MinerReward(miner_id) => {
                Value::Float(rewards.reward_of(*miner_id))
            }
            Self::CohortReward(i) => rewards
                .cohort_rewards(&output.powers)
                .get(*i)
                .and_then(|cohort| cohort.normalized)
                .into(),
            Self::Rounds => Value::Int(output.params.rounds),
            Self::BlocksMined => Value::Int(rewards.blocks_mined()),
            Self::BlocksInChain => Value::Int(rewards.blocks_in_chain()),
            Self::Efficiency => rewards.efficiency().into(),
            Self::AverageUncles => rewards.average_uncles().into(),
            Self::ChainLength => Value::Int(rewards.chain_length()),
            Self::BlockTime => rewards.block_time().into(),
            Self::AverageOf(_) => unreachable!(
                "never need the single value of the average descriptor column"
            ),
        }
    }

    fn get_average_value(
        &self,
        method: Average,
        data: &[SimulationOutput],
    ) -> Value {
        match &self {
            Self::AverageOf(_) => return Value::Int(data.len()),
            Self::MiningPower(_) | Self::Rounds => {
                return self.get_value(&data[0])
            }
            _ => (),
        }

        let vls: Vec<_> = data
            .iter()
            .filter_map(|output| self.get_value(output).as_f64())
            .collect();

        if vls.is_empty() {
            return Value::Missing;
        }

        let avg = match method {
            Average::Mean => vls.iter().sum::<f64>() / vls.len() as f64,
            Average::Median => crate::utils::median_of_floats(vls),
            Average::Max => vls.into_iter().fold(f64::MIN, f64::max),
            Average::Min => vls.into_iter().fold(f64::MAX, f64::min),
            Average::None => unreachable!(),
        };

        Value::Float(avg)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{:.1$}", fl, FLOAT_PRECISION_DIGITS),
            Self::Missing => write!(f, "-"),
        }
    }
}

/// Human-readable summary of a single run: every miner's final head, the
/// reward of each miner, normalized rewards per hashpower cohort, and chain
/// statistics. Optionally preceded by the canonical chain, block by block.
pub struct RunReport<'a> {
    output: &'a SimulationOutput,
    chain: bool,
}

impl<'a> RunReport<'a> {
    pub fn new(output: &'a SimulationOutput) -> Self {
        Self { output, chain: false }
    }

    /// Include the canonical chain walk-through, from the reference miner's
    /// head down to the genesis blocks.
    pub fn with_chain(mut self, chain: bool) -> Self {
        self.chain = chain;

        self
    }
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(
        || Value::Missing.to_string(),
        |v| Value::Float(v).to_string(),
    )
}

impl Display for RunReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let output = self.output;
        let rewards = &output.rewards;

        if self.chain {
            writeln!(f, "### CHAIN ###")?;
            for block in rewards.chain_walk(&output.chain) {
                let uncles: Vec<_> =
                    block.uncles.iter().map(|u| u.to_string()).collect();

                writeln!(
                    f,
                    "block {} miner {} height {} score {} uncles [{}]",
                    block.id,
                    block.miner_id,
                    block.height,
                    block.score,
                    uncles.join(", ")
                )?;
            }
        }

        writeln!(f, "### HEADS ###")?;
        for miner in &output.miners {
            writeln!(f, "miner {}: {}", miner.id(), miner.head())?;
        }

        writeln!(f, "### REWARDS ###")?;
        for miner in &output.miners {
            writeln!(
                f,
                "miner {} (power {}): {}",
                miner.id(),
                miner.power(),
                Value::Float(rewards.reward_of(miner.id()))
            )?;
        }

        writeln!(f, "### NORMALIZED REWARDS ###")?;
        for cohort in rewards.cohort_rewards(&output.powers) {
            writeln!(
                f,
                "power {} ({} miners): {}",
                cohort.power,
                cohort.miners,
                fmt_stat(cohort.normalized)
            )?;
        }

        writeln!(f, "### RESULTS ###")?;
        writeln!(f, "Seed: {}", output.seed)?;
        writeln!(f, "Total blocks produced: {}", rewards.blocks_mined())?;
        writeln!(f, "Total blocks in chain: {}", rewards.blocks_in_chain())?;
        writeln!(f, "Efficiency: {}", fmt_stat(rewards.efficiency()))?;
        writeln!(f, "Average uncles: {}", fmt_stat(rewards.average_uncles()))?;
        writeln!(f, "Length of chain: {}", rewards.chain_length())?;
        write!(f, "Block time: {}", fmt_stat(rewards.block_time()))
    }
}
