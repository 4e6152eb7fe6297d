use std::path::PathBuf;

use clap::Parser;
use eyre::Result;
use kunlun_allocation::{metrics, AllocationConfig};
use tracing::info;

use crate::{replay::Replayer, scenario::Scenario};

#[derive(Debug, Parser)]
pub struct ReplayCommand {
    /// Path to the JSON scenario to replay
    #[clap(long)]
    scenario: PathBuf,

    /// Blocks a slashable deallocation stays encumbered, overriding the scenario
    #[clap(long, env = "DEALLOCATION_DELAY")]
    deallocation_delay: Option<u32>,

    /// Blocks before a new allocation delay takes effect, overriding the scenario
    #[clap(long, env = "ALLOCATION_CONFIGURATION_DELAY")]
    allocation_configuration_delay: Option<u32>,

    /// Include the committed ledger events in the report
    #[clap(long)]
    print_events: bool,

    /// Print the prometheus metrics after the report
    #[clap(long)]
    print_metrics: bool,

    /// Abort on the first failing step
    #[clap(long)]
    fail_fast: bool,
}

impl ReplayCommand {
    pub fn execute(&self) -> Result<()> {
        let scenario = Scenario::from_file(&self.scenario)?;
        let config = self.config(&scenario);
        info!(
            scenario = %self.scenario.display(),
            steps = scenario.steps.len(),
            deallocation_delay = config.deallocation_delay,
            allocation_configuration_delay = config.allocation_configuration_delay,
            "replaying scenario"
        );

        let replayer = Replayer::new(config, &scenario, self.fail_fast);
        let report = replayer.run(&scenario, self.print_events)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if self.print_metrics {
            println!("{}", metrics::gather()?);
        }
        Ok(())
    }

    fn config(&self, scenario: &Scenario) -> AllocationConfig {
        let mut config = scenario.config.unwrap_or_default();
        if let Some(deallocation_delay) = self.deallocation_delay {
            config.deallocation_delay = deallocation_delay;
        }
        if let Some(allocation_configuration_delay) = self.allocation_configuration_delay {
            config.allocation_configuration_delay = allocation_configuration_delay;
        }
        config
    }
}
