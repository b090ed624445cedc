pub mod simulation;

pub use simulation::{
    simulate, McDistribution, McPercentiles, MetricDistribution, MetricStatistics, SampleMode,
    SimulationInput, SimulationOutput, SimulationVariable,
};
