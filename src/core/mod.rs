pub mod report;
pub mod sampler;
pub mod tally;
