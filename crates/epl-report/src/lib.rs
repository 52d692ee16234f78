// Report layer: runs the analysis pipeline, writes the output tables, and
// renders the console summary.

pub mod export;
pub mod pipeline;
pub mod summary;
