pub mod support;

mod pipeline_scenarios;
