pub mod cli;
pub mod headless;
pub mod report;
