// Library root: the optimizer pipeline modules, re-exported for the CLI and
// integration tests.

pub mod config;
pub mod diversify;
pub mod optimizer;
pub mod pool;
pub mod position;
pub mod report;
pub mod slots;
pub mod volatility;
