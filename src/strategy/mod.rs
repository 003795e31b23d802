pub mod forecasting;
pub mod implementations;
pub mod optimization;
pub mod traits;
