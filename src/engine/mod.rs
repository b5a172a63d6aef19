pub mod aggregate;
pub mod approval;
pub mod overlap;
pub mod partition;
