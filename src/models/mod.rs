pub mod observation;
pub mod forecast;
pub mod performance;
