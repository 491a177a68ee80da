use std::process::exit;
use chrono::Local;
use log::error;
use crate::conditions::ConditionCodes;
use crate::initialization::init;
use crate::worker::Pipeline;

mod aggregation;
mod conditions;
mod config;
mod errors;
mod estimator;
mod evaluation;
mod features;
mod forecasting;
mod initialization;
mod manager_history;
mod manager_results;
mod models;
mod worker;
#[cfg(test)]
mod testing;

fn main() {
    let (config, mgr) = match init() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let today = config.forecast.today.unwrap_or_else(|| Local::now().date_naive());
    let codes = ConditionCodes::default();

    let pipeline = Pipeline::new(&config.forecast, &codes, &config.conditions, &mgr.factory, today);
    if let Err(e) = pipeline.run(&mgr.store, &mgr.sink) {
        error!("{:#}", e);
        exit(1);
    }
}
