pub mod aggregator;
pub mod clock;
pub mod config;
pub mod consts;
pub mod dispatcher;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod indicator;
pub mod message;
pub mod queue;
pub mod unit;
