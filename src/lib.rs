pub mod boundary;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod orientation;
pub mod pipeline;
pub mod pose;
pub mod report;
pub mod shot;
