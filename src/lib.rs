//! Maritime point-to-point route optimizer.
//!
//! A library crate wrapping the route planning core so both the
//! `maritime-router` binary and its test suite can depend on the same
//! types without relinking the gRPC server.

pub mod cache;
pub mod config;
pub mod cost;
pub mod db;
pub mod error;
pub mod geo;
pub mod graph;
pub mod grpc;
pub mod model;
pub mod pathfinder;
pub mod planner;
pub mod ports;
pub mod routing;
pub mod telemetry;
