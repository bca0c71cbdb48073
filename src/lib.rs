// Library root
// -----------
// This crate exposes the library surface of the `sidework-utils` CLI. The
// binary (`main.rs`) parses flags and runs the requested actions in order.
//
// Module responsibilities:
// - `config`: secret files and the client configuration.
// - `model`: API records, targets, filters and board scheduling.
// - `api`: the `FleetApi` trait and its blocking HTTP implementation.
// - `ui`: the `Prompter` trait, terminal menus and confirmation gates.
// - `present` / `report`: console tables and report files.
// - `commands`: listings, machine status, log downloads, graphing.
// - `workflow`: the interactive firmware update run.
// - `graph`: temperature CSV repair, parsing and charting.
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod graph;
pub mod logging;
pub mod model;
pub mod present;
pub mod report;
pub mod ui;
pub mod workflow;
