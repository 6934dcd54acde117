//! # sfstat Core Library
//!
//! A statistics engine for ion-channel selectivity-filter occupancy, built on
//! the per-frame site states reported by the `xtck` trajectory analysis tool.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear separation of concerns,
//! making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`StateTable`, `SiteLabel`,
//!   `SimulationMetadata`) and the parser for the fixed xtck log format.
//!
//! - **[`engine`]: The Logic Core.** Computes the statistics for a single run: site occupancy
//!   fractions, coarse-grained state-pattern distributions, and non-parametric bootstrap
//!   confidence intervals. The [`engine::run::Run`] handle ties one parsed log to these
//!   operations.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer. It combines
//!   per-run engine results across the replicas of an HREX ensemble into cross-replica
//!   aggregates.

pub mod core;
pub mod engine;
pub mod workflows;
