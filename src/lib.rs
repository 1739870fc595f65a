//! # Fidelity Engine
//!
//! Capability negotiation and tiered configuration for visual-fidelity features:
//! hardware ray tracing, AI upscaling, frame generation and a software
//! path-tracing fallback.
//!
//! ## Features
//!
//! - **Capability Probe**: GPU classification from the device string (see `fidelity_engine_hardware`)
//! - **Tier Selection**: Hardware / Software / Approximation / Disabled with strict fallback ordering
//! - **Feature Controllers**: per-feature state machines and derived parameter sets
//! - **Settings Ledger**: every host parameter change is recorded and restored exactly once
//! - **Orchestrator**: two-phase activation, toggles, reconfiguration and a JSON status surface
//!
//! ### Example
//!
//! ```
//! use fidelity_engine::config::GraphicsConfig;
//! use fidelity_engine::enhancer::FidelityEnhancer;
//! use fidelity_engine::host::SimulatedHost;
//!
//! let mut host = SimulatedHost::new("AMD Radeon RX 7900 XTX");
//! let mut enhancer = FidelityEnhancer::construct(
//!     GraphicsConfig { enable_ray_tracing: true, ..GraphicsConfig::default() },
//!     &host,
//! );
//! enhancer.activate_after_host_ready(&mut host);
//! enhancer.shutdown(&mut host);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: errors, diagnostics, logging
//! - [`config`]: user options and loaders
//! - [`host`]: host engine boundary and the simulated host
//! - [`ledger`]: settings snapshot/restore
//! - [`features`]: feature controllers
//! - [`tier`]: tier selection
//! - [`enhancer`]: orchestrator

/// Errors, diagnostics and logging
pub mod core;
/// Configuration system
pub mod config;
/// Host engine boundary
pub mod host;
/// Settings snapshot/restore ledger
pub mod ledger;
/// Feature controllers
pub mod features;
/// Tier selection
pub mod tier;
/// Orchestrator
pub mod enhancer;


pub use enhancer::{EnhancerStatus, FidelityEnhancer};
pub use fidelity_engine_hardware::{probe, DeviceCapabilities, UpscalingQuality, VendorFamily};
pub use tier::{select_tier, ActivationPlan, FeatureRequest, QualityTier};
