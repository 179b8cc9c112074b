//! skusync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `ScanSession`, `ScanResult`, `CatalogRecord`, `SourceLink`
//! - **Use cases** - `StartScanUseCase`, `SessionProgressUseCase`, `ResolveResultUseCase`
//! - **Port definitions** - Traits for adapters: `ISourceAdapter`, `IScanStore`, `ICatalogRepository`
//! - **State machine** - Scan session lifecycle (pending → running → terminal)
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement (HTTP sources,
//! SQLite persistence). Use cases orchestrate domain entities through port
//! interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
