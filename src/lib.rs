//! # bean-synth
//!
//! Bean-style accessor synthesis for Java classes: every public, non-static,
//! non-final field gets a `getX()`/`setX(T)` pair unless the class already
//! declares one, in which case the declared accessor is kept.
//!
//! ## Architecture
//!
//! - **model**: Field, method and class descriptors plus accessor pairs
//! - **synth**: The property synthesizer and its signature-compatibility rules
//! - **structure**: Java class extraction using tree-sitter AST parsing
//! - **emit**: Rendering accessors as Java and splicing them into sources
//! - **bean**: Runtime property interface dispatching through the accessor table
//! - **sources**: Loading compilation units from files, directories and sources jars
//! - **scan**: Java source discovery in directory trees
//! - **report**: Per-file reports with cache lookups and parallel rewriting
//! - **cache**: Persistent report storage using heed (LMDB)
//! - **config**: Database path and emit option resolution

pub mod bean;
pub mod cache;
pub mod cli;
pub mod config;
pub mod emit;
pub mod model;
pub mod report;
pub mod scan;
pub mod sources;
pub mod structure;
pub mod synth;
