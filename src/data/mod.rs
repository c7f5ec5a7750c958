//! Data layer: core types, loading, and the frame model.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → RawTable
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ RawTable  │  untyped named columns
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ IamFrame  │  Vec<Observation> + Meta table
//!   └──────────┘
//! ```

pub mod frame;
pub mod loader;
pub mod meta;
pub mod model;
