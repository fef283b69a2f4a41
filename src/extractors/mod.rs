// src/extractors/mod.rs
pub mod shipment;

// Re-export key extraction types for convenience
pub use shipment::{
    extract_data,
    extract_from_source,
    ExtractionStrategy,
    PatternExtractionStrategy,
    Record,
    ShipmentExtractor,
    StrategyKind,
    TagSpan,
    TreeExtractionStrategy,
};
