pub mod applications;
pub mod enrichment;

pub use enrichment::enrich_applications;
