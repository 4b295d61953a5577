//! Domain layer types and invariants.

pub mod sections;
pub mod snapshot;

pub use placard_api_types::{Asset, AssetType, AssetUpdate};
pub use sections::{AssetSection, SectionGroups};
pub use snapshot::ConfigSnapshot;
