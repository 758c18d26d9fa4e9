//! Fixed assets (vacuum cleaners, radios, laptops, trolleys) and who holds them.

pub mod asset;

pub use asset::{Asset, AssetDraft, AssetId, AssetStatus};
