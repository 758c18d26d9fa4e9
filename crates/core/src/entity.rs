//! Entity trait: identity + continuity across state changes.

/// Records stored in a keyed collection (items, assets, suppliers, users...).
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
