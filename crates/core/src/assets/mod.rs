//! Assets module - domain models, services, and traits.

mod assets_model;
mod assets_service;
mod assets_traits;

#[cfg(test)]
mod assets_service_tests;

pub use assets_model::{Asset, AssetKind, AssetUpdate, HoldingUpdate, NewAsset};
pub use assets_service::AssetService;
pub use assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
