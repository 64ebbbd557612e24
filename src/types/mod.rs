mod detail_level;
mod entity_id;

pub use detail_level::DetailLevel;
pub use entity_id::EntityId;
