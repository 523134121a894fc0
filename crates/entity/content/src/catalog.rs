//! Built-in campout catalog.
//!
//! ```text
//! Scout ──< CampoutScout >── Campout ──< Activity
//! ```
//!
//! Activities and sign-ups store a reference to their campout (and scout);
//! the reverse direction is a has-many query.

use entity_core::{BelongsTo, EntityType, HasMany};

pub fn scout() -> EntityType {
    EntityType::new("Scout")
        .fields(["name", "rank"])
        .has_many(HasMany::new("campout_scouts"))
}

pub fn campout() -> EntityType {
    EntityType::new("Campout")
        .fields(["start_time", "end_time", "location"])
        .has_many(HasMany::new("activitys"))
        .has_many(HasMany::new("campout_scouts"))
}

pub fn activity() -> EntityType {
    EntityType::new("Activity")
        .field("name")
        .belongs_to(BelongsTo::new("campout"))
}

/// Join type linking a scout to a campout they attend.
pub fn campout_scout() -> EntityType {
    EntityType::new("CampoutScout")
        .belongs_to(BelongsTo::new("scout"))
        .belongs_to(BelongsTo::new("campout"))
}

/// Every catalog type, in the order a host would typically declare them.
pub fn campout_catalog() -> Vec<EntityType> {
    vec![activity(), campout(), campout_scout(), scout()]
}
