pub mod time;

use nanoid::nanoid;

/// Generate a run id.
pub fn longid() -> String {
    nanoid!(21)
}

/// Generate a row id for engine-owned records (steps, deliveries).
pub fn rowid() -> String {
    uuid::Uuid::new_v4().to_string()
}
