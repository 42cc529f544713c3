use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::processor::Rendition;

/// The length of the random file id segment.
///
/// 10 alphanumeric characters gives ~59 bits of entropy which makes both
/// collisions within the same millisecond and path guessing negligible.
pub const FILE_ID_LEN: usize = 10;

/// Generates a storage path for the given owner, resource and rendition.
///
/// Paths take the form `{owner}/{resource}/{rendition}_{file_id}_{millis}.jpg`
/// and cannot be derived from the owner/resource ids alone, the random file
/// id must be known.
pub fn generate(owner_id: i64, resource_id: i64, rendition: Rendition) -> String {
    let file_id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(FILE_ID_LEN)
        .map(char::from)
        .collect();
    let timestamp = Utc::now().timestamp_millis();

    format!(
        "{}/{}/{}_{}_{}.jpg",
        owner_id,
        resource_id,
        rendition.as_str(),
        file_id,
        timestamp,
    )
}

/// The common prefix shared by every object belonging to a resource.
pub fn resource_prefix(owner_id: i64, resource_id: i64) -> String {
    format!("{}/{}/", owner_id, resource_id)
}
