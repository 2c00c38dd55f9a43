//! Merging the live listing with fixed entries and the persisted order.

use std::collections::HashMap;

use gallery_core::RemoteFileRecord;

/// Compute the display sequence.
///
/// Candidates are the remote records followed by the immutable entries whose
/// keys the listing does not already contain (remote wins on collision).
///
/// With an empty `order` the candidates are returned in arrival order. With
/// a non-empty `order`, keys are taken in persisted order, stale keys are
/// skipped, and candidates the order does not mention are placed in front in
/// arrival order.
pub fn merge_order(
    remote: Vec<RemoteFileRecord>,
    immutable: &[RemoteFileRecord],
    order: &[String],
) -> Vec<RemoteFileRecord> {
    let mut arrival: Vec<String> = Vec::with_capacity(remote.len() + immutable.len());
    let mut pool: HashMap<String, RemoteFileRecord> = HashMap::with_capacity(arrival.capacity());

    for record in remote.into_iter().chain(immutable.iter().cloned()) {
        if pool.contains_key(&record.key) {
            continue;
        }
        arrival.push(record.key.clone());
        pool.insert(record.key.clone(), record);
    }

    let ordered: Vec<RemoteFileRecord> = order.iter().filter_map(|key| pool.remove(key)).collect();

    let mut merged: Vec<RemoteFileRecord> = arrival.iter().filter_map(|key| pool.remove(key)).collect();
    merged.extend(ordered);
    merged
}

/// Keys of `records`, in order.
pub fn keys_of(records: &[RemoteFileRecord]) -> Vec<String> {
    records.iter().map(|r| r.key.clone()).collect()
}
