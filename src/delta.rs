use crate::types::ItemDescriptor;
use std::collections::HashSet;

/// Return the items from `listing` whose id is not in `processed_ids`,
/// preserving the listing order (typically newest first). Matching is by
/// item id only; titles and other descriptive fields play no part.
pub fn diff<'a>(
    listing: &'a [ItemDescriptor],
    processed_ids: &HashSet<String>,
) -> Vec<&'a ItemDescriptor> {
    listing
        .iter()
        .filter(|item| !processed_ids.contains(&item.item_id))
        .collect()
}
