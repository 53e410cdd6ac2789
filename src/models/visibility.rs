// Organization ownership rule shared by every consumer of planning items
//
// An item is visible to a viewing organization when it is a default item,
// has no owning organization, or is owned by the viewer.

/// Anything that may be owned by an organization.
pub trait Owned {
    fn owner(&self) -> Option<u64>;

    fn is_default(&self) -> bool {
        false
    }
}

/// Whether `item` is visible to the organization `viewer`.
///
/// A viewer without an organization only sees default and unowned items.
pub fn is_visible_to<T: Owned + ?Sized>(item: &T, viewer: Option<u64>) -> bool {
    if item.is_default() {
        return true;
    }
    match item.owner() {
        None => true,
        Some(owner) => viewer == Some(owner),
    }
}

/// Keep only the items visible to `viewer`, preserving order.
pub fn visible_to<T: Owned>(items: Vec<T>, viewer: Option<u64>) -> Vec<T> {
    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| is_visible_to(item, viewer))
        .collect();
    if kept.len() != before {
        tracing::debug!(
            kept = kept.len(),
            hidden = before - kept.len(),
            ?viewer,
            "Filtered items owned by other organizations"
        );
    }
    kept
}
