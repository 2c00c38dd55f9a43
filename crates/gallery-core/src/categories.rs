//! Category lookup.
//!
//! Entries and remote records reference categories by **title**, not id.
//! Every title → category join goes through [`find_by_title`] so the join
//! key can change in one place.

use crate::models::Category;

/// Find the category an entry label refers to.
pub fn find_by_title<'a>(categories: &'a [Category], label: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.title == label)
}

/// Whether a list of entry labels references `category`.
pub fn is_tagged_with(labels: &[String], category: &Category) -> bool {
    labels.iter().any(|label| label == &category.title)
}
