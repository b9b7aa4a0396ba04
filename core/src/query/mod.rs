//! The record query engine.
//!
//! PIPELINE (fixed order, never reordered):
//!   1. filter   (view baseline, then user criteria)
//!   2. sort
//!   3. paginate (display only)
//!   4. export   (full filtered set, ignores pagination)
//!
//! RULES:
//!   - Every stage is a pure function of its inputs.
//!   - Filter/sort changes recompute from the full record set.
//!   - Paginating before filtering is never allowed.

pub mod export;
pub mod filter;
pub mod page;
pub mod sort;

pub use export::export_csv;
pub use filter::{filter_records, Choice, Criteria};
pub use page::{paginate, Page, PageSpec};
pub use sort::{sort_records, SortDirection, SortKey, SortSpec};

use crate::record::Record;
use crate::types::Amount;

/// One listing screen: which records it shows by default and how it
/// exports them.
pub trait View {
    type Record: Record;
    type Criteria: Criteria<Self::Record> + Default + Clone;

    /// Document-type slug used in export filenames.
    fn slug(&self) -> &'static str;

    /// First metadata line of an export.
    fn title(&self) -> &str;

    /// Fixed predicate applied before user criteria.
    fn baseline(&self, _record: &Self::Record) -> bool {
        true
    }

    /// Lines placed between the export date and the record count.
    fn extra_metadata(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether exports carry a "Total Amount" line, even when empty.
    fn has_amount(&self) -> bool {
        false
    }

    /// Amount summed into the export's aggregate line.
    fn amount(&self, _record: &Self::Record) -> Option<Amount> {
        None
    }

    fn columns(&self) -> &'static [&'static str];

    /// Cells in `columns()` order; `None` exports as an empty field.
    fn row(&self, record: &Self::Record) -> Vec<Option<String>>;

    /// One human-readable line per criterion, "All ..." when unconstrained.
    fn filter_summary(&self, criteria: &Self::Criteria) -> Vec<String>;

    /// Active filter values, slugified, for the export filename.
    fn filename_tags(&self, criteria: &Self::Criteria) -> Vec<String>;
}

/// Filter stage for a view: baseline first, then criteria.
pub fn filter_view<V: View>(view: &V, records: &[V::Record], criteria: &V::Criteria) -> Vec<V::Record> {
    records
        .iter()
        .filter(|record| view.baseline(record) && criteria.matches(record))
        .cloned()
        .collect()
}

/// Output of one full pass of the pipeline.
#[derive(Debug, Clone)]
pub struct QueryResult<R> {
    /// Filtered, unsorted: what exports and selection pruning see.
    pub filtered: Vec<R>,
    pub page: Page<R>,
}

/// Filter, sort, then paginate.
pub fn run_query<V: View>(
    view: &V,
    records: &[V::Record],
    criteria: &V::Criteria,
    sort: &SortSpec<<V::Record as Record>::Field>,
    page: PageSpec,
) -> QueryResult<V::Record> {
    let filtered = filter_view(view, records, criteria);
    let sorted = sort_records(&filtered, sort);
    let page = paginate(&sorted, page);
    log::debug!(
        "{} query: {} of {} records matched, page {}/{}",
        view.slug(),
        filtered.len(),
        records.len(),
        page.page,
        page.total_pages
    );
    QueryResult { filtered, page }
}
