//! Per-screen state around the query pipeline: draft and applied criteria,
//! sort, page, the filtered set and the bulk-selection set.
//!
//! RULES:
//!   - `filtered` is always `filter_view(records, applied)`, recomputed from
//!     the full record set, never from a previous result.
//!   - Applying or clearing filters and changing page size reset the page to 1.
//!   - Every recompute prunes the selection to ids still in `filtered`.
//!   - Records changed by a send are patched into `filtered` in place so
//!     a sent row does not vanish from the current listing.

use crate::{
    error::{ConsoleError, ConsoleResult},
    mailer::{self, BulkOutcome, Deliverable, SendOutcome, SendQuota},
    query::{
        export_csv, filter_view, page::clamp_page, paginate, sort_records, Criteria, Page,
        PageSpec, SortSpec, View,
    },
    record::{Record, RecordSet},
    sink::Download,
    types::{RecordId, Timestamp},
};
use std::collections::BTreeSet;

/// Ids marked for a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<RecordId>,
}

impl Selection {
    /// Flip one id. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.ids.iter().cloned().collect()
    }

    /// Drop every id not in `visible`. Returns how many were dropped.
    pub fn prune<'a>(&mut self, visible: impl IntoIterator<Item = &'a str>) -> usize {
        if self.ids.is_empty() {
            return 0;
        }
        let keep: BTreeSet<&str> = visible.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| keep.contains(id.as_str()));
        before - self.ids.len()
    }

    pub fn is_fully_selected(&self, ids: &[&str]) -> bool {
        !ids.is_empty() && ids.iter().all(|id| self.ids.contains(*id))
    }

    pub fn is_partially_selected(&self, ids: &[&str]) -> bool {
        ids.iter().any(|id| self.ids.contains(*id)) && !self.is_fully_selected(ids)
    }

    /// Select every id, or clear them all when they were already all selected.
    pub fn toggle_all(&mut self, ids: &[&str]) {
        if self.is_fully_selected(ids) {
            for id in ids {
                self.ids.remove(*id);
            }
        } else {
            self.ids.extend(ids.iter().map(|id| id.to_string()));
        }
    }
}

pub struct ViewState<V: View> {
    view: V,
    records: RecordSet<V::Record>,
    draft: V::Criteria,
    applied: V::Criteria,
    sort: SortSpec<<V::Record as Record>::Field>,
    page: usize,
    page_size: usize,
    filtered: Vec<V::Record>,
    selection: Selection,
}

impl<V: View> ViewState<V> {
    pub fn new(view: V, records: RecordSet<V::Record>, page_size: usize) -> ConsoleResult<Self> {
        if page_size == 0 {
            return Err(ConsoleError::InvalidPageSize);
        }
        let applied = V::Criteria::default();
        let filtered = filter_view(&view, records.as_slice(), &applied);
        Ok(Self {
            view,
            records,
            draft: applied.clone(),
            applied,
            sort: SortSpec::unsorted(),
            page: 1,
            page_size,
            filtered,
            selection: Selection::default(),
        })
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn records(&self) -> &RecordSet<V::Record> {
        &self.records
    }

    pub fn filtered(&self) -> &[V::Record] {
        &self.filtered
    }

    pub fn applied_criteria(&self) -> &V::Criteria {
        &self.applied
    }

    pub fn sort(&self) -> &SortSpec<<V::Record as Record>::Field> {
        &self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Edit one draft criterion. Takes effect on `apply_filters`.
    pub fn set_filter(&mut self, key: &str, value: &str) -> ConsoleResult<()> {
        self.draft.set(key, value)
    }

    pub fn apply_filters(&mut self) {
        self.applied = self.draft.clone();
        self.page = 1;
        self.recompute();
    }

    pub fn apply_criteria(&mut self, criteria: V::Criteria) {
        self.draft = criteria;
        self.apply_filters();
    }

    pub fn clear_filters(&mut self) {
        self.draft = V::Criteria::default();
        self.apply_filters();
    }

    /// Column-header click.
    pub fn toggle_sort(&mut self, field: <V::Record as Record>::Field) {
        self.sort = self.sort.toggle(field);
    }

    pub fn set_sort(&mut self, sort: SortSpec<<V::Record as Record>::Field>) {
        self.sort = sort;
    }

    pub fn set_page(&mut self, page: usize) -> ConsoleResult<()> {
        if page == 0 {
            return Err(ConsoleError::InvalidPage { page });
        }
        self.page = page;
        Ok(())
    }

    pub fn clamp_page(&mut self) {
        self.page = clamp_page(self.page, self.filtered.len(), self.page_size);
    }

    pub fn set_page_size(&mut self, page_size: usize) -> ConsoleResult<()> {
        if page_size == 0 {
            return Err(ConsoleError::InvalidPageSize);
        }
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    /// Sorted, paginated slice of the filtered set for display.
    pub fn current_page(&self) -> Page<V::Record> {
        let sorted = sort_records(&self.filtered, &self.sort);
        paginate(&sorted, PageSpec::from_state(self.page, self.page_size))
    }

    pub fn toggle_selection(&mut self, id: &str) -> bool {
        self.selection.toggle(id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn toggle_current_page_selection(&mut self) {
        let page = self.current_page();
        let ids: Vec<&str> = page.items.iter().map(|r| r.id()).collect();
        self.selection.toggle_all(&ids);
    }

    pub fn is_current_page_fully_selected(&self) -> bool {
        let page = self.current_page();
        let ids: Vec<&str> = page.items.iter().map(|r| r.id()).collect();
        self.selection.is_fully_selected(&ids)
    }

    pub fn is_current_page_partially_selected(&self) -> bool {
        let page = self.current_page();
        let ids: Vec<&str> = page.items.iter().map(|r| r.id()).collect();
        self.selection.is_partially_selected(&ids)
    }

    /// Swap in a new version of a record and patch the visible copy.
    pub fn replace_record(&mut self, record: V::Record) -> ConsoleResult<V::Record> {
        let old = self.records.replace(record)?;
        self.refresh_visible();
        Ok(old)
    }

    /// CSV of the full filtered set, ignoring pagination.
    pub fn export(&self, exported_at: Timestamp) -> Download {
        export_csv(&self.view, &self.filtered, &self.applied, exported_at)
    }

    fn recompute(&mut self) {
        self.filtered = filter_view(&self.view, self.records.as_slice(), &self.applied);
        let dropped = self
            .selection
            .prune(self.filtered.iter().map(|r| r.id()));
        log::debug!(
            "{}: {} of {} records after filtering, {} selections pruned",
            self.view.slug(),
            self.filtered.len(),
            self.records.len(),
            dropped
        );
    }

    fn refresh_visible(&mut self) {
        for visible in self.filtered.iter_mut() {
            if let Some(current) = self.records.get(visible.id()) {
                *visible = current.clone();
            }
        }
    }
}

impl<V> ViewState<V>
where
    V: View,
    V::Record: Deliverable,
{
    pub fn send_one(
        &mut self,
        id: &str,
        quota: &mut SendQuota,
        now: Timestamp,
    ) -> ConsoleResult<SendOutcome> {
        let outcome = mailer::send_one(&mut self.records, id, &mut self.selection, quota, now)?;
        self.refresh_visible();
        Ok(outcome)
    }

    /// Email every visible selected record.
    pub fn send_selected(&mut self, quota: &mut SendQuota, now: Timestamp) -> ConsoleResult<BulkOutcome> {
        let outcome = mailer::send_bulk(
            &mut self.records,
            &self.filtered,
            &mut self.selection,
            quota,
            now,
        )?;
        self.refresh_visible();
        Ok(outcome)
    }
}
