//! Filtering and regrouping of entries for display, reports and pushes.
//!
//! Views never own lines: they hold [`EntryRef`]s into an
//! [`EntriesCollection`], so reading or updating them goes through the
//! collection.

use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

use chrono::NaiveDate;

use crate::entries::{EntriesCollection, EntryRef};

/// Tells whether an alias resolves to a known project/activity.
pub trait AliasLookup {
    fn is_mapped(&self, alias: &str) -> bool;
}

impl<F> AliasLookup for F
where
    F: Fn(&str) -> bool,
{
    fn is_mapped(&self, alias: &str) -> bool {
        self(alias)
    }
}

/// Attribute predicates applied by [`EntriesCollection::filter`].
#[derive(Default, Clone, Copy)]
pub struct EntryFilter<'a> {
    dates: Option<&'a RangeInclusive<NaiveDate>>,
    regroup: bool,
    ignored: Option<bool>,
    pushed: Option<bool>,
    unmapped: Option<(bool, &'a dyn AliasLookup)>,
}

impl<'a> EntryFilter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep dates within `dates`.
    #[must_use]
    pub const fn dates(mut self, dates: &'a RangeInclusive<NaiveDate>) -> Self {
        self.dates = Some(dates);
        self
    }

    /// Collapse interchangeable entries of a date into aggregates.
    #[must_use]
    pub const fn regroup(mut self, regroup: bool) -> Self {
        self.regroup = regroup;
        self
    }

    #[must_use]
    pub const fn ignored(mut self, ignored: bool) -> Self {
        self.ignored = Some(ignored);
        self
    }

    #[must_use]
    pub const fn pushed(mut self, pushed: bool) -> Self {
        self.pushed = Some(pushed);
        self
    }

    /// Keep entries whose alias is (un)known to `lookup`.
    #[must_use]
    pub fn unmapped(mut self, unmapped: bool, lookup: &'a dyn AliasLookup) -> Self {
        self.unmapped = Some((unmapped, lookup));
        self
    }

    fn accepts(&self, collection: &EntriesCollection, entry: EntryRef) -> bool {
        let Some(line) = collection.entry(entry) else {
            return false;
        };
        if self.ignored.is_some_and(|ignored| collection.is_ignored(entry) != ignored) {
            return false;
        }
        if self.pushed.is_some_and(|pushed| line.is_pushed() != pushed) {
            return false;
        }
        if let Some((unmapped, lookup)) = self.unmapped {
            if lookup.is_mapped(line.alias()) == unmapped {
                return false;
            }
        }
        true
    }
}

/// Entries sharing alias, description and ignored state within one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedEntry {
    entries: Vec<EntryRef>,
}

impl AggregatedEntry {
    pub fn entries(&self) -> &[EntryRef] {
        &self.entries
    }
}

/// A single entry or an aggregate, as returned by a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryView {
    Single(EntryRef),
    Aggregate(AggregatedEntry),
}

impl EntryView {
    /// Member entries, in document order.
    pub fn entries(&self) -> &[EntryRef] {
        match self {
            Self::Single(entry) => std::slice::from_ref(entry),
            Self::Aggregate(aggregate) => &aggregate.entries,
        }
    }

    /// First member in document order.
    pub fn first(&self) -> EntryRef {
        self.entries()[0]
    }

    /// Sum of the members' hours.
    pub fn hours(&self, collection: &EntriesCollection) -> f64 {
        self.entries().iter().map(|e| collection.hours(*e)).sum()
    }

    pub fn alias<'c>(&self, collection: &'c EntriesCollection) -> &'c str {
        collection.entry(self.first()).map_or("", |line| line.alias())
    }

    pub fn description<'c>(&self, collection: &'c EntriesCollection) -> &'c str {
        collection
            .entry(self.first())
            .map_or("", |line| line.description())
    }

    pub fn is_ignored(&self, collection: &EntriesCollection) -> bool {
        collection.is_ignored(self.first())
    }

    /// True when every member is pushed.
    pub fn is_pushed(&self, collection: &EntriesCollection) -> bool {
        self.entries()
            .iter()
            .all(|e| collection.entry(*e).is_some_and(|line| line.is_pushed()))
    }

    /// Sets or clears the pushed flag on every member.
    pub fn set_pushed(&self, collection: &mut EntriesCollection, pushed: bool) {
        for entry in self.entries() {
            if let Some(line) = collection.entry_mut(*entry) {
                line.set_pushed(pushed);
            }
        }
    }

    /// Records (or clears) a push error on every member.
    pub fn set_push_error(&self, collection: &mut EntriesCollection, error: Option<&str>) {
        for entry in self.entries() {
            if let Some(line) = collection.entry_mut(*entry) {
                line.set_push_error(error.map(str::to_string));
            }
        }
    }

    fn push(&mut self, entry: EntryRef) {
        match self {
            Self::Single(first) => {
                *self = Self::Aggregate(AggregatedEntry {
                    entries: vec![*first, entry],
                });
            }
            Self::Aggregate(aggregate) => aggregate.entries.push(entry),
        }
    }
}

impl EntriesCollection {
    /// Entries matching `filter`, per date.
    ///
    /// With regrouping, entries of a date sharing alias, description and
    /// ignored state take the slot of the first of them. Entries with a
    /// different ignored state never merge.
    pub fn filter(&self, filter: &EntryFilter<'_>) -> BTreeMap<NaiveDate, Vec<EntryView>> {
        let mut result = BTreeMap::new();
        for date in self.dates() {
            if filter.dates.is_some_and(|range| !range.contains(&date)) {
                continue;
            }

            let mut views: Vec<EntryView> = Vec::new();
            let mut slots: HashMap<(&str, &str, bool), usize> = HashMap::new();
            for &entry in self.entries_for(date) {
                if !filter.accepts(self, entry) {
                    continue;
                }
                if !filter.regroup {
                    views.push(EntryView::Single(entry));
                    continue;
                }
                let Some(line) = self.entry(entry) else {
                    continue;
                };
                let key = (line.alias(), line.description(), self.is_ignored(entry));
                match slots.get(&key) {
                    Some(&slot) => views[slot].push(entry),
                    None => {
                        slots.insert(key, views.len());
                        views.push(EntryView::Single(entry));
                    }
                }
            }

            if !views.is_empty() {
                result.insert(date, views);
            }
        }
        result
    }
}
