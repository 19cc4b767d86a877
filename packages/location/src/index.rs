//! In-memory multi-level location index.
//!
//! Three structures are maintained from the same stream of records:
//! - postal code -> records (insertion order, duplicates kept)
//! - upper-cased state -> cities (as first seen)
//! - `STATE‖CITY` -> constituencies
//!
//! Query methods apply the configured state allow-list. The index is
//! append-only: records are added by the eager build and by slow scans,
//! never edited or removed.

use std::collections::{BTreeMap, BTreeSet};

use krishi_mitra_location_models::FallbackRecord;

/// Separator between state and city in constituency keys.
pub const COMPOSITE_KEY_SEPARATOR: char = '\u{2016}';

/// Builds the constituency index key for an upper-cased state and city.
#[must_use]
pub fn composite_key(state_upper: &str, city_upper: &str) -> String {
    format!("{state_upper}{COMPOSITE_KEY_SEPARATOR}{city_upper}")
}

/// A set that remembers insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedSet {
    order: Vec<String>,
    members: BTreeSet<String>,
}

impl OrderedSet {
    /// Adds `value` if absent. Returns `true` if it was added.
    pub fn insert(&mut self, value: &str) -> bool {
        if self.members.contains(value) {
            return false;
        }
        self.members.insert(value.to_string());
        self.order.push(value.to_string());
        true
    }

    /// Adds every value of `other` in its order.
    pub fn extend_from(&mut self, other: &Self) {
        for value in other.iter() {
            self.insert(value);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Consumes the set, returning members in insertion order.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

/// Counts of what [`LocationIndex::insert`] did with a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// The record was added to the postal code index.
    pub by_postal_code: bool,
    /// The record contributed a state/city pair.
    pub by_state: bool,
    /// The record contributed a constituency.
    pub by_constituency: bool,
}

/// The location index.
#[derive(Debug, Clone, Default)]
pub struct LocationIndex {
    by_postal_code: BTreeMap<String, Vec<FallbackRecord>>,
    states: OrderedSet,
    states_to_cities: BTreeMap<String, OrderedSet>,
    state_city_to_constituencies: BTreeMap<String, OrderedSet>,
    allowed_states: BTreeSet<String>,
}

impl LocationIndex {
    /// Creates an empty index restricted to `allowed_states` (upper-cased
    /// names). An empty allow-list means no restriction.
    #[must_use]
    pub const fn new(allowed_states: BTreeSet<String>) -> Self {
        Self {
            by_postal_code: BTreeMap::new(),
            states: OrderedSet {
                order: Vec::new(),
                members: BTreeSet::new(),
            },
            states_to_cities: BTreeMap::new(),
            state_city_to_constituencies: BTreeMap::new(),
            allowed_states,
        }
    }

    /// Adds a record to every index its fields qualify it for.
    pub fn insert(&mut self, record: FallbackRecord) -> InsertOutcome {
        let mut outcome = InsertOutcome::default();
        let state_key = record.state_key();

        if let (Some(state_key), Some(city)) = (state_key.as_deref(), record.city.as_deref()) {
            self.states.insert(state_key);
            self.states_to_cities
                .entry(state_key.to_string())
                .or_default()
                .insert(city);
            outcome.by_state = true;

            if let (Some(constituency), Some(city_key)) =
                (record.constituency.as_deref(), record.city_key())
            {
                let key = composite_key(state_key, &city_key);
                self.state_city_to_constituencies
                    .entry(key)
                    .or_default()
                    .insert(constituency);
                outcome.by_constituency = true;
            }
        }

        if let Some(code) = record.postal_code.clone() {
            self.by_postal_code.entry(code).or_default().push(record);
            outcome.by_postal_code = true;
        }

        outcome
    }

    /// Returns `true` if any record is indexed under `code`.
    #[must_use]
    pub fn contains_postal_code(&self, code: &str) -> bool {
        self.by_postal_code
            .get(code)
            .is_some_and(|records| !records.is_empty())
    }

    /// Upper-cased state names in first-seen order, restricted to the
    /// allow-list when one is configured.
    #[must_use]
    pub fn states(&self) -> Vec<String> {
        self.states
            .iter()
            .filter(|state| self.is_allowed(state))
            .map(str::to_string)
            .collect()
    }

    /// Cities of one state, or of every allowed state when `state` is
    /// `None`.
    #[must_use]
    pub fn cities(&self, state: Option<&str>) -> Vec<String> {
        let Some(state) = state else {
            let mut all = OrderedSet::default();
            for state_key in self.states.iter().filter(|s| self.is_allowed(s)) {
                if let Some(cities) = self.states_to_cities.get(state_key) {
                    all.extend_from(cities);
                }
            }
            return all.into_vec();
        };

        let state_key = state.trim().to_uppercase();
        if !self.is_allowed(&state_key) {
            return Vec::new();
        }
        self.states_to_cities
            .get(&state_key)
            .map(|cities| cities.clone().into_vec())
            .unwrap_or_default()
    }

    /// Constituencies for a state/city pair.
    ///
    /// - neither given: every constituency of every allowed state
    /// - state only: every constituency across that state's cities
    /// - both: the exact state/city pair
    /// - city only: nothing, since a city is only meaningful within a state
    #[must_use]
    pub fn constituencies(&self, state: Option<&str>, city: Option<&str>) -> Vec<String> {
        match (state, city) {
            (None, None) => {
                let mut all = OrderedSet::default();
                for state_key in self.states.iter() {
                    all.extend_from(&self.constituencies_of(state_key, None));
                }
                all.into_vec()
            }
            (Some(state), city) => {
                let state_key = state.trim().to_uppercase();
                let city_key = city.map(|c| c.trim().to_uppercase());
                self.constituencies_of(&state_key, city_key.as_deref())
                    .into_vec()
            }
            (None, Some(_)) => Vec::new(),
        }
    }

    fn constituencies_of(&self, state_key: &str, city_key: Option<&str>) -> OrderedSet {
        let mut out = OrderedSet::default();
        if !self.is_allowed(state_key) {
            return out;
        }

        if let Some(city_key) = city_key {
            if let Some(set) = self
                .state_city_to_constituencies
                .get(&composite_key(state_key, city_key))
            {
                out.extend_from(set);
            }
            return out;
        }

        if let Some(cities) = self.states_to_cities.get(state_key) {
            for city in cities.iter() {
                let key = composite_key(state_key, &city.to_uppercase());
                if let Some(set) = self.state_city_to_constituencies.get(&key) {
                    out.extend_from(set);
                }
            }
        }
        out
    }

    /// Records indexed under an already-normalized postal code.
    ///
    /// When an allow-list is configured the records are filtered to allowed
    /// states (records without a state are kept). If that would discard
    /// every record, the unfiltered list is returned instead.
    #[must_use]
    pub fn records(&self, code: &str) -> Vec<FallbackRecord> {
        let Some(records) = self.by_postal_code.get(code) else {
            return Vec::new();
        };

        if self.allowed_states.is_empty() {
            return records.clone();
        }

        let filtered: Vec<FallbackRecord> = records
            .iter()
            .filter(|r| r.state_key().is_none_or(|s| self.allowed_states.contains(&s)))
            .cloned()
            .collect();

        if filtered.is_empty() {
            records.clone()
        } else {
            filtered
        }
    }

    /// Number of distinct states indexed (ignoring the allow-list).
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of distinct state/city constituency keys.
    #[must_use]
    pub fn constituency_key_count(&self) -> usize {
        self.state_city_to_constituencies.len()
    }

    /// Number of distinct postal codes indexed.
    #[must_use]
    pub fn postal_code_count(&self) -> usize {
        self.by_postal_code.len()
    }

    /// Postal codes, sorted.
    pub fn postal_codes(&self) -> impl Iterator<Item = &str> {
        self.by_postal_code.keys().map(String::as_str)
    }

    /// Constituency composite keys, sorted.
    pub fn constituency_keys(&self) -> impl Iterator<Item = &str> {
        self.state_city_to_constituencies.keys().map(String::as_str)
    }

    /// A `STATE‖CITY` key for the first indexed state and its first city,
    /// for build logging.
    #[must_use]
    pub fn sample_key(&self) -> Option<String> {
        let state = self.states.iter().next()?;
        let city = self.states_to_cities.get(state)?.iter().next()?;
        Some(composite_key(state, &city.to_uppercase()))
    }

    fn is_allowed(&self, state_key: &str) -> bool {
        self.allowed_states.is_empty() || self.allowed_states.contains(state_key)
    }
}
