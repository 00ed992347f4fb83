//! Resource kinds and the resource ledger.
//!
//! A [`ResourceMap`] is total over [`Resource`]: every kind is always present,
//! so merges can never silently drop an entry. Quantities are `f64` because
//! production accrues fractional amounts every tick.
//!
//! # Example
//!
//! ```
//! use orbital_core::resources::{Resource, ResourceMap};
//!
//! let balance = ResourceMap::from_pairs(&[(Resource::Metal, 100.0)]);
//! let cost = ResourceMap::from_pairs(&[(Resource::Metal, 40.0)]);
//!
//! assert!(balance.covers(&cost));
//! let remaining = balance.debit(&cost);
//! assert_eq!(remaining[Resource::Metal], 60.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Resource kind.
///
/// Declaration order is the looting priority: earlier kinds are taken first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Resource {
    /// Structural metal.
    Metal = 0,
    /// Crystal for electronics.
    Crystal = 1,
    /// Deuterium fuel.
    Deuterium = 2,
}

impl Resource {
    /// Total number of resource kinds.
    pub const COUNT: usize = 3;

    /// All resource kinds in priority order.
    #[must_use]
    pub const fn all() -> &'static [Resource] {
        &[Resource::Metal, Resource::Crystal, Resource::Deuterium]
    }

    /// Index of this kind inside a [`ResourceMap`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metal => "metal",
            Self::Crystal => "crystal",
            Self::Deuterium => "deuterium",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantities of every resource kind.
///
/// Serialized as a map keyed by lowercase resource name. Missing keys
/// deserialize as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Resource, f64>", into = "BTreeMap<Resource, f64>")]
pub struct ResourceMap {
    values: [f64; Resource::COUNT],
}

impl ResourceMap {
    /// A map with every resource at zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            values: [0.0; Resource::COUNT],
        }
    }

    /// Builds a map from `(resource, quantity)` pairs; absent kinds are zero.
    #[must_use]
    pub fn from_pairs(pairs: &[(Resource, f64)]) -> Self {
        let mut map = Self::zero();
        for &(resource, quantity) in pairs {
            map[resource] += quantity;
        }
        map
    }

    /// Iterates `(resource, quantity)` in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, f64)> + '_ {
        Resource::all().iter().map(move |&r| (r, self.values[r.index()]))
    }

    /// Returns `true` if every entry of `cost` is at most the matching entry
    /// of `self`.
    #[must_use]
    pub fn covers(&self, cost: &ResourceMap) -> bool {
        sufficient(cost, self)
    }

    /// Subtracts `cost`; the caller must have checked [`covers`](Self::covers).
    #[must_use]
    pub fn debit(&self, cost: &ResourceMap) -> ResourceMap {
        debit(cost, self)
    }

    /// Adds `other` entry by entry.
    #[must_use]
    pub fn credit(&self, other: &ResourceMap) -> ResourceMap {
        credit(self, other)
    }

    /// Multiplies every entry by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> ResourceMap {
        let mut out = *self;
        for v in &mut out.values {
            *v *= factor;
        }
        out
    }

    /// Entry-wise minimum of `self` and `other`.
    #[must_use]
    pub fn min_with(&self, other: &ResourceMap) -> ResourceMap {
        let mut out = *self;
        for (r, q) in other.iter() {
            out[r] = out[r].min(q);
        }
        out
    }

    /// Sum over all kinds.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Returns `true` if every entry is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Returns `true` if no entry is negative.
    #[must_use]
    pub fn is_non_negative(&self) -> bool {
        self.values.iter().all(|v| *v >= 0.0)
    }
}

impl Index<Resource> for ResourceMap {
    type Output = f64;

    fn index(&self, resource: Resource) -> &f64 {
        &self.values[resource.index()]
    }
}

impl IndexMut<Resource> for ResourceMap {
    fn index_mut(&mut self, resource: Resource) -> &mut f64 {
        &mut self.values[resource.index()]
    }
}

impl Add for ResourceMap {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        credit(&self, &rhs)
    }
}

impl AddAssign for ResourceMap {
    fn add_assign(&mut self, rhs: Self) {
        *self = credit(self, &rhs);
    }
}

impl Sub for ResourceMap {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        debit(&rhs, &self)
    }
}

impl SubAssign for ResourceMap {
    fn sub_assign(&mut self, rhs: Self) {
        *self = debit(&rhs, self);
    }
}

impl From<BTreeMap<Resource, f64>> for ResourceMap {
    fn from(map: BTreeMap<Resource, f64>) -> Self {
        let mut out = Self::zero();
        for (resource, quantity) in map {
            out[resource] = quantity;
        }
        out
    }
}

impl From<ResourceMap> for BTreeMap<Resource, f64> {
    fn from(map: ResourceMap) -> Self {
        map.iter().collect()
    }
}

/// `true` iff every resource in `cost` is at most the matching `balance`.
#[must_use]
pub fn sufficient(cost: &ResourceMap, balance: &ResourceMap) -> bool {
    cost.iter().all(|(r, q)| q <= balance[r])
}

/// `balance - cost`, entry by entry.
///
/// Going negative is an engine defect: callers check [`sufficient`] first.
#[must_use]
pub fn debit(cost: &ResourceMap, balance: &ResourceMap) -> ResourceMap {
    let mut out = *balance;
    for (r, q) in cost.iter() {
        out[r] -= q;
    }
    debug_assert!(out.is_non_negative(), "debit drove a balance negative");
    out
}

/// `a + b`, entry by entry.
#[must_use]
pub fn credit(a: &ResourceMap, b: &ResourceMap) -> ResourceMap {
    let mut out = *a;
    for (r, q) in b.iter() {
        out[r] += q;
    }
    out
}
