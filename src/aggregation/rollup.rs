//! Synthesized roll-up rows: sums across hazards, totals and means across quintiles

use crate::keys::{EventKey, Hazard, IncomeCat, JelKey};
use std::collections::BTreeMap;

/// Keys that carry a hazard and an income category
pub trait RollupKey: Ord + Clone {
    fn hazard(&self) -> &Hazard;
    fn income_cat(&self) -> &IncomeCat;
    fn with_hazard(&self, hazard: Hazard) -> Self;
    fn with_income_cat(&self, income_cat: IncomeCat) -> Self;
}

impl RollupKey for EventKey {
    fn hazard(&self) -> &Hazard {
        &self.hazard
    }

    fn income_cat(&self) -> &IncomeCat {
        &self.income_cat
    }

    fn with_hazard(&self, hazard: Hazard) -> Self {
        EventKey { hazard, ..self.clone() }
    }

    fn with_income_cat(&self, income_cat: IncomeCat) -> Self {
        EventKey { income_cat, ..self.clone() }
    }
}

impl RollupKey for JelKey {
    fn hazard(&self) -> &Hazard {
        &self.hazard
    }

    fn income_cat(&self) -> &IncomeCat {
        &self.income_cat
    }

    fn with_hazard(&self, hazard: Hazard) -> Self {
        JelKey { hazard, ..self.clone() }
    }

    fn with_income_cat(&self, income_cat: IncomeCat) -> Self {
        JelKey { income_cat, ..self.clone() }
    }
}

/// Values that can be summed and scaled column-wise
pub trait RollupValue: Clone {
    fn accumulate(&mut self, other: &Self);
    fn scale(&mut self, factor: f64);
}

impl RollupValue for f64 {
    fn accumulate(&mut self, other: &Self) {
        *self += other;
    }

    fn scale(&mut self, factor: f64) {
        *self *= factor;
    }
}

impl RollupValue for Vec<f64> {
    fn accumulate(&mut self, other: &Self) {
        for (a, b) in self.iter_mut().zip(other) {
            *a += b;
        }
    }

    fn scale(&mut self, factor: f64) {
        self.iter_mut().for_each(|v| *v *= factor);
    }
}

fn accumulate_into<K, V, F>(table: &BTreeMap<K, V>, include: impl Fn(&K) -> bool, target: F) -> BTreeMap<K, (V, usize)>
where
    K: RollupKey,
    V: RollupValue,
    F: Fn(&K) -> K,
{
    let mut sums: BTreeMap<K, (V, usize)> = BTreeMap::new();
    for (key, value) in table.iter().filter(|(k, _)| include(*k)) {
        match sums.get_mut(&target(key)) {
            Some((sum, count)) => {
                sum.accumulate(value);
                *count += 1;
            }
            None => {
                sums.insert(target(key), (value.clone(), 1));
            }
        }
    }
    sums
}

/// Append `all_hazards` rows summing every named hazard
pub fn add_all_hazards_sum<K: RollupKey, V: RollupValue>(table: &mut BTreeMap<K, V>) {
    let sums = accumulate_into(
        table,
        |k| matches!(k.hazard(), Hazard::Named(_)),
        |k| k.with_hazard(Hazard::AllHazards),
    );
    table.extend(sums.into_iter().map(|(k, (v, _))| (k, v)));
}

/// Append `total` rows summing every quintile
pub fn add_income_total_sum<K: RollupKey, V: RollupValue>(table: &mut BTreeMap<K, V>) {
    let sums = accumulate_into(
        table,
        |k| k.income_cat().is_quintile(),
        |k| k.with_income_cat(IncomeCat::Total),
    );
    table.extend(sums.into_iter().map(|(k, (v, _))| (k, v)));
}

/// Append `tot` rows averaging every quintile
pub fn add_income_national_mean<K: RollupKey, V: RollupValue>(table: &mut BTreeMap<K, V>) {
    let sums = accumulate_into(
        table,
        |k| k.income_cat().is_quintile(),
        |k| k.with_income_cat(IncomeCat::National),
    );
    table.extend(sums.into_iter().map(|(k, (mut v, count))| {
        v.scale(1.0 / count as f64);
        (k, v)
    }));
}
