//! Category specialties.
//!
//! A store specializes in a category once it carries enough distinct
//! items of it. Each category has a ladder of (distinct items, bonus)
//! steps; every step reached adds its bonus to the store's specialty
//! score.
//!
//! Regular customers with a preferred category pair are steered by
//! these specialties: when the store their attraction draw picked holds
//! neither of their categories, they go to the best specialist instead.
//! Stores holding both categories beat stores holding one; ties go to
//! the higher combined bonus, then to the earlier store.

use crate::{
    customer::Customer,
    item::{Category, Item},
    player::Player,
};
use std::collections::BTreeMap;

const BROAD: &[(usize, f64)] = &[(10, 1.2), (30, 1.5), (60, 2.5)];
const NICHE: &[(usize, f64)] = &[(5, 1.5), (15, 2.0), (30, 3.0)];
const GENERAL: &[(usize, f64)] = &[(8, 1.3), (20, 1.8), (40, 2.5)];

/// The specialty ladder for `category`, smallest step first.
pub fn thresholds(category: Category) -> &'static [(usize, f64)] {
    match category {
        Category::FoodGroceries
        | Category::FreshProduce
        | Category::HouseholdEssentials
        | Category::PersonalCare => BROAD,
        Category::Electronics | Category::Gaming | Category::Luxury => NICHE,
        _ => GENERAL,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialtyScore {
    /// Sum of every reached step across all categories; 0 for none.
    pub multiplier:   f64,
    /// Distinct in-stock items per category.
    pub counts:       BTreeMap<Category, usize>,
    /// Bonus reached per category. Categories below their first step
    /// are absent.
    pub per_category: BTreeMap<Category, f64>,
}

/// Distinct in-stock items per category.
pub fn category_counts(player: &Player, items: &[Item]) -> BTreeMap<Category, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        if player.is_stocked(&item.name) {
            *counts.entry(item.category).or_insert(0) += 1;
        }
    }
    counts
}

pub fn specialty_score(player: &Player, items: &[Item]) -> SpecialtyScore {
    let counts = category_counts(player, items);
    let mut per_category = BTreeMap::new();
    for (&category, &count) in &counts {
        let bonus: f64 = thresholds(category)
            .iter()
            .filter(|(min, _)| count >= *min)
            .map(|(_, bonus)| bonus)
            .sum();
        if bonus > 0.0 {
            per_category.insert(category, bonus);
        }
    }
    let multiplier = per_category.values().sum();
    SpecialtyScore { multiplier, counts, per_category }
}

/// Highest step reached in `category`, in distinct items.
pub fn category_threshold(player: &Player, category: Category, items: &[Item]) -> Option<usize> {
    let count = items
        .iter()
        .filter(|i| i.category == category && player.is_stocked(&i.name))
        .count();
    thresholds(category)
        .iter()
        .rev()
        .find(|(min, _)| count >= *min)
        .map(|(min, _)| *min)
}

pub fn has_specialty(player: &Player, category: Category, items: &[Item]) -> bool {
    category_threshold(player, category, items).is_some()
}

pub fn has_both_specializations(player: &Player, categories: &[Category], items: &[Item]) -> bool {
    !categories.is_empty() && categories.iter().all(|c| has_specialty(player, *c, items))
}

/// Best store for a customer preferring `categories`, among stores
/// whose attraction score is positive. `None` when no scoring store
/// specializes in any of them.
pub fn best_specialist(
    players:    &[Player],
    scores:     &[f64],
    categories: &[Category],
    items:      &[Item],
) -> Option<usize> {
    let mut best: Option<(usize, usize, f64)> = None;
    for (idx, player) in players.iter().enumerate() {
        if scores.get(idx).map_or(true, |s| *s <= 0.0) {
            continue;
        }
        let score = specialty_score(player, items);
        let matched: Vec<f64> = categories
            .iter()
            .filter_map(|c| score.per_category.get(c).copied())
            .collect();
        if matched.is_empty() {
            continue;
        }
        let held = if has_both_specializations(player, categories, items) { 2 } else { 1 };
        let bonus: f64 = matched.iter().sum();
        let better = match best {
            None => true,
            Some((_, best_held, best_bonus)) => held > best_held || (held == best_held && bonus > best_bonus),
        };
        if better {
            best = Some((idx, held, bonus));
        }
    }
    best.map(|(idx, _, _)| idx)
}

/// Apply the specialty override to an attraction pick. Specialists and
/// customers without preferences keep the pick.
pub fn redirect(
    customer: &Customer,
    picked:   usize,
    players:  &[Player],
    scores:   &[f64],
    items:    &[Item],
) -> usize {
    if customer.archetype.is_special() || customer.specializations.is_empty() {
        return picked;
    }
    let categories = &customer.specializations;
    if categories.iter().any(|c| has_specialty(&players[picked], *c, items)) {
        return picked;
    }
    best_specialist(players, scores, categories, items).unwrap_or(picked)
}
