//! Derived metrics: pure reductions of a record slice to a few scalars.

use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

use crate::record::{ProductionRecord, Shift, Weather};
use crate::stats;

/// Breakeven / minimum viable price when production is zero or data is empty
pub const DEFAULT_BREAKEVEN_PRICE: f64 = 1500.0;
/// Price delta used by the sensitivity calculator ($/oz)
pub const SENSITIVITY_DELTA: f64 = 100.0;
/// Assumed average when no Clear-weather shift has been observed
pub const DEFAULT_CLEAR_PRODUCTION: f64 = 35.0;
/// Assumed average when no Heavy Rain shift has been observed
pub const DEFAULT_HEAVY_RAIN_PRODUCTION: f64 = 20.0;
/// Fixed estimate, not derived from data
pub const WORKFORCE_IMPROVEMENT_PCT: f64 = 15.0;
pub const LABOR_COST_PER_WORKER: f64 = 250.0;
pub const EQUIPMENT_COST_PER_HOUR: f64 = 75.0;
pub const TARGET_COST_PERCENTILE: f64 = 10.0;
const TOP_PRODUCTION_SAMPLE: usize = 10;
const OPTIMAL_HOURS_BAND: f64 = 10.0;

pub fn column(data: &[ProductionRecord], f: impl Fn(&ProductionRecord) -> f64) -> Vec<f64> {
    data.iter().map(f).collect()
}

// =============================================================================
// Grouped averages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupMean<K> {
    pub key: K,
    pub mean: f64,
    pub count: usize,
}

/// Mean of `value` per category, in first-encountered order.
/// Categories never observed are absent.
pub fn grouped_mean<K, FK, FV>(data: &[ProductionRecord], key: FK, value: FV) -> Vec<GroupMean<K>>
where
    K: Copy + Eq + Hash,
    FK: Fn(&ProductionRecord) -> K,
    FV: Fn(&ProductionRecord) -> f64,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut acc: Vec<(K, f64, usize)> = Vec::new();
    for r in data {
        let k = key(r);
        let idx = *slots.entry(k).or_insert_with(|| {
            acc.push((k, 0.0, 0));
            acc.len() - 1
        });
        acc[idx].1 += value(r);
        acc[idx].2 += 1;
    }
    acc.into_iter()
        .map(|(key, sum, count)| GroupMean { key, mean: sum / count as f64, count })
        .collect()
}

/// Highest mean; the first-encountered group wins ties.
pub fn best_group<K: Copy>(groups: &[GroupMean<K>]) -> Option<GroupMean<K>> {
    groups.iter().copied().fold(None, |best, g| match best {
        Some(b) if g.mean <= b.mean => Some(b),
        _ => Some(g),
    })
}

/// Lowest mean; the first-encountered group wins ties.
pub fn worst_group<K: Copy>(groups: &[GroupMean<K>]) -> Option<GroupMean<K>> {
    groups.iter().copied().fold(None, |worst, g| match worst {
        Some(w) if g.mean >= w.mean => Some(w),
        _ => Some(g),
    })
}

pub fn mean_for<K: PartialEq>(groups: &[GroupMean<K>], key: K) -> Option<f64> {
    groups.iter().find(|g| g.key == key).map(|g| g.mean)
}

// =============================================================================
// Weather and shift
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherImpact {
    /// Clear-weather production above the overall mean, percent
    pub clear_boost: f64,
    /// Heavy-rain production below the overall mean, percent
    pub rain_penalty: f64,
}

pub fn weather_impact(data: &[ProductionRecord]) -> WeatherImpact {
    let groups = grouped_mean(data, |r| r.weather, |r| r.gold_extracted);
    let clear = mean_for(&groups, Weather::Clear).unwrap_or(DEFAULT_CLEAR_PRODUCTION);
    let rain = mean_for(&groups, Weather::HeavyRain).unwrap_or(DEFAULT_HEAVY_RAIN_PRODUCTION);
    match stats::mean(&column(data, |r| r.gold_extracted)) {
        Some(overall) if overall > 0.0 => WeatherImpact {
            clear_boost: (clear - overall) / overall * 100.0,
            rain_penalty: (overall - rain) / overall * 100.0,
        },
        _ => WeatherImpact { clear_boost: 0.0, rain_penalty: 0.0 },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShiftPerformance {
    pub shift: Shift,
    pub avg_production: f64,
    pub avg_cost_per_ounce: f64,
    /// Average ounces per dollar of unit cost; 0 when unit cost averages 0
    pub efficiency: f64,
}

pub fn shift_performance(data: &[ProductionRecord]) -> Vec<ShiftPerformance> {
    let production = grouped_mean(data, |r| r.shift, |r| r.gold_extracted);
    let cost = grouped_mean(data, |r| r.shift, |r| r.cost_per_ounce);
    production
        .iter()
        .map(|p| {
            let avg_cost = mean_for(&cost, p.key).unwrap_or(0.0);
            ShiftPerformance {
                shift: p.key,
                avg_production: p.mean,
                avg_cost_per_ounce: avg_cost,
                efficiency: if avg_cost > 0.0 { p.mean / avg_cost } else { 0.0 },
            }
        })
        .collect()
}

/// Shift with the highest average production
pub fn best_shift(data: &[ProductionRecord]) -> Option<GroupMean<Shift>> {
    best_group(&grouped_mean(data, |r| r.shift, |r| r.gold_extracted))
}

// =============================================================================
// Workforce, equipment, cost
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkerEfficiency {
    /// Mean ounces per worker per shift
    pub current_efficiency: f64,
    pub optimal_workers: u32,
    pub improvement_potential: f64,
}

pub fn worker_efficiency(data: &[ProductionRecord]) -> Option<WorkerEfficiency> {
    let per_worker = column(data, |r| r.gold_extracted / f64::from(r.workers));
    let workers = column(data, |r| f64::from(r.workers));
    Some(WorkerEfficiency {
        current_efficiency: stats::mean(&per_worker)?,
        optimal_workers: stats::mean(&workers)?.floor() as u32,
        improvement_potential: WORKFORCE_IMPROVEMENT_PCT,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquipmentUtilization {
    pub avg_hours: f64,
    /// Mean hours of the highest-production shifts
    pub optimal_hours: f64,
    pub optimal_low: f64,
    pub optimal_high: f64,
}

pub fn equipment_utilization(data: &[ProductionRecord]) -> Option<EquipmentUtilization> {
    let avg_hours = stats::mean(&column(data, |r| r.equipment_hours))?;
    let mut ranked: Vec<&ProductionRecord> = data.iter().collect();
    // stable: equal production keeps insertion order
    ranked.sort_by(|a, b| b.gold_extracted.total_cmp(&a.gold_extracted));
    let top: Vec<f64> = ranked
        .iter()
        .take(TOP_PRODUCTION_SAMPLE)
        .map(|r| r.equipment_hours)
        .collect();
    let optimal_hours = stats::mean(&top)?;
    Some(EquipmentUtilization {
        avg_hours,
        optimal_hours,
        optimal_low: optimal_hours - OPTIMAL_HOURS_BAND,
        optimal_high: optimal_hours + OPTIMAL_HOURS_BAND,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostEfficiency {
    pub current_cost: f64,
    pub min_cost: f64,
    /// 10th percentile cost per ounce
    pub target_cost: f64,
    pub potential_savings: f64,
}

pub fn cost_efficiency(data: &[ProductionRecord]) -> Option<CostEfficiency> {
    let costs = column(data, |r| r.cost_per_ounce);
    let current_cost = stats::mean(&costs)?;
    let target_cost = stats::percentile(&costs, TARGET_COST_PERCENTILE)?;
    Some(CostEfficiency {
        current_cost,
        min_cost: stats::min(&costs)?,
        target_cost,
        potential_savings: current_cost - target_cost,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub labor_per_ounce: f64,
    pub equipment_per_ounce: f64,
}

/// Estimated labor and equipment cost per ounce at fixed unit rates
pub fn cost_breakdown(data: &[ProductionRecord]) -> Option<CostBreakdown> {
    let labor = column(data, |r| f64::from(r.workers) * LABOR_COST_PER_WORKER / r.gold_extracted);
    let equipment = column(data, |r| r.equipment_hours * EQUIPMENT_COST_PER_HOUR / r.gold_extracted);
    Some(CostBreakdown {
        labor_per_ounce: stats::mean(&labor)?,
        equipment_per_ounce: stats::mean(&equipment)?,
    })
}

/// Pearson correlation of gold extracted against operational cost
pub fn production_cost_correlation(data: &[ProductionRecord]) -> Option<f64> {
    stats::pearson(
        &column(data, |r| r.gold_extracted),
        &column(data, |r| r.operational_cost),
    )
}

// =============================================================================
// Breakeven and sensitivity
// =============================================================================

/// `mean(cost) / mean(gold)`: the price at which average revenue equals
/// average cost. Falls back to `DEFAULT_BREAKEVEN_PRICE`.
pub fn breakeven_price(data: &[ProductionRecord]) -> f64 {
    let production = stats::mean(&column(data, |r| r.gold_extracted));
    let cost = stats::mean(&column(data, |r| r.operational_cost));
    match (production, cost) {
        (Some(p), Some(c)) if p > 0.0 => c / p,
        _ => DEFAULT_BREAKEVEN_PRICE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSensitivity {
    /// Profit change per shift for a `SENSITIVITY_DELTA` move in price
    pub price_impact: f64,
    pub minimum_viable_price: f64,
}

/// Linear approximation around current operating levels: production and
/// cost are held at their means, so this is not an optimisation over them.
pub fn price_sensitivity(data: &[ProductionRecord]) -> PriceSensitivity {
    let impact = stats::mean(&column(data, |r| r.gold_extracted))
        .map(|p| p * SENSITIVITY_DELTA)
        .unwrap_or(0.0);
    PriceSensitivity {
        price_impact: impact,
        minimum_viable_price: breakeven_price(data),
    }
}

// =============================================================================
// Profitability
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profitability {
    pub total_production: f64,
    pub total_costs: f64,
    pub total_revenue: f64,
    pub total_profit: f64,
    /// Percent of revenue; 0 when revenue is 0
    pub profit_margin: f64,
    pub cost_per_ounce: f64,
    pub avg_profit: f64,
    pub profit_std: f64,
    pub best: ProductionRecord,
    pub best_profit: f64,
}

pub fn profitability(data: &[ProductionRecord], price: f64) -> Option<Profitability> {
    let total_production: f64 = data.iter().map(|r| r.gold_extracted).sum();
    let total_costs: f64 = data.iter().map(|r| r.operational_cost).sum();
    let total_revenue = total_production * price;
    let total_profit = total_revenue - total_costs;
    let profits = column(data, |r| r.profit_at(price));

    // first record wins ties
    let (best_idx, best_profit) = profits
        .iter()
        .copied()
        .enumerate()
        .fold(None, |acc: Option<(usize, f64)>, (i, p)| match acc {
            Some((_, bp)) if p <= bp => acc,
            _ => Some((i, p)),
        })?;

    Some(Profitability {
        total_production,
        total_costs,
        total_revenue,
        total_profit,
        profit_margin: if total_revenue != 0.0 { total_profit / total_revenue * 100.0 } else { 0.0 },
        cost_per_ounce: if total_production > 0.0 { total_costs / total_production } else { 0.0 },
        avg_profit: total_profit / data.len() as f64,
        profit_std: stats::population_std(&profits)?,
        best: data[best_idx].clone(),
        best_profit,
    })
}
