//! Templated insight reports built from the derived metrics.
//!
//! Confidence values are authorial constants per insight kind. They are not
//! computed from the data and carry no statistical meaning.

use serde::Serialize;

use crate::analytics::{self, SENSITIVITY_DELTA};
use crate::record::ProductionRecord;
use crate::stats::{self, extrapolate, linear_trend, tail};

pub const MIN_FORECAST_RECORDS: usize = 10;
const FORECAST_WINDOW: usize = 21;
const FORECAST_DAYS: usize = 7;
const EFFICIENCY_WINDOW: usize = 14;
const COST_WINDOW: usize = 10;
const COST_HORIZON: f64 = 7.0;
const TARGET_EFFICIENCY: f64 = 4.5;
const BENCHMARK_EFFICIENCY: f64 = 4.0;
const ASSUMED_HEADCOUNT: f64 = 25.0;
const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsightKind {
    ProductionForecast,
    WeatherImpact,
    EfficiencyForecast,
    OptimalShift,
    Workforce,
    EquipmentUtilization,
    CostOptimization,
    EfficiencyOverview,
    WeatherEfficiency,
    EfficiencyTrend,
    CostAnalysis,
    ProductionCostCorrelation,
    CostBreakdown,
    CostTrend,
    MarketPosition,
    PriceSensitivity,
    MarketTiming,
    Profitability,
    ReturnOnInvestment,
    OptimizationPotential,
    ProfitabilityRisk,
    InsufficientData,
}

impl InsightKind {
    pub fn title(&self) -> &'static str {
        match self {
            InsightKind::ProductionForecast => "7-Day Production Forecast",
            InsightKind::WeatherImpact => "Weather Impact Analysis",
            InsightKind::EfficiencyForecast => "Efficiency Optimization Forecast",
            InsightKind::OptimalShift => "Optimal Shift Performance",
            InsightKind::Workforce => "Workforce Optimization",
            InsightKind::EquipmentUtilization => "Equipment Utilization",
            InsightKind::CostOptimization => "Cost Efficiency Optimization",
            InsightKind::EfficiencyOverview => "Efficiency Performance Overview",
            InsightKind::WeatherEfficiency => "Weather Impact on Efficiency",
            InsightKind::EfficiencyTrend => "Efficiency Trend Analysis",
            InsightKind::CostAnalysis => "Cost Efficiency Analysis",
            InsightKind::ProductionCostCorrelation => "Production-Cost Correlation",
            InsightKind::CostBreakdown => "Cost Breakdown Analysis",
            InsightKind::CostTrend => "Cost Trend Prediction",
            InsightKind::MarketPosition => "Current Market Position",
            InsightKind::PriceSensitivity => "Price Sensitivity Analysis",
            InsightKind::MarketTiming => "Market Timing Analysis",
            InsightKind::Profitability => "Overall Profitability Analysis",
            InsightKind::ReturnOnInvestment => "Return on Investment",
            InsightKind::OptimizationPotential => "Optimization Potential",
            InsightKind::ProfitabilityRisk => "Profitability Risk Assessment",
            InsightKind::InsufficientData => "Insufficient Data",
        }
    }

    /// Fixed confidence percentage for this kind
    pub fn confidence(&self) -> u8 {
        match self {
            InsightKind::ProductionForecast => 85,
            InsightKind::WeatherImpact => 78,
            InsightKind::EfficiencyForecast => 82,
            InsightKind::OptimalShift => 88,
            InsightKind::Workforce => 79,
            InsightKind::EquipmentUtilization => 85,
            InsightKind::CostOptimization => 81,
            InsightKind::EfficiencyOverview => 92,
            InsightKind::WeatherEfficiency => 86,
            InsightKind::EfficiencyTrend => 79,
            InsightKind::CostAnalysis => 87,
            InsightKind::ProductionCostCorrelation => 83,
            InsightKind::CostBreakdown => 80,
            InsightKind::CostTrend => 75,
            InsightKind::MarketPosition => 90,
            InsightKind::PriceSensitivity => 85,
            InsightKind::MarketTiming => 78,
            InsightKind::Profitability => 95,
            InsightKind::ReturnOnInvestment => 88,
            InsightKind::OptimizationPotential => 82,
            InsightKind::ProfitabilityRisk => 79,
            InsightKind::InsufficientData => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
    pub confidence: u8,
}

impl Insight {
    pub fn new(kind: InsightKind, description: String) -> Self {
        Self {
            title: kind.title().to_string(),
            description,
            confidence: kind.confidence(),
        }
    }

    fn insufficient(description: &str) -> Self {
        Self::new(InsightKind::InsufficientData, description.to_string())
    }
}

/// Price inputs for the market-facing reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketContext {
    pub current_price: f64,
    /// Mean of the retained price samples, if any
    pub history_mean: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Forecast,
    Optimize,
    Efficiency,
    CostPrediction,
    MarketAnalysis,
    Profitability,
}

impl Report {
    pub const ALL: [Report; 6] = [
        Report::Forecast,
        Report::Optimize,
        Report::Efficiency,
        Report::CostPrediction,
        Report::MarketAnalysis,
        Report::Profitability,
    ];

    /// Look up a report by its route name, e.g. `cost-prediction`
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Report::Forecast => "forecast",
            Report::Optimize => "optimize",
            Report::Efficiency => "efficiency",
            Report::CostPrediction => "cost-prediction",
            Report::MarketAnalysis => "market-analysis",
            Report::Profitability => "profitability",
        }
    }

    pub fn build(&self, data: &[ProductionRecord], market: MarketContext) -> Vec<Insight> {
        match self {
            Report::Forecast => forecast(data),
            Report::Optimize => optimize(data),
            Report::Efficiency => efficiency(data),
            Report::CostPrediction => cost_prediction(data),
            Report::MarketAnalysis => market_analysis(data, market),
            Report::Profitability => profitability(data, market.current_price),
        }
    }
}

fn direction<'a>(slope: f64, up: &'a str, down: &'a str, flat: &'a str) -> &'a str {
    if slope > 0.0 {
        up
    } else if slope < 0.0 {
        down
    } else {
        flat
    }
}

/// Fixed-point rendering with thousands separators, e.g. `-12,345.6`
pub fn grouped(value: f64, dp: usize) -> String {
    let raw = format!("{:.*}", dp, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let mut out = String::with_capacity(raw.len() + int_part.len() / 3 + 1);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    // "-0" is not worth printing
    if value < 0.0 && out.chars().any(|c| c != '0' && c != ',' && c != '.') {
        out.insert(0, '-');
    }
    out
}

fn ratio_pct(num: f64, den: f64) -> f64 {
    if den != 0.0 {
        num / den * 100.0
    } else {
        0.0
    }
}

// =============================================================================
// Reports
// =============================================================================

pub fn forecast(data: &[ProductionRecord]) -> Vec<Insight> {
    if data.len() < MIN_FORECAST_RECORDS {
        return vec![Insight::insufficient("Need more historical data for accurate forecasting.")];
    }
    let gold = analytics::column(data, |r| r.gold_extracted);
    let recent = tail(&gold, FORECAST_WINDOW);
    let trend = linear_trend(recent);
    let base = stats::mean(recent).unwrap_or(0.0);
    let total: f64 = (0..FORECAST_DAYS)
        .map(|day| extrapolate(base, trend, day as f64).max(0.0))
        .sum();

    let impact = analytics::weather_impact(data);

    let efficiencies = analytics::column(data, |r| r.efficiency);
    let avg_efficiency = stats::mean(&efficiencies).unwrap_or(0.0);
    let efficiency_trend = linear_trend(tail(&efficiencies, EFFICIENCY_WINDOW));

    vec![
        Insight::new(
            InsightKind::ProductionForecast,
            format!(
                "Predicted total production: {:.1} oz gold. Daily average: {:.1} oz. Trend analysis shows {} production pattern.",
                total,
                total / FORECAST_DAYS as f64,
                direction(trend, "increasing", "decreasing", "stable"),
            ),
        ),
        Insight::new(
            InsightKind::WeatherImpact,
            format!(
                "Clear weather conditions increase production by {:.1}%. Heavy rain reduces production by {:.1}%. Consider weather forecasts for operational planning.",
                impact.clear_boost, impact.rain_penalty,
            ),
        ),
        Insight::new(
            InsightKind::EfficiencyForecast,
            format!(
                "Current efficiency averaging {:.2}%. Trend shows {} efficiency. Target: achieve {}% efficiency for optimal gold recovery.",
                avg_efficiency,
                if efficiency_trend > 0.0 { "improving" } else { "declining" },
                TARGET_EFFICIENCY,
            ),
        ),
    ]
}

pub fn optimize(data: &[ProductionRecord]) -> Vec<Insight> {
    let (Some(best), Some(workers), Some(equipment), Some(cost)) = (
        analytics::best_shift(data),
        analytics::worker_efficiency(data),
        analytics::equipment_utilization(data),
        analytics::cost_efficiency(data),
    ) else {
        return vec![Insight::insufficient("No production records available for optimization.")];
    };

    vec![
        Insight::new(
            InsightKind::OptimalShift,
            format!(
                "{} shift shows highest average production ({:.1} oz). Consider allocating experienced workers and premium equipment to {} operations.",
                best.key,
                best.mean,
                best.key.as_str().to_lowercase(),
            ),
        ),
        Insight::new(
            InsightKind::Workforce,
            format!(
                "Optimal worker count: {} per shift. Current efficiency: {:.2} oz/worker. Potential {:.1}% improvement with optimization.",
                workers.optimal_workers, workers.current_efficiency, workers.improvement_potential,
            ),
        ),
        Insight::new(
            InsightKind::EquipmentUtilization,
            format!(
                "Average equipment utilization: {:.1} hours/shift. High-production correlates with {:.0}-{:.0} hours. Consider maintenance scheduling during low-efficiency periods.",
                equipment.avg_hours, equipment.optimal_low, equipment.optimal_high,
            ),
        ),
        Insight::new(
            InsightKind::CostOptimization,
            format!(
                "Target cost per ounce: ${:.0}. Current average: ${:.0}. Potential savings: ${:.0}/oz through operational improvements.",
                cost.target_cost, cost.current_cost, cost.potential_savings,
            ),
        ),
    ]
}

pub fn efficiency(data: &[ProductionRecord]) -> Vec<Insight> {
    let efficiencies = analytics::column(data, |r| r.efficiency);
    let by_weather = analytics::grouped_mean(data, |r| r.weather, |r| r.efficiency);
    let (Some(avg), Some(peak), Some(best), Some(worst)) = (
        stats::mean(&efficiencies),
        stats::max(&efficiencies),
        analytics::best_group(&by_weather),
        analytics::worst_group(&by_weather),
    ) else {
        return vec![Insight::insufficient("No production records available for efficiency analysis.")];
    };
    let trend = linear_trend(tail(&efficiencies, EFFICIENCY_WINDOW));

    vec![
        Insight::new(
            InsightKind::EfficiencyOverview,
            format!(
                "Average operational efficiency: {:.2}%. Peak efficiency achieved: {:.2}%. Industry benchmark: 4.0-5.0%. {} industry standard.",
                avg,
                peak,
                if avg > BENCHMARK_EFFICIENCY { "Above" } else { "Below" },
            ),
        ),
        Insight::new(
            InsightKind::WeatherEfficiency,
            format!(
                "Best conditions: {} ({:.2}% efficiency). Worst conditions: {} ({:.2}% efficiency). Weather planning critical for optimization.",
                best.key, best.mean, worst.key, worst.mean,
            ),
        ),
        Insight::new(
            InsightKind::EfficiencyTrend,
            format!(
                "2-week efficiency trend: {} ({:.3}% per day). {} for continued optimization.",
                direction(trend, "Improving", "Declining", "Stable"),
                trend.abs(),
                if trend >= 0.0 { "Maintain current practices" } else { "Review operational procedures" },
            ),
        ),
    ]
}

pub fn cost_prediction(data: &[ProductionRecord]) -> Vec<Insight> {
    let costs = analytics::column(data, |r| r.cost_per_ounce);
    // first record wins ties
    let cheapest = data.iter().reduce(|a, b| if b.cost_per_ounce < a.cost_per_ounce { b } else { a });
    let (Some(avg), Some(cheapest), Some(breakdown)) =
        (stats::mean(&costs), cheapest, analytics::cost_breakdown(data))
    else {
        return vec![Insight::insufficient("No production records available for cost prediction.")];
    };

    let correlation = analytics::production_cost_correlation(data).unwrap_or(0.0);
    let (strength, effect) = if correlation > 0.7 {
        ("Strong positive", "significantly")
    } else if correlation > 0.4 {
        ("Moderate", "moderately")
    } else {
        ("Weak", "moderately")
    };

    let recent = tail(&costs, COST_WINDOW);
    let cost_trend = linear_trend(recent);
    let last = recent.last().copied().unwrap_or(avg);
    let predicted = extrapolate(last, cost_trend, COST_HORIZON);

    vec![
        Insight::new(
            InsightKind::CostAnalysis,
            format!(
                "Average cost per ounce: ${:.0}. Lowest achieved: ${:.0} (Date: {}, {} shift, {} weather). Target cost reduction: {:.1}%.",
                avg,
                cheapest.cost_per_ounce,
                cheapest.date.format("%Y-%m-%d"),
                cheapest.shift,
                cheapest.weather,
                ratio_pct(avg - cheapest.cost_per_ounce, avg),
            ),
        ),
        Insight::new(
            InsightKind::ProductionCostCorrelation,
            format!(
                "Cost-production correlation: {:.2}. {} relationship. Higher production {} increases operational costs.",
                correlation, strength, effect,
            ),
        ),
        Insight::new(
            InsightKind::CostBreakdown,
            format!(
                "Labor cost per ounce: ${:.0}. Equipment cost per ounce: ${:.0}. Focus on {} efficiency for maximum cost reduction.",
                breakdown.labor_per_ounce,
                breakdown.equipment_per_ounce,
                if breakdown.labor_per_ounce > breakdown.equipment_per_ounce { "labor" } else { "equipment" },
            ),
        ),
        Insight::new(
            InsightKind::CostTrend,
            format!(
                "Predicted cost per ounce (7 days): ${:.0}. Current trend: {} costs. {} to optimize profitability.",
                predicted,
                direction(cost_trend, "Increasing", "Decreasing", "Stable"),
                if cost_trend > 0.0 { "Implement cost control measures" } else { "Maintain current efficiency" },
            ),
        ),
    ]
}

pub fn market_analysis(data: &[ProductionRecord], market: MarketContext) -> Vec<Insight> {
    if data.is_empty() {
        return vec![Insight::insufficient("No production records available for market analysis.")];
    }
    let price = market.current_price;
    let breakeven = analytics::breakeven_price(data);
    let sensitivity = analytics::price_sensitivity(data);

    let historical = market.history_mean.filter(|m| *m > 0.0).unwrap_or(price);
    let status = if price > historical * 1.1 {
        "Strong market conditions. Consider maximizing production."
    } else if price < historical * 0.9 {
        "Challenging market. Focus on cost optimization."
    } else {
        "Stable market conditions. Maintain consistent operations."
    };

    vec![
        Insight::new(
            InsightKind::MarketPosition,
            format!(
                "Gold trading at ${}/oz. Based on recent production costs, your breakeven price is approximately ${}/oz. Current market provides {:.1}% profit buffer.",
                grouped(price, 0),
                grouped(breakeven, 0),
                ratio_pct(price - breakeven, breakeven),
            ),
        ),
        Insight::new(
            InsightKind::PriceSensitivity,
            format!(
                "A ${} gold price increase would boost daily profit by ${}. At current efficiency, you need gold above ${}/oz for profitable operations.",
                SENSITIVITY_DELTA,
                grouped(sensitivity.price_impact, 0),
                grouped(sensitivity.minimum_viable_price, 0),
            ),
        ),
        Insight::new(
            InsightKind::MarketTiming,
            format!(
                "Current price vs historical average: {:+.1}%. {}",
                ratio_pct(price - historical, historical),
                status,
            ),
        ),
    ]
}

pub fn profitability(data: &[ProductionRecord], price: f64) -> Vec<Insight> {
    let Some(p) = analytics::profitability(data, price) else {
        return vec![Insight::insufficient("No production records available for profitability analysis.")];
    };

    let avg = p.avg_profit;
    let risk = if p.profit_std > avg * 0.5 {
        "High"
    } else if p.profit_std > avg * 0.3 {
        "Medium"
    } else {
        "Low"
    };
    let uplift = if avg > 0.0 { (p.best_profit - avg) / avg * 100.0 } else { 0.0 };
    let variation = if avg > 0.0 { p.profit_std / avg * 100.0 } else { 0.0 };

    vec![
        Insight::new(
            InsightKind::Profitability,
            format!(
                "Total profit: ${} from {:.1} oz production. Profit margin: {:.1}%. Revenue per ounce: ${}. Cost per ounce: ${:.0}.",
                grouped(p.total_profit, 0),
                p.total_production,
                p.profit_margin,
                grouped(price, 0),
                p.cost_per_ounce,
            ),
        ),
        Insight::new(
            InsightKind::ReturnOnInvestment,
            format!(
                "Daily average profit: ${}. Monthly projected profit: ${}. Profit per employee per day: ${} (assuming {} workers).",
                grouped(avg, 0),
                grouped(avg * DAYS_PER_MONTH, 0),
                grouped(avg / ASSUMED_HEADCOUNT, 0),
                ASSUMED_HEADCOUNT,
            ),
        ),
        Insight::new(
            InsightKind::OptimizationPotential,
            format!(
                "Best single-day profit: ${} ({}, {} shift). Replicating these conditions could increase average daily profit by {:.1}%.",
                grouped(p.best_profit, 0),
                p.best.date.format("%Y-%m-%d"),
                p.best.shift,
                uplift,
            ),
        ),
        Insight::new(
            InsightKind::ProfitabilityRisk,
            format!(
                "Profit variability: ${} (Risk level: {}). Weather and operational factors cause {:.1}% profit variation. Consider hedging strategies for price protection.",
                grouped(p.profit_std, 0),
                risk,
                variation,
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Shift, ShiftReport, Weather};
    use chrono::NaiveDate;

    fn rec(day: u32, shift: Shift, weather: Weather, gold: f64, cost: f64) -> ProductionRecord {
        ProductionRecord::derive(ShiftReport {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            shift,
            gold_extracted: gold,
            ore_processed: gold * 30.0,
            workers: 24,
            equipment_hours: 190.0,
            weather,
            operational_cost: cost,
        })
        .unwrap()
    }

    fn ramp(n: u32) -> Vec<ProductionRecord> {
        (0..n)
            .map(|i| {
                let shift = Shift::ALL[(i % 3) as usize];
                let weather = if i % 4 == 0 { Weather::Clear } else { Weather::Cloudy };
                rec(1 + i / 3, shift, weather, 30.0 + i as f64, 9000.0 + 100.0 * i as f64)
            })
            .collect()
    }

    fn market() -> MarketContext {
        MarketContext { current_price: 2000.0, history_mean: None }
    }

    #[test]
    fn test_confidence_is_fixed_per_kind() {
        let a = Insight::new(InsightKind::CostTrend, "x".into());
        let b = Insight::new(InsightKind::CostTrend, "y".into());
        assert_eq!(a.confidence, 75);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.title, "Cost Trend Prediction");
    }

    #[test]
    fn test_forecast_needs_ten_records() {
        let out = forecast(&ramp(9));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Insufficient Data");
    }

    #[test]
    fn test_forecast_on_rising_series() {
        let out = forecast(&ramp(21));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].confidence, 85);
        // mean 40, slope 1: 40+41+...+46 = 301
        assert!(out[0].description.starts_with("Predicted total production: 301.0 oz gold. Daily average: 43.0 oz."));
        assert!(out[0].description.contains("increasing"));
    }

    #[test]
    fn test_every_report_tolerates_empty_data() {
        for report in Report::ALL {
            let out = report.build(&[], market());
            assert_eq!(out.len(), 1, "{}", report.name());
            assert_eq!(out[0].title, "Insufficient Data");
            assert_eq!(out[0].confidence, 0);
        }
    }

    #[test]
    fn test_market_timing_without_price_history_is_flat() {
        let out = market_analysis(&ramp(12), market());
        assert_eq!(out.len(), 3);
        assert!(out[2].description.starts_with("Current price vs historical average: +0.0%."));
        assert!(out[2].description.contains("Stable market conditions"));
    }

    #[test]
    fn test_market_timing_against_price_history() {
        let ctx = MarketContext { current_price: 2300.0, history_mean: Some(2000.0) };
        let out = market_analysis(&ramp(12), ctx);
        assert!(out[2].description.contains("+15.0%"));
        assert!(out[2].description.contains("Strong market conditions"));
    }

    #[test]
    fn test_optimize_names_best_shift() {
        let out = optimize(&ramp(12));
        assert_eq!(out.len(), 4);
        // Night rows carry the largest gold values in the ramp
        assert!(out[0].description.starts_with("Night shift"));
        assert!(out[0].description.contains("to night operations"));
    }

    #[test]
    fn test_flat_production_reads_stable() {
        let flat: Vec<ProductionRecord> = (0..21)
            .map(|i| rec(1 + i / 3, Shift::ALL[(i % 3) as usize], Weather::Clear, 4.2, 900.0))
            .collect();
        let out = forecast(&flat);
        assert!(out[0].description.contains("shows stable production pattern"), "{}", out[0].description);

        let out = efficiency(&flat);
        assert!(out[2].description.starts_with("2-week efficiency trend: Stable (0.000% per day)."));

        let out = cost_prediction(&flat);
        assert!(out[3].description.contains("Current trend: Stable costs."));
    }

    #[test]
    fn test_cost_prediction_reports_cheapest_record() {
        let out = cost_prediction(&ramp(12));
        assert_eq!(out.len(), 4);
        // last ramp row: 10100 / 41 = 246.34 $/oz
        assert!(
            out[0].description.contains("Lowest achieved: $246 (Date: 2024-02-04, Night shift, Cloudy weather)."),
            "{}",
            out[0].description
        );
        assert!(out[1].description.contains("Strong positive"));
    }

    #[test]
    fn test_cheapest_record_tie_keeps_first() {
        let data = vec![
            rec(3, Shift::Day, Weather::Windy, 40.0, 8000.0),
            rec(5, Shift::Evening, Weather::Clear, 40.0, 8000.0),
            rec(7, Shift::Night, Weather::HeavyRain, 20.0, 9000.0),
        ];
        let out = cost_prediction(&data);
        assert!(out[0].description.contains("Lowest achieved: $200 (Date: 2024-02-03, Day shift, Windy weather)."));
    }

    #[test]
    fn test_profitability_report() {
        let out = profitability(&ramp(10), 2000.0);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].confidence, 95);
        assert!(out[3].description.contains("Risk level: Low"));
    }

    #[test]
    fn test_report_names_round_trip() {
        for report in Report::ALL {
            assert_eq!(Report::from_name(report.name()), Some(report));
        }
        assert_eq!(Report::from_name("predict"), None);
    }

    #[test]
    fn test_grouped_formatting() {
        assert_eq!(grouped(0.0, 0), "0");
        assert_eq!(grouped(999.4, 0), "999");
        assert_eq!(grouped(1234567.0, 0), "1,234,567");
        assert_eq!(grouped(-12345.67, 1), "-12,345.7");
        assert_eq!(grouped(-0.2, 0), "0");
    }
}
