//! Synthetic shift history used to seed the store at startup.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::record::{round_to, ProductionRecord, Shift, ShiftReport, Weather};

const BASE_PRODUCTION: f64 = 35.0;

// Same order as `Weather::ALL`
const WEATHER_WEIGHTS: [f64; 6] = [0.30, 0.25, 0.20, 0.15, 0.05, 0.05];

fn shift_multiplier(shift: Shift) -> f64 {
    match shift {
        Shift::Day => 1.2,
        Shift::Evening => 1.0,
        Shift::Night => 0.8,
    }
}

fn weather_multiplier(weather: Weather) -> f64 {
    match weather {
        Weather::Clear => 1.1,
        Weather::PartlyCloudy => 1.0,
        Weather::Cloudy => 0.95,
        Weather::LightRain => 0.85,
        Weather::HeavyRain => 0.6,
        Weather::Windy => 0.9,
    }
}

/// Generate `days` days of Day/Evening/Night records ending the day before `today`.
pub fn generate(days: u32, today: NaiveDate, seed: u64) -> Result<Vec<ProductionRecord>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let weather_dist = WeightedIndex::new(WEATHER_WEIGHTS)?;
    let start = today - Duration::days(i64::from(days));
    let mut out = Vec::with_capacity(days as usize * Shift::ALL.len());

    for day in 0..days {
        let date = start + Duration::days(i64::from(day));
        for shift in Shift::ALL {
            let weather = Weather::ALL[weather_dist.sample(&mut rng)];
            let factor = weather_multiplier(weather) * rng.gen_range(0.8..1.2);
            let gold = BASE_PRODUCTION * shift_multiplier(shift) * factor;

            // 2.5-4% recovery
            let ore = gold / rng.gen_range(0.025..0.040);

            let workers: u32 = rng.gen_range(18..32);
            let hours = f64::from(workers) * 8.0 * rng.gen_range(0.8..1.2);

            let cost_per_worker = rng.gen_range(200.0..300.0);
            let cost_per_hour = rng.gen_range(50.0..75.0);
            let cost = f64::from(workers) * cost_per_worker + hours * cost_per_hour;

            let report = ShiftReport {
                date,
                shift,
                gold_extracted: round_to(gold, 2),
                ore_processed: round_to(ore, 1),
                workers,
                equipment_hours: round_to(hours, 1),
                weather,
                operational_cost: round_to(cost, 2),
            };
            out.push(ProductionRecord::derive(report)?);
        }
    }
    Ok(out)
}
