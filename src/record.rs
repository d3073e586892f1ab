//! Shift-level production records and submission parsing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub const REQUIRED_FIELDS: [&str; 8] = [
    "date",
    "shift",
    "goldExtracted",
    "oreProcessed",
    "workers",
    "equipmentHours",
    "weather",
    "operationalCost",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    Day,
    Evening,
    Night,
}

impl Shift {
    pub const ALL: [Shift; 3] = [Shift::Day, Shift::Evening, Shift::Night];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Day => "Day",
            Shift::Evening => "Evening",
            Shift::Night => "Night",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shift::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown shift '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    Clear,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Cloudy,
    #[serde(rename = "Light Rain")]
    LightRain,
    #[serde(rename = "Heavy Rain")]
    HeavyRain,
    Windy,
}

impl Weather {
    pub const ALL: [Weather; 6] = [
        Weather::Clear,
        Weather::PartlyCloudy,
        Weather::Cloudy,
        Weather::LightRain,
        Weather::HeavyRain,
        Weather::Windy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Clear => "Clear",
            Weather::PartlyCloudy => "Partly Cloudy",
            Weather::Cloudy => "Cloudy",
            Weather::LightRain => "Light Rain",
            Weather::HeavyRain => "Heavy Rain",
            Weather::Windy => "Windy",
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weather {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weather::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown weather '{}'", s))
    }
}

/// Validated raw measurements for one shift, before derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftReport {
    pub date: NaiveDate,
    pub shift: Shift,
    pub gold_extracted: f64,
    pub ore_processed: f64,
    pub workers: u32,
    pub equipment_hours: f64,
    pub weather: Weather,
    pub operational_cost: f64,
}

impl ShiftReport {
    /// Parse a submission body. Fields may be JSON numbers or numeric strings.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let map = body
            .as_object()
            .ok_or_else(|| ValidationError::MalformedBody("expected a JSON object".to_string()))?;

        // Presence first, in declaration order, so the first gap is the one reported
        for field in REQUIRED_FIELDS {
            match map.get(field) {
                None | Some(Value::Null) => return Err(ValidationError::MissingField(field)),
                Some(Value::String(s)) if s.trim().is_empty() => {
                    return Err(ValidationError::MissingField(field))
                }
                _ => {}
            }
        }

        let date_str = text(map, "date")?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::invalid("date", "expected YYYY-MM-DD"))?;
        let shift = text(map, "shift")?
            .parse()
            .map_err(|e: String| ValidationError::invalid("shift", e))?;
        let weather = text(map, "weather")?
            .parse()
            .map_err(|e: String| ValidationError::invalid("weather", e))?;

        Ok(Self {
            date,
            shift,
            gold_extracted: number(map, "goldExtracted")?,
            ore_processed: number(map, "oreProcessed")?,
            workers: whole_number(map, "workers")?,
            equipment_hours: number(map, "equipmentHours")?,
            weather,
            operational_cost: number(map, "operationalCost")?,
        })
    }
}

fn text<'a>(map: &'a serde_json::Map<String, Value>, field: &'static str) -> Result<&'a str, ValidationError> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ValidationError::invalid(field, "expected a string")),
        None => Err(ValidationError::MissingField(field)),
    }
}

fn number(map: &serde_json::Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let value = match map.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
        None => return Err(ValidationError::MissingField(field)),
    };
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::invalid(field, "expected a number")),
    }
}

fn whole_number(map: &serde_json::Map<String, Value>, field: &'static str) -> Result<u32, ValidationError> {
    let v = number(map, field)?;
    if v.fract() != 0.0 || v < 1.0 || v > u32::MAX as f64 {
        return Err(ValidationError::invalid(field, "must be a positive integer"));
    }
    Ok(v as u32)
}

/// One shift's reported activity plus derived efficiency and unit cost.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub date: NaiveDate,
    pub shift: Shift,
    pub gold_extracted: f64,
    pub ore_processed: f64,
    pub workers: u32,
    pub equipment_hours: f64,
    pub weather: Weather,
    pub operational_cost: f64,
    /// Ounces recovered per ton of ore, as a percentage (2dp)
    pub efficiency: f64,
    /// Operational cost per ounce (2dp)
    pub cost_per_ounce: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProductionRecord {
    /// Apply the division guards and derive efficiency and cost per ounce.
    pub fn derive(report: ShiftReport) -> Result<Self, ValidationError> {
        if !(report.ore_processed > 0.0) {
            return Err(ValidationError::invalid("oreProcessed", "must be greater than zero"));
        }
        if !(report.gold_extracted > 0.0) {
            return Err(ValidationError::invalid("goldExtracted", "must be greater than zero"));
        }
        if report.workers == 0 {
            return Err(ValidationError::invalid("workers", "must be a positive integer"));
        }
        if report.equipment_hours < 0.0 {
            return Err(ValidationError::invalid("equipmentHours", "must not be negative"));
        }
        if report.operational_cost < 0.0 {
            return Err(ValidationError::invalid("operationalCost", "must not be negative"));
        }

        let efficiency = round2(report.gold_extracted / report.ore_processed * 100.0);
        let cost_per_ounce = round2(report.operational_cost / report.gold_extracted);

        Ok(Self {
            id: None,
            date: report.date,
            shift: report.shift,
            gold_extracted: report.gold_extracted,
            ore_processed: report.ore_processed,
            workers: report.workers,
            equipment_hours: report.equipment_hours,
            weather: report.weather,
            operational_cost: report.operational_cost,
            efficiency,
            cost_per_ounce,
            created_at: None,
        })
    }

    pub fn with_submission(mut self, id: u64, created_at: DateTime<Utc>) -> Self {
        self.id = Some(id);
        self.created_at = Some(created_at);
        self
    }

    /// Revenue minus operational cost at the given gold price
    pub fn profit_at(&self, price: f64) -> f64 {
        self.gold_extracted * price - self.operational_cost
    }
}

/// Round half away from zero to `dp` decimal places.
pub fn round_to(value: f64, dp: i32) -> f64 {
    let scale = 10f64.powi(dp);
    (value * scale).round() / scale
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> Value {
        json!({
            "date": "2024-03-01",
            "shift": "Day",
            "goldExtracted": 42.5,
            "oreProcessed": "1250",
            "workers": "24",
            "equipmentHours": 180.0,
            "weather": "partly cloudy",
            "operationalCost": "15400.50"
        })
    }

    #[test]
    fn test_parse_accepts_numeric_strings() {
        let report = ShiftReport::from_json(&body()).unwrap();
        assert_eq!(report.ore_processed, 1250.0);
        assert_eq!(report.workers, 24);
        assert_eq!(report.weather, Weather::PartlyCloudy);
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_first_missing_field_reported() {
        let mut b = body();
        b.as_object_mut().unwrap().remove("workers");
        b["oreProcessed"] = json!("");
        let err = ShiftReport::from_json(&b).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("oreProcessed"));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let mut b = body();
        b["goldExtracted"] = json!("lots");
        let err = ShiftReport::from_json(&b).unwrap_err();
        assert_eq!(err.field(), Some("goldExtracted"));
    }

    #[test]
    fn test_fractional_workers_rejected() {
        let mut b = body();
        b["workers"] = json!(12.5);
        assert_eq!(ShiftReport::from_json(&b).unwrap_err().field(), Some("workers"));
    }

    #[test]
    fn test_unknown_shift_rejected() {
        let mut b = body();
        b["shift"] = json!("Graveyard");
        assert_eq!(ShiftReport::from_json(&b).unwrap_err().field(), Some("shift"));
    }

    #[test]
    fn test_non_object_body() {
        let err = ShiftReport::from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedBody(_)));
    }

    #[test]
    fn test_derived_fields() {
        let record = ProductionRecord::derive(ShiftReport::from_json(&body()).unwrap()).unwrap();
        assert_eq!(record.efficiency, 3.4);
        assert_eq!(record.cost_per_ounce, 362.36);
    }

    #[test]
    fn test_zero_ore_rejected() {
        let mut report = ShiftReport::from_json(&body()).unwrap();
        report.ore_processed = 0.0;
        let err = ProductionRecord::derive(report).unwrap_err();
        assert_eq!(err.field(), Some("oreProcessed"));
    }

    #[test]
    fn test_zero_gold_rejected() {
        let mut report = ShiftReport::from_json(&body()).unwrap();
        report.gold_extracted = 0.0;
        assert_eq!(ProductionRecord::derive(report).unwrap_err().field(), Some("goldExtracted"));
    }

    #[test]
    fn test_serializes_camel_case_with_canonical_weather() {
        let record = ProductionRecord::derive(ShiftReport::from_json(&body()).unwrap()).unwrap();
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["weather"], "Partly Cloudy");
        assert_eq!(v["goldExtracted"], 42.5);
        assert_eq!(v["date"], "2024-03-01");
        assert!(v.get("id").is_none());
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(-2.345_000_1), -2.35);
        assert_eq!(round_to(123.456, 1), 123.5);
    }
}
