//! Waste cost and savings projection

use fillcheck_types::{Error, Result};
use serde::{Deserialize, Serialize};

/// Average weeks per month used for monthly projections
pub const WEEKS_PER_MONTH: f64 = 4.33;
pub const WEEKS_PER_YEAR: f64 = 52.0;

/// Inputs for a cost projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostInputs {
    /// Purchase cost per unit of wasted food
    pub cost_per_unit: f64,
    /// Disposal cost per unit
    pub disposal_cost: f64,
    /// Labor cost per hour
    pub labor_cost_per_hour: f64,
    /// Labor minutes spent handling one unit of waste
    pub labor_minutes_per_unit: f64,
    /// Units wasted per working day
    pub daily_waste: f64,
    pub days_per_week: f64,
    /// Targeted waste reduction, in percent
    pub reduction_target_percent: f64,
}

impl Default for CostInputs {
    fn default() -> Self {
        Self {
            cost_per_unit: 2.5,
            disposal_cost: 0.5,
            labor_cost_per_hour: 15.0,
            labor_minutes_per_unit: 2.0,
            daily_waste: 10.0,
            days_per_week: 5.0,
            reduction_target_percent: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodAmounts {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
    pub annual: f64,
}

impl PeriodAmounts {
    fn from_daily(daily: f64, days_per_week: f64) -> Self {
        let weekly = daily * days_per_week;
        Self {
            daily,
            weekly,
            monthly: weekly * WEEKS_PER_MONTH,
            annual: weekly * WEEKS_PER_YEAR,
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            daily: self.daily * factor,
            weekly: self.weekly * factor,
            monthly: self.monthly * factor,
            annual: self.annual * factor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostProjection {
    pub cost_per_unit_total: f64,
    pub costs: PeriodAmounts,
    pub savings: PeriodAmounts,
    pub reduced_costs: PeriodAmounts,
}

/// Project waste costs and the savings from hitting the reduction target
pub fn project_costs(inputs: &CostInputs) -> Result<CostProjection> {
    let fields = [
        ("cost_per_unit", inputs.cost_per_unit),
        ("disposal_cost", inputs.disposal_cost),
        ("labor_cost_per_hour", inputs.labor_cost_per_hour),
        ("labor_minutes_per_unit", inputs.labor_minutes_per_unit),
        ("daily_waste", inputs.daily_waste),
        ("days_per_week", inputs.days_per_week),
        ("reduction_target_percent", inputs.reduction_target_percent),
    ];
    for (name, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }
    if inputs.days_per_week > 7.0 {
        return Err(Error::InvalidParameter(format!(
            "days_per_week must be at most 7, got {}",
            inputs.days_per_week
        )));
    }

    let labor_per_unit = inputs.labor_cost_per_hour / 60.0 * inputs.labor_minutes_per_unit;
    let cost_per_unit_total = inputs.cost_per_unit + inputs.disposal_cost + labor_per_unit;

    let costs = PeriodAmounts::from_daily(inputs.daily_waste * cost_per_unit_total, inputs.days_per_week);
    let reduction = inputs.reduction_target_percent / 100.0;
    let savings = costs.scaled(reduction);
    let reduced_costs = costs.scaled(1.0 - reduction);

    Ok(CostProjection {
        cost_per_unit_total,
        costs,
        savings,
        reduced_costs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_projection() {
        // per unit: 2.5 + 0.5 + 15/60*2 = 3.5; daily: 35; weekly: 175
        let p = project_costs(&CostInputs::default()).unwrap();
        assert!((p.cost_per_unit_total - 3.5).abs() < 1e-9);
        assert!((p.costs.daily - 35.0).abs() < 1e-9);
        assert!((p.costs.weekly - 175.0).abs() < 1e-9);
        assert!((p.costs.monthly - 757.75).abs() < 1e-9);
        assert!((p.costs.annual - 9100.0).abs() < 1e-9);
        assert!((p.savings.annual - 1820.0).abs() < 1e-9);
        assert!((p.reduced_costs.weekly - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_waste_costs_nothing() {
        let inputs = CostInputs {
            daily_waste: 0.0,
            ..CostInputs::default()
        };
        let p = project_costs(&inputs).unwrap();
        assert_eq!(p.costs.annual, 0.0);
        assert_eq!(p.savings.annual, 0.0);
    }

    #[test]
    fn test_negative_input_rejected() {
        let inputs = CostInputs {
            disposal_cost: -1.0,
            ..CostInputs::default()
        };
        assert!(matches!(project_costs(&inputs), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_eight_day_week_rejected() {
        let inputs = CostInputs {
            days_per_week: 8.0,
            ..CostInputs::default()
        };
        assert!(project_costs(&inputs).is_err());
    }
}
