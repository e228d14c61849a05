//! The module responsible for writing planning results as plain-text reports.
use crate::financing::FinancingType;
use crate::market::Scenario;
use crate::planning::schedule::ScheduleResult;
use crate::planning::{BudgetOutput, MixAdvice, RegionAdvice, Selection, TimelineAdvice};
use crate::purchase::YearlyStrategy;
use crate::stock::StockSummary;
use crate::summary::{BudgetSummary, YearlyCosts};
use crate::typology::TypologyMix;
use crate::units::{Dimensionless, Money};
use anyhow::Result;
use std::io::Write;
use strum::IntoEnumIterator;

fn percent(share: Dimensionless) -> f64 {
    share.value() * 100.0
}

/// Write one row per purchase year
pub fn write_strategy_table<W: Write>(out: &mut W, strategies: &[YearlyStrategy]) -> Result<()> {
    writeln!(
        out,
        "{:>6} {:>14} {:>16} {:>16} {:>16} {:>16}",
        "year", "quantity", "low", "medium", "high", "financed"
    )?;
    for strategy in strategies {
        writeln!(
            out,
            "{:>6} {:>14.2} {:>16.2} {:>16.2} {:>16.2} {:>16.2}",
            strategy.year,
            strategy.quantity_purchased,
            strategy.costs.low,
            strategy.costs.medium,
            strategy.costs.high,
            YearlyCosts::new(strategy).total().medium,
        )?;
    }

    Ok(())
}

/// Write a description of a schedule's outcome and, if it bought anything, the strategy table
pub fn write_budget_output<W: Write>(out: &mut W, output: &BudgetOutput) -> Result<()> {
    match &output.result {
        ScheduleResult::Filled(_) => writeln!(out, "All credits were bought.")?,
        ScheduleResult::Depleted(schedule) => writeln!(
            out,
            "Sources were depleted before all credits were bought ({:.2} unbought).",
            schedule.remaining
        )?,
        ScheduleResult::Infeasible => {
            writeln!(out, "No schedule buys all of the credits.")?;
            return Ok(());
        }
    }

    writeln!(out)?;
    write_strategy_table(out, &output.strategies)
}

/// Write the totals and cost breakdowns of a schedule
pub fn write_summary<W: Write>(out: &mut W, summary: &BudgetSummary) -> Result<()> {
    writeln!(out, "Quantity bought: {:.2}", summary.quantity)?;
    writeln!(out, "Horizon: {} years", summary.duration)?;
    writeln!(
        out,
        "{:>8} {:>16} {:>16} {:>12}",
        "scenario", "total cost", "yearly cost", "unit price"
    )?;
    for scenario in Scenario::iter() {
        writeln!(
            out,
            "{:>8} {:>16.2} {:>16.2} {:>12.2}",
            scenario,
            summary.total_costs.get(scenario),
            summary.average_yearly_cost(scenario),
            summary.average_price(scenario),
        )?;
    }

    writeln!(out, "\nCost by typology (medium):")?;
    let typology_shares = summary.typology_cost_shares();
    for (typology, costs) in &summary.cost_per_typology {
        if costs.medium > Money(0.0) {
            writeln!(
                out,
                "  {:<18} {:>16.2} {:>6.1}%",
                typology,
                costs.medium,
                percent(typology_shares[typology])
            )?;
        }
    }

    writeln!(out, "\nCost by region (medium):")?;
    let region_shares = summary.region_cost_shares();
    for (region, costs) in &summary.cost_per_region {
        if costs.medium > Money(0.0) {
            writeln!(
                out,
                "  {:<18} {:>16.2} {:>6.1}%",
                region,
                costs.medium,
                percent(region_shares[region])
            )?;
        }
    }

    writeln!(out, "\nCost by financing (medium):")?;
    for (financing_type, costs) in &summary.cost_per_financing {
        writeln!(out, "  {:<18} {:>16.2}", financing_type, costs.medium)?;
    }

    Ok(())
}

/// Write the credits delivered into stock each year
pub fn write_stock_table<W: Write>(out: &mut W, stock: &StockSummary) -> Result<()> {
    writeln!(
        out,
        "{:>6} {:>14} {:>14} {:>14} {:>14}",
        "year", "ex_ante", "ex_post", "delivered", "cumulative"
    )?;
    let cumulative = stock.cumulative_stock();
    for (year, delivered) in stock.new_stock() {
        let by_financing = &stock.by_financing[&year];
        writeln!(
            out,
            "{:>6} {:>14.2} {:>14.2} {:>14.2} {:>14.2}",
            year,
            by_financing[&FinancingType::ExAnte],
            by_financing[&FinancingType::ExPost],
            delivered,
            cumulative[&year],
        )?;
    }

    Ok(())
}

fn write_mix<W: Write>(out: &mut W, mix: &TypologyMix) -> Result<()> {
    for (typology, share) in mix {
        if *share > Dimensionless(0.0) {
            writeln!(out, "  {:<18} {:>5.1}%", typology, percent(*share))?;
        }
    }

    Ok(())
}

/// Write typology mix advice
pub fn write_mix_advice<W: Write>(out: &mut W, advice: &MixAdvice) -> Result<()> {
    match advice {
        MixAdvice::NoChange => writeln!(out, "Typology mix: no change advised.")?,
        MixAdvice::Change { mix, cost_delta } => {
            writeln!(
                out,
                "Typology mix: this mix would save {cost_delta:.2} (medium, financed):"
            )?;
            write_mix(out, mix)?;
        }
    }

    Ok(())
}

/// Write timeline advice
pub fn write_timeline_advice<W: Write>(out: &mut W, advice: &TimelineAdvice) -> Result<()> {
    match advice {
        TimelineAdvice::NoChange => writeln!(out, "Timeline: no change advised.")?,
        TimelineAdvice::Change {
            time_constraint,
            cost_delta,
        } => writeln!(
            out,
            "Timeline: buying {time_constraint} would save {cost_delta:.2} (medium, financed)."
        )?,
    }

    Ok(())
}

/// Write geography advice
pub fn write_region_advice<W: Write>(out: &mut W, advice: RegionAdvice) -> Result<()> {
    match advice {
        RegionAdvice::NoChange => writeln!(out, "Geography: no change advised.")?,
        RegionAdvice::Reduce(region) => {
            writeln!(out, "Geography: consider buying less in {region}.")?;
        }
    }

    Ok(())
}

/// Write the outcome of configuration selection
pub fn write_selection<W: Write>(out: &mut W, selection: &Selection) -> Result<()> {
    match selection {
        Selection::NoneFound => writeln!(out, "No configuration fits the budget.")?,
        Selection::Found {
            priority,
            mix,
            output,
            money_saving,
            money_to_add,
        } => {
            writeln!(out, "Selected configuration {priority}:")?;
            write_mix(out, mix)?;
            writeln!(
                out,
                "Cost (medium, financed): {:.2}",
                output.adjusted_medium_cost()
            )?;
            if *money_saving > Money(0.0) {
                writeln!(out, "Money saved: {money_saving:.2}")?;
            }
            if *money_to_add > Money(0.0) {
                writeln!(out, "Money to add: {money_to_add:.2}")?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::Financing;
    use crate::fixture::{flat_model, single_typology_request};
    use crate::model::Model;
    use crate::planning::{BudgetRequest, run_budget_schedule};
    use crate::region::Region;
    use crate::typology::Typology;
    use indexmap::indexmap;
    use rstest::rstest;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[rstest]
    fn test_write_budget_output(flat_model: Model, single_typology_request: BudgetRequest) {
        let output = run_budget_schedule(&flat_model, &single_typology_request);
        let text = render(|out| write_budget_output(out, &output));
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "All credits were bought.");
        assert!(lines[2].contains("year") && lines[2].contains("financed"));
        // Header, blank line, column names and one row per year
        assert_eq!(lines.len(), 3 + 26);
        assert!(lines[3].trim_start().starts_with("2025"));
    }

    #[rstest]
    fn test_write_summary(flat_model: Model, single_typology_request: BudgetRequest) {
        let output = run_budget_schedule(&flat_model, &single_typology_request);
        let summary = BudgetSummary::new(&output, &flat_model.horizon());
        let text = render(|out| write_summary(out, &summary));

        assert!(text.contains("Horizon: 26 years"));
        assert!(text.contains("nbs_removal"));
        assert!(text.contains("100.0%"));
        assert!(text.contains("north_america"));
        assert!(!text.contains("biochar"));
    }

    #[rstest]
    fn test_write_stock_table(flat_model: Model, single_typology_request: BudgetRequest) {
        let request = BudgetRequest {
            financing: Financing {
                ex_ante: Dimensionless(0.5),
                ex_post: Dimensionless(0.5),
            },
            ..single_typology_request
        };
        let output = run_budget_schedule(&flat_model, &request);
        let text = render(|out| write_stock_table(out, &StockSummary::new(&output.strategies)));
        let lines: Vec<_> = text.lines().collect();

        assert!(lines[0].contains("cumulative"));
        // Ex-ante credits bought in the last year are delivered over a further 25 years
        assert_eq!(lines.len(), 1 + 26 + 25);
        assert!(lines[1].trim_start().starts_with("2025"));
        assert!(lines.last().unwrap().trim_start().starts_with("2075"));
        assert!(lines.last().unwrap().ends_with("1000000.00"));
    }

    #[test]
    fn test_write_advice() {
        let text = render(|out| {
            write_mix_advice(
                out,
                &MixAdvice::Change {
                    mix: indexmap! {
                        Typology::NbsRemoval => Dimensionless(0.75),
                        Typology::Dac => Dimensionless(0.25),
                    },
                    cost_delta: Money(1234.5),
                },
            )?;
            write_timeline_advice(out, &TimelineAdvice::NoChange)?;
            write_region_advice(out, RegionAdvice::Reduce(Region::Europe))
        });

        assert_eq!(
            text,
            "Typology mix: this mix would save 1234.50 (medium, financed):\n\
            \x20 nbs_removal         75.0%\n\
            \x20 dac                 25.0%\n\
            Timeline: no change advised.\n\
            Geography: consider buying less in europe.\n"
        );
    }

    #[test]
    fn test_write_selection_none() {
        let text = render(|out| write_selection(out, &Selection::NoneFound));
        assert_eq!(text, "No configuration fits the budget.\n");
    }
}
