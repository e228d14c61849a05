//! Integration tests for planning runs against the flat-market data set.
//!
//! Every typology costs 9/10/11 per unit (low/medium/high) in every year and region.
use float_cmp::assert_approx_eq;
use offset_planner::financing::{Financing, adjusted_cost};
use offset_planner::input::load_model;
use offset_planner::input::plan::{PLAN_FILE_NAME, Plan};
use offset_planner::model::Model;
use offset_planner::planning::schedule::TimeConstraint;
use offset_planner::planning::{
    BudgetRequest, Selection, run_budget_schedule, run_config_selection,
};
use offset_planner::summary::BudgetSummary;
use offset_planner::units::{Dimensionless, Money, Quantity};
use std::path::PathBuf;

fn get_data_dir() -> PathBuf {
    PathBuf::from("tests/data/flat")
}

fn load_flat() -> (Model, Plan) {
    let model = load_model(get_data_dir()).unwrap();
    let plan = Plan::from_path(&get_data_dir().join(PLAN_FILE_NAME)).unwrap();
    (model, plan)
}

#[test]
fn test_yearly_single_typology() {
    let (model, plan) = load_flat();
    let output = run_budget_schedule(&model, &plan.request());

    assert!(output.is_filled());
    assert_eq!(output.strategies.len(), 26);
    assert_approx_eq!(
        Money,
        output.adjusted_medium_cost(),
        Money(1e7),
        epsilon = 1e-6
    );

    let per_year = 1e6 / 26.0;
    let (last, rest) = output.strategies.split_last().unwrap();
    for strategy in rest {
        assert!((strategy.quantity_purchased.value() - per_year).abs() < 1.0);
    }
    assert_eq!(last.year, 2050);
    assert!(last.quantity_purchased.value() <= per_year + 1.0);

    let total: Quantity = output.strategies.iter().map(|s| s.quantity_purchased).sum();
    assert_approx_eq!(Quantity, total, Quantity(1e6), epsilon = 1e-6);
}

#[test]
fn test_breakdown_conserves_quantity() {
    let (model, plan) = load_flat();
    let request = BudgetRequest {
        financing: Financing {
            ex_ante: Dimensionless(0.3),
            ex_post: Dimensionless(0.7),
        },
        ..plan.request()
    };
    let output = run_budget_schedule(&model, &request);

    for strategy in &output.strategies {
        assert_approx_eq!(
            Quantity,
            strategy.breakdown_quantity(),
            strategy.quantity_purchased,
            epsilon = 1e-6
        );
    }

    let summary = BudgetSummary::new(&output, &model.horizon());
    let typology_total: Money = summary.cost_per_typology.values().map(|c| c.medium).sum();
    let region_total: Money = summary.cost_per_region.values().map(|c| c.medium).sum();
    assert_approx_eq!(
        Money,
        typology_total,
        output.adjusted_medium_cost(),
        epsilon = 1e-6
    );
    assert_approx_eq!(
        Money,
        region_total,
        output.adjusted_medium_cost(),
        epsilon = 1e-6
    );
}

#[test]
fn test_flexible_is_deterministic() {
    let (model, plan) = load_flat();
    let request = plan.request().with_time_constraint(TimeConstraint::Flexible);

    let first = run_budget_schedule(&model, &request);
    let second = run_budget_schedule(&model, &request);
    assert!(first.is_filled());
    assert_eq!(first, second);
}

#[test]
fn test_spot_financing_is_identity() {
    let (model, _) = load_flat();
    let cost = Money(1234.5);
    assert_eq!(
        adjusted_cost(
            cost,
            &Financing::default(),
            model.parameters.ex_ante_discount_factor
        ),
        cost
    );
}

/// A budget equal to the first candidate's adjusted cost selects it, with nothing left over
#[test]
fn test_selection_budget_boundary() {
    let (model, plan) = load_flat();
    let request = plan.selection_request().unwrap();
    assert_eq!(request.budget, Money(1e7));

    let Selection::Found {
        priority,
        money_saving,
        money_to_add,
        ..
    } = run_config_selection(&model, &request)
    else {
        panic!("No configuration selected");
    };
    assert_eq!(priority, 0);
    assert_approx_eq!(Money, money_saving, Money(0.0), epsilon = 1e-6);
    assert_approx_eq!(Money, money_to_add, Money(0.0), epsilon = 1e-6);
}
