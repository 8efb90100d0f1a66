use calma_types::{AppState, FixedExpense};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fixed expenses still pending this cycle: no expense transaction with a
/// matching name exists yet.
pub fn pending_fixed_expenses(state: &AppState) -> Vec<&FixedExpense> {
    state
        .fixed_expenses
        .iter()
        .filter(|fe| {
            !state
                .transactions
                .iter()
                .any(|t| t.name == fe.name && t.is_expense())
        })
        .collect()
}

pub fn pending_total(state: &AppState) -> f64 {
    pending_fixed_expenses(state).iter().map(|fe| fe.amount).sum()
}

/// What is actually left to spend: income minus spend minus the fixed
/// expenses not yet paid this cycle.
pub fn remaining_balance(state: &AppState) -> f64 {
    state.total_income - state.total_spent - pending_total(state)
}

/// One slice of the spending-by-category donut
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub amount: f64,
    pub percentage: f64,
}

/// Expense totals grouped by entry name, largest first.
pub fn category_breakdown(state: &AppState) -> Vec<CategorySlice> {
    let mut by_name: BTreeMap<&str, f64> = BTreeMap::new();
    for transaction in state.transactions.iter().filter(|t| t.is_expense()) {
        *by_name.entry(transaction.name.as_str()).or_insert(0.0) += transaction.amount;
    }

    let total: f64 = by_name.values().sum();

    let mut slices: Vec<CategorySlice> = by_name
        .into_iter()
        .map(|(name, amount)| CategorySlice {
            name: name.to_string(),
            amount,
            percentage: if total > 0.0 { amount / total * 100.0 } else { 0.0 },
        })
        .collect();

    // Descending by amount; name breaks ties so the order is stable
    slices.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    slices
}

/// Cumulative balance per entry, oldest first: income adds, expense
/// subtracts. Feeds the trend line.
pub fn balance_trend(state: &AppState) -> Vec<f64> {
    let mut balance = 0.0;
    state
        .transactions
        .iter()
        .rev()
        .map(|t| {
            balance += if t.is_income() { t.amount } else { -t.amount };
            balance
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavingsProjection {
    /// Fewer than three entries, or no expenses to extrapolate from.
    NotEnoughData,
    GoalReached,
    DaysToGoal(i64),
}

/// Rough days-to-goal estimate: average daily spend over the recorded
/// window, assuming 20% of it can be set aside instead.
pub fn savings_projection(state: &AppState) -> SavingsProjection {
    if state.transactions.len() < 3 {
        return SavingsProjection::NotEnoughData;
    }

    let spent: f64 = state
        .transactions
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.amount)
        .sum();
    if spent <= 0.0 {
        return SavingsProjection::NotEnoughData;
    }

    let remaining = state.colchon.goal - state.colchon.current;
    if remaining <= 0.0 {
        return SavingsProjection::GoalReached;
    }

    let avg_daily = spent / f64::max(state.transactions.len() as f64 / 2.0, 1.0);
    let days = (remaining / (avg_daily * 0.2)).ceil() as i64;
    SavingsProjection::DaysToGoal(days)
}

/// Serialize the canonical state verbatim for the export collaborator.
pub fn export_state(state: &AppState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}
