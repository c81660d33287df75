use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::warn;

use crate::models::StatementCategory;
use crate::pivot::{WideFrame, WideRow};

/// Translation dictionary for one statement category: provider-native item
/// name to storage column name. The financial-statement category shares the
/// income-statement dictionary because both are sourced from the same
/// provider module.
pub fn dictionary_for(category: StatementCategory) -> &'static HashMap<&'static str, &'static str> {
    match category {
        StatementCategory::Financials | StatementCategory::IncomeStatement => {
            income_statement_dictionary()
        }
        StatementCategory::BalanceSheet => balance_sheet_dictionary(),
        StatementCategory::CashFlow => cash_flow_dictionary(),
    }
}

/// Rename a pivoted frame's columns through the category dictionary.
///
/// Column names already in storage form pass through silently, which makes
/// the translation idempotent for local replays. Genuinely unknown provider
/// columns are logged once and kept under their original name.
pub fn translate_frame(frame: WideFrame, category: StatementCategory) -> WideFrame {
    let dictionary = dictionary_for(category);

    for column in &frame.columns {
        let known = dictionary.contains_key(column.as_str())
            || dictionary.values().any(|target| target == column);
        if !known {
            warn!("⚠️ unmapped {} column: {}", category.as_str(), column);
        }
    }

    let rename = |name: &str| -> String {
        dictionary
            .get(name)
            .map(|target| target.to_string())
            .unwrap_or_else(|| name.to_string())
    };

    WideFrame {
        columns: frame.columns.iter().map(|c| rename(c)).collect(),
        rows: frame
            .rows
            .into_iter()
            .map(|row| WideRow {
                code: row.code,
                period: row.period,
                values: row
                    .values
                    .into_iter()
                    .map(|(item, value)| (rename(&item), value))
                    .collect(),
            })
            .collect(),
    }
}

fn income_statement_dictionary() -> &'static HashMap<&'static str, &'static str> {
    static DICTIONARY: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    DICTIONARY.get_or_init(|| {
        HashMap::from([
            ("totalRevenue", "total_revenue"),
            ("costOfRevenue", "cost_of_revenue"),
            ("grossProfit", "gross_profit"),
            ("researchDevelopment", "research_development"),
            ("sellingGeneralAdministrative", "selling_general_administrative"),
            ("nonRecurring", "non_recurring"),
            ("otherOperatingExpenses", "other_operating_expenses"),
            ("totalOperatingExpenses", "total_operating_expenses"),
            ("operatingIncome", "operating_income"),
            ("totalOtherIncomeExpenseNet", "total_other_income_expense_net"),
            ("ebit", "ebit"),
            ("interestExpense", "interest_expense"),
            ("incomeBeforeTax", "income_before_tax"),
            ("incomeTaxExpense", "income_tax_expense"),
            ("minorityInterest", "minority_interest"),
            ("netIncomeFromContinuingOps", "net_income_from_continuing_ops"),
            ("discontinuedOperations", "discontinued_operations"),
            ("extraordinaryItems", "extraordinary_items"),
            ("effectOfAccountingCharges", "effect_of_accounting_charges"),
            ("otherItems", "other_items"),
            ("netIncome", "net_income"),
            ("netIncomeApplicableToCommonShares", "net_income_applicable_to_common_shares"),
        ])
    })
}

fn balance_sheet_dictionary() -> &'static HashMap<&'static str, &'static str> {
    static DICTIONARY: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    DICTIONARY.get_or_init(|| {
        HashMap::from([
            ("cash", "cash"),
            ("shortTermInvestments", "short_term_investments"),
            ("netReceivables", "net_receivables"),
            ("inventory", "inventory"),
            ("otherCurrentAssets", "other_current_assets"),
            ("totalCurrentAssets", "total_current_assets"),
            ("longTermInvestments", "long_term_investments"),
            ("propertyPlantEquipment", "property_plant_equipment"),
            ("goodWill", "goodwill"),
            ("intangibleAssets", "intangible_assets"),
            ("accumulatedAmortization", "accumulated_amortization"),
            ("otherAssets", "other_assets"),
            ("deferredLongTermAssetCharges", "deferred_long_term_asset_charges"),
            ("totalAssets", "total_assets"),
            ("accountsPayable", "accounts_payable"),
            ("shortLongTermDebt", "short_long_term_debt"),
            ("otherCurrentLiab", "other_current_liabilities"),
            ("longTermDebt", "long_term_debt"),
            ("otherLiab", "other_liabilities"),
            ("deferredLongTermLiab", "deferred_long_term_liabilities"),
            ("minorityInterest", "minority_interest"),
            ("totalCurrentLiabilities", "total_current_liabilities"),
            ("totalLiab", "total_liabilities"),
            ("commonStock", "common_stock"),
            ("retainedEarnings", "retained_earnings"),
            ("treasuryStock", "treasury_stock"),
            ("capitalSurplus", "capital_surplus"),
            ("otherStockholderEquity", "other_stockholder_equity"),
            ("totalStockholderEquity", "total_stockholder_equity"),
            ("netTangibleAssets", "net_tangible_assets"),
        ])
    })
}

fn cash_flow_dictionary() -> &'static HashMap<&'static str, &'static str> {
    static DICTIONARY: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    DICTIONARY.get_or_init(|| {
        HashMap::from([
            ("netIncome", "net_income"),
            ("depreciation", "depreciation"),
            ("changeToNetincome", "change_to_net_income"),
            ("changeToAccountReceivables", "change_to_account_receivables"),
            ("changeToLiabilities", "change_to_liabilities"),
            ("changeToInventory", "change_to_inventory"),
            ("changeToOperatingActivities", "change_to_operating_activities"),
            ("totalCashFromOperatingActivities", "total_cash_from_operating_activities"),
            ("capitalExpenditures", "capital_expenditures"),
            ("investments", "investments"),
            ("otherCashflowsFromInvestingActivities", "other_cashflows_from_investing_activities"),
            ("totalCashflowsFromInvestingActivities", "total_cashflows_from_investing_activities"),
            ("dividendsPaid", "dividends_paid"),
            ("netBorrowings", "net_borrowings"),
            ("otherCashflowsFromFinancingActivities", "other_cashflows_from_financing_activities"),
            ("totalCashFromFinancingActivities", "total_cash_from_financing_activities"),
            ("effectOfExchangeRate", "effect_of_exchange_rate"),
            ("changeInCash", "change_in_cash"),
            ("repurchaseOfStock", "repurchase_of_stock"),
            ("issuanceOfStock", "issuance_of_stock"),
        ])
    })
}
