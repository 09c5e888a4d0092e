// ==========================================
// 报关单生成系统 - 金额派生服务实现
// ==========================================
// 职责: 总货值 / 总净重 / 运费 / 保费 派生
// 口径: 各汇总值四舍五入到 2 位小数；空白不计入
// ==========================================

use crate::domain::{AggregateTotals, DeclarationField, OutputRecord, RateTable};
use crate::importer::data_cleaner::round2;
use crate::importer::importer_trait::DerivationService;
use tracing::info;

pub struct FinancialDeriver;

impl DerivationService for FinancialDeriver {
    fn derive_totals(&self, records: &[OutputRecord], rates: &RateTable) -> AggregateTotals {
        let total_amount = round2(sum_field(records, DeclarationField::Amount));
        let total_net_weight = round2(sum_field(records, DeclarationField::NetWeight));

        let freight = self.derive_freight(total_net_weight, rates);
        let insurance = self.derive_insurance(total_amount, rates);

        info!(
            total_amount,
            total_net_weight, freight, insurance, "金额派生完成"
        );

        AggregateTotals {
            total_amount,
            total_net_weight,
            freight,
            insurance,
        }
    }
}

impl FinancialDeriver {
    /// 运费 = round(总净重 × 运费费率, 2)
    pub fn derive_freight(&self, total_net_weight: f64, rates: &RateTable) -> f64 {
        round2(total_net_weight * rates.shipping_rate)
    }

    /// 保费 = round(总货值 × 加价倍数 × 系数1 × 系数2 ÷ 汇率, 2)
    ///
    /// 汇率非正时返回 0（加载政策文件时已拒绝此类输入）
    pub fn derive_insurance(&self, total_amount: f64, rates: &RateTable) -> f64 {
        if rates.exchange_rate <= 0.0 {
            return 0.0;
        }
        round2(
            total_amount
                * rates.markup
                * rates.insurance_coefficient_1
                * rates.insurance_coefficient_2
                / rates.exchange_rate,
        )
    }
}

fn sum_field(records: &[OutputRecord], field: DeclarationField) -> f64 {
    records
        .iter()
        .filter_map(|r| r.get(field).as_f64())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CellValue;

    fn record(amount: CellValue, net_weight: CellValue) -> OutputRecord {
        let mut r = OutputRecord::new(0);
        r.set(DeclarationField::Amount, amount);
        r.set(DeclarationField::NetWeight, net_weight);
        r
    }

    #[test]
    fn test_derive_totals_formulas() {
        let rates = RateTable::default();
        let records = vec![
            record(CellValue::Float(50.0), CellValue::Float(2.0)),
            record(CellValue::Float(1234.567), CellValue::Float(10.004)),
            record(CellValue::Empty, CellValue::Empty),
        ];
        let totals = FinancialDeriver.derive_totals(&records, &rates);

        assert_eq!(totals.total_amount, 1284.57);
        assert_eq!(totals.total_net_weight, 12.0);
        assert_eq!(totals.freight, round2(12.0 * rates.shipping_rate));
        assert_eq!(
            totals.insurance,
            round2(1284.57 * 1.05 * 1.10 * 0.0005 / rates.exchange_rate)
        );
    }

    #[test]
    fn test_zero_totals_yield_zero() {
        let totals = FinancialDeriver.derive_totals(&[], &RateTable::default());
        assert_eq!(totals, AggregateTotals::default());
    }

    #[test]
    fn test_policy_rates_override_defaults() {
        let rates = RateTable {
            shipping_rate: 2.0,
            exchange_rate: 0.5,
            markup: 1.0,
            insurance_coefficient_1: 1.0,
            insurance_coefficient_2: 0.01,
            insurance_base_amount: 0.0,
        };
        let records = vec![record(CellValue::Int(1000), CellValue::Float(3.5))];
        let totals = FinancialDeriver.derive_totals(&records, &rates);
        assert_eq!(totals.freight, 7.0);
        assert_eq!(totals.insurance, 20.0);
    }
}
