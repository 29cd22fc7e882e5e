//! ASCII plotting for terminal output.
//!
//! Fixed-size text charts, deterministic for a given table:
//! - bars: `#` for churn = 1, `o` for churn = 0
//! - histograms share bins across both churn groups
//! - box summaries are drawn as `|---[==|==]---|` under each histogram

use crate::domain::{Category, CustomerTable};
use crate::plot::{
    bill_histogram, churn_by_contract, churn_split, tenure_histogram, BoxSummary, ChartKind,
    ChurnHistogram, ChurnSplit, DEFAULT_BINS,
};
use crate::report::fmt4;

const STAYED: char = 'o';
const CHURNED: char = '#';

/// Render all four charts, separated by blank lines.
pub fn render_all(table: &CustomerTable, width: usize, height: usize) -> String {
    ChartKind::ALL
        .iter()
        .map(|&kind| render_chart(kind, table, width, height))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_chart(kind: ChartKind, table: &CustomerTable, width: usize, height: usize) -> String {
    match kind {
        ChartKind::ChurnRate => render_churn_rate(&churn_split(table), width),
        ChartKind::ByContract => render_contract_churn(table, width),
        ChartKind::Tenure => {
            render_histogram(kind.title(), &tenure_histogram(table, DEFAULT_BINS), width, height)
        }
        ChartKind::MonthlyBill => {
            render_histogram(kind.title(), &bill_histogram(table, DEFAULT_BINS), width, height)
        }
    }
}

/// Proportion bars for churn = 0 and churn = 1.
pub fn render_churn_rate(split: &ChurnSplit, width: usize) -> String {
    let width = width.max(10);
    let total = split.total();
    let mut out = String::new();
    out.push_str(ChartKind::ChurnRate.title());
    out.push('\n');

    for (label, count, ch) in [("0", split.stayed, STAYED), ("1", split.churned, CHURNED)] {
        let share = if total == 0 { 0.0 } else { count as f64 / total as f64 };
        let len = (share * width as f64).round() as usize;
        out.push_str(&format!(
            "churn={label} |{:<width$}| {count} ({}%)\n",
            ch.to_string().repeat(len),
            fmt4(100.0 * share),
        ));
    }
    out
}

/// Grouped count bars per contract type.
pub fn render_contract_churn(table: &CustomerTable, width: usize) -> String {
    let width = width.max(10);
    let groups = churn_by_contract(table);
    let max = groups
        .iter()
        .flat_map(|(_, s)| [s.stayed, s.churned])
        .max()
        .unwrap_or(0);
    let label_w = groups.iter().map(|(c, _)| c.label().len()).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!(
        "{}  ({STAYED} = churn 0, {CHURNED} = churn 1)\n",
        ChartKind::ByContract.title()
    ));
    for (contract, split) in &groups {
        for (i, (count, ch)) in [(split.stayed, STAYED), (split.churned, CHURNED)]
            .into_iter()
            .enumerate()
        {
            let label = if i == 0 { contract.label() } else { "" };
            let len = scaled(count, max, width);
            out.push_str(&format!(
                "{label:<label_w$} |{:<width$}| {count}\n",
                ch.to_string().repeat(len)
            ));
        }
    }
    out
}

/// Vertical histogram with side-by-side churn columns per bin.
pub fn render_histogram(title: &str, hist: &ChurnHistogram, width: usize, height: usize) -> String {
    let height = height.max(4);
    let bins = hist.bins();
    let col_w = (width / bins.max(1)).max(3);
    let grid_w = col_w * bins;
    let max = hist.max_count();

    let mut grid = vec![vec![' '; grid_w]; height];
    for b in 0..bins {
        let x = b * col_w;
        fill_column(&mut grid, x, scaled(hist.stayed[b], max, height), STAYED);
        fill_column(&mut grid, x + 1, scaled(hist.churned[b], max, height), CHURNED);
    }

    let mut out = String::new();
    out.push_str(&format!("{title}  ({STAYED} = churn 0, {CHURNED} = churn 1)\n"));
    out.push_str(&format!("max bin count: {max}\n"));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out.push_str(&"-".repeat(grid_w));
    out.push('\n');

    let lo = hist.edges.first().copied().unwrap_or(0.0);
    let hi = hist.edges.last().copied().unwrap_or(1.0);
    let lo_label = format!("{lo:.1}");
    let hi_label = format!("{hi:.1}");
    let gap = grid_w.saturating_sub(lo_label.len() + hi_label.len()).max(1);
    out.push_str(&format!("{lo_label}{}{hi_label}\n", " ".repeat(gap)));

    for (label, summary) in [("churn=0", hist.stayed_box), ("churn=1", hist.churned_box)] {
        match summary {
            Some(b) => {
                out.push_str(&format!("{label} {}\n", render_box(&b, lo, hi, grid_w)));
                out.push_str(&format!(
                    "        min={} q1={} median={} q3={} max={}\n",
                    fmt4(b.min),
                    fmt4(b.q1),
                    fmt4(b.median),
                    fmt4(b.q3),
                    fmt4(b.max)
                ));
            }
            None => out.push_str(&format!("{label} (no rows)\n")),
        }
    }
    out
}

/// One-line box plot of `b` on the axis `[lo, hi]`.
pub fn render_box(b: &BoxSummary, lo: f64, hi: f64, width: usize) -> String {
    let width = width.max(5);
    let mut line = vec![' '; width];
    let x = |v: f64| map_x(v, lo, hi, width);

    let (x_min, x_q1, x_med, x_q3, x_max) = (x(b.min), x(b.q1), x(b.median), x(b.q3), x(b.max));
    for c in &mut line[x_min..=x_max] {
        *c = '-';
    }
    for c in &mut line[x_q1..=x_q3] {
        *c = '=';
    }
    line[x_min] = '|';
    line[x_max] = '|';
    line[x_q1] = '[';
    line[x_q3] = ']';
    line[x_med] = '|';
    line.into_iter().collect::<String>().trim_end().to_string()
}

fn fill_column(grid: &mut [Vec<char>], x: usize, bar: usize, ch: char) {
    let height = grid.len();
    for row in grid.iter_mut().skip(height - bar.min(height)) {
        row[x] = ch;
    }
}

/// `count / max` scaled to `len` cells; any non-zero count gets at least one.
fn scaled(count: usize, max: usize, len: usize) -> usize {
    if max == 0 || count == 0 {
        return 0;
    }
    ((count as f64 / max as f64) * len as f64).round().max(1.0) as usize
}

fn map_x(v: f64, lo: f64, hi: f64, width: usize) -> usize {
    let width = width.max(2);
    if hi <= lo {
        return 0;
    }
    let u = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_seeded;
    use crate::domain::{ContractType, CustomerRecord, GeneratorConfig, InternetService};

    #[test]
    fn churn_rate_golden_snapshot() {
        let txt = render_churn_rate(&ChurnSplit { stayed: 3, churned: 1 }, 10);
        let expected = concat!(
            "Overall churn rate\n",
            "churn=0 |oooooooo  | 3 (75.0000%)\n",
            "churn=1 |###       | 1 (25.0000%)\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn box_line_marks_quartiles() {
        let b = BoxSummary { min: 0.0, q1: 2.0, median: 5.0, q3: 8.0, max: 10.0 };
        assert_eq!(render_box(&b, 0.0, 10.0, 11), "|-[==|==]-|");
    }

    #[test]
    fn contract_chart_lists_every_contract() {
        let table = CustomerTable::new(vec![CustomerRecord {
            customer_id: 1,
            tenure_months: 1,
            contract_type: ContractType::TwoYear,
            internet_service: InternetService::NoService,
            monthly_bill: 20.0,
            churn: 0,
        }]);
        let txt = render_contract_churn(&table, 10);
        for c in ContractType::ALL {
            assert!(txt.contains(c.label()));
        }
    }

    #[test]
    fn render_all_is_deterministic_and_titled() {
        let table = generate_seeded(&GeneratorConfig {
            num_customers: 300,
            ..GeneratorConfig::default()
        })
        .unwrap();
        let a = render_all(&table, 48, 8);
        assert_eq!(a, render_all(&table, 48, 8));
        for kind in ChartKind::ALL {
            assert!(a.contains(kind.title()));
        }
        assert!(a.contains("median="));
    }
}
