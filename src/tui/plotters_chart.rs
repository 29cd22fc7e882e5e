//! Plotters-powered churn histogram widget for Ratatui.
//!
//! Plotters draws the axes and bin rectangles; `plotters-ratatui-backend`
//! renders the result into the Ratatui buffer.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color as TuiColor, Style},
    widgets::Widget,
};

use crate::plot::ChurnHistogram;

/// Render-only description of a histogram split by churn.
///
/// Each bin is drawn as two half-width bars: churn = 0 on the left, churn = 1
/// on the right.
pub struct ChurnHistogramChart<'a> {
    pub hist: &'a ChurnHistogram,
    pub x_label: &'a str,
}

impl ChurnHistogramChart<'_> {
    /// Plot bounds: the bin edges on x, zero to the tallest bin (+10%) on y.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let x0 = *self.hist.edges.first()?;
        let x1 = *self.hist.edges.last()?;
        let y1 = (self.hist.max_count() as f64 * 1.1).max(1.0);
        if !(x0.is_finite() && x1.is_finite()) || x1 <= x0 {
            return None;
        }
        Some(([x0, x1], [0.0, y1]))
    }
}

impl Widget for ChurnHistogramChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters cannot lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(TuiColor::Yellow),
            );
            return;
        }

        let Some(([x0, x1], [y0, y1])) = self.bounds() else {
            return;
        };
        let hist = self.hist;
        let x_label = self.x_label;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(x_label)
                .y_desc("customers")
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.0}"))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            let stayed_color = RGBColor(0, 255, 255);
            let churned_color = RGBColor(255, 80, 80);

            let bars = hist.edges.windows(2).enumerate().flat_map(|(i, w)| {
                let mid = (w[0] + w[1]) / 2.0;
                [
                    Rectangle::new(
                        [(w[0], 0.0), (mid, hist.stayed[i] as f64)],
                        stayed_color.filled(),
                    ),
                    Rectangle::new(
                        [(mid, 0.0), (w[1], hist.churned[i] as f64)],
                        churned_color.filled(),
                    ),
                ]
            });
            chart.draw_series(bars)?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContractType, CustomerRecord, CustomerTable, InternetService};
    use crate::plot::tenure_histogram;

    #[test]
    fn bounds_span_edges_and_tallest_bin() {
        let rows = (1..=4)
            .map(|i| CustomerRecord {
                customer_id: i,
                tenure_months: i * 10,
                contract_type: ContractType::Annual,
                internet_service: InternetService::Dsl,
                monthly_bill: 40.0,
                churn: (i % 2) as u8,
            })
            .collect();
        let hist = tenure_histogram(&CustomerTable::new(rows), 3);
        let chart = ChurnHistogramChart { hist: &hist, x_label: "tenure" };
        let ([x0, x1], [y0, y1]) = chart.bounds().unwrap();
        assert_eq!((x0, x1), (10.0, 40.0));
        assert_eq!(y0, 0.0);
        assert!(y1 >= hist.max_count() as f64);
    }
}
