//! Two-slice probability pie chart rendered as inline SVG

use crate::models::Outcome;
use std::f64::consts::PI;
use std::fmt::Write;

pub const NO_DIABETES_COLOR: &str = "#32CD32";
pub const DIABETES_COLOR: &str = "#FF4C4C";

/// Angle of the first slice's leading edge, in degrees
const START_ANGLE_DEG: f64 = 90.0;

/// Slices smaller than this are not drawn
const MIN_FRACTION: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: &'static str,
    pub color: &'static str,
    pub fraction: f64,
}

impl PieSlice {
    /// Percentage label with one decimal, e.g. `87.5%`
    pub fn autopct(&self) -> String {
        format!("{:.1}%", self.fraction * 100.0)
    }
}

/// Pie chart over the full class probability vector
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub slices: [PieSlice; 2],
}

impl PieChart {
    pub fn from_probabilities(probabilities: [f64; 2]) -> Self {
        Self {
            slices: [
                PieSlice {
                    label: Outcome::NoDiabetes.as_str(),
                    color: NO_DIABETES_COLOR,
                    fraction: probabilities[0],
                },
                PieSlice {
                    label: Outcome::Diabetes.as_str(),
                    color: DIABETES_COLOR,
                    fraction: probabilities[1],
                },
            ],
        }
    }

    /// Render the chart as a standalone `<svg>` element of `size` pixels
    ///
    /// Slices run counter-clockwise from twelve o'clock, class 0 first.
    pub fn to_svg(&self, size: u32) -> String {
        let radius = 1.0;
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="-1.6 -1.6 3.2 3.2" role="img" aria-label="Prediction probabilities">"#
        );

        let mut angle = START_ANGLE_DEG.to_radians();
        for slice in self.slices.iter() {
            if slice.fraction < MIN_FRACTION {
                continue;
            }
            let sweep = slice.fraction * 2.0 * PI;
            let end = angle + sweep;

            if slice.fraction >= 1.0 - MIN_FRACTION {
                let _ = write!(
                    svg,
                    r#"<circle cx="0" cy="0" r="{radius}" fill="{}"/>"#,
                    slice.color
                );
            } else {
                let (x0, y0) = point(radius, angle);
                let (x1, y1) = point(radius, end);
                let large_arc = if sweep > PI { 1 } else { 0 };
                let _ = write!(
                    svg,
                    r#"<path d="M0,0 L{x0:.4},{y0:.4} A{radius},{radius} 0 {large_arc} 0 {x1:.4},{y1:.4} Z" fill="{}"/>"#,
                    slice.color
                );
            }

            let middle = angle + sweep / 2.0;
            let (px, py) = point(0.6, middle);
            let (lx, ly) = point(1.2, middle);
            let _ = write!(
                svg,
                r#"<text x="{px:.4}" y="{py:.4}" font-size="0.18" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
                slice.autopct()
            );
            let _ = write!(
                svg,
                r#"<text x="{lx:.4}" y="{ly:.4}" font-size="0.18" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
                slice.label
            );

            angle = end;
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Point on a circle in SVG coordinates (y grows downward)
fn point(radius: f64, angle: f64) -> (f64, f64) {
    (radius * angle.cos(), -radius * angle.sin())
}
