//! Marker-table line classification
//!
//! Matching is plain substring search, first match wins. Severity markers
//! always rank ahead of content markers regardless of table order.

use crate::domain::{Category, LineClass, OrderSide};

/// Marker emitted by the worker when an order is accepted
pub const ORDER_PLACED_MARKER: &str = "下单成功";

/// Markers of the worker's log format, in priority order
pub const DEFAULT_MARKERS: &[(&str, LineClass)] = &[
    (" - ERROR - ", LineClass::Error),
    (" - WARNING - ", LineClass::Warning),
    ("账户数据更新", LineClass::Content(Category::AccountUpdate)),
    ("持仓数据更新", LineClass::Content(Category::PositionUpdate)),
    (ORDER_PLACED_MARKER, LineClass::Content(Category::OrderPlaced)),
    ("撤销挂单成功", LineClass::Content(Category::OrderCancelled)),
    ("撤销订单成功", LineClass::Content(Category::OrderCancelled)),
    ("同步 orders", LineClass::Content(Category::OrderSync)),
];

fn rank(class: &LineClass) -> u8 {
    match class {
        LineClass::Error => 0,
        LineClass::Warning => 1,
        LineClass::Content(_) => 2,
        LineClass::Unclassified => 3,
    }
}

/// Ordered `(marker, class)` table
#[derive(Debug, Clone)]
pub struct Classifier {
    markers: Vec<(String, LineClass)>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS.iter().map(|(m, c)| (m.to_string(), *c)))
    }
}

impl Classifier {
    /// Build a table. Entries keep their relative order within a severity rank.
    pub fn new(markers: impl IntoIterator<Item = (String, LineClass)>) -> Self {
        let mut markers: Vec<_> = markers.into_iter().filter(|(m, _)| !m.is_empty()).collect();
        markers.sort_by_key(|(_, class)| rank(class));
        Self { markers }
    }

    /// Class of one line
    pub fn classify(&self, line: &str) -> LineClass {
        self.markers
            .iter()
            .find(|(marker, _)| line.contains(marker.as_str()))
            .map(|(_, class)| *class)
            .unwrap_or(LineClass::Unclassified)
    }
}

/// Side of a placed-order line: the first word after the marker.
///
/// `... - INFO - 下单成功: buy 0.01 @ 2500.5, 订单ID: x` → `Buy`
pub fn order_side(line: &str) -> Option<OrderSide> {
    let (_, rest) = line.split_once(ORDER_PLACED_MARKER)?;
    let word = rest
        .trim_start_matches([':', '：', ' '])
        .split_whitespace()
        .next()?;
    match word.to_ascii_lowercase().as_str() {
        "buy" => Some(OrderSide::Buy),
        "sell" => Some(OrderSide::Sell),
        _ => None,
    }
}
