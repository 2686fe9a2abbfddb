//! Classified worker log lines
//!
//! The worker owns its log format; the supervisor only attaches a class to
//! each line it reads.

use std::fmt;

/// Content category of an INFO-level line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    AccountUpdate,
    PositionUpdate,
    OrderPlaced,
    OrderCancelled,
    OrderSync,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::AccountUpdate => "ACCOUNT_UPDATE",
            Category::PositionUpdate => "POSITION_UPDATE",
            Category::OrderPlaced => "ORDER_PLACED",
            Category::OrderCancelled => "ORDER_CANCELLED",
            Category::OrderSync => "ORDER_SYNC",
        };
        f.write_str(name)
    }
}

/// Class of a log line. Severity outranks content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineClass {
    Error,
    Warning,
    Content(Category),
    Unclassified,
}

impl LineClass {
    /// Category carried by a content line
    pub fn category(&self) -> Option<Category> {
        match self {
            LineClass::Content(category) => Some(*category),
            _ => None,
        }
    }
}

/// Side of a placed order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// One worker log line with its class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// The raw line, without its trailing newline
    pub line: String,
    /// Class assigned by the marker table
    pub class: LineClass,
}

impl LogEvent {
    /// Create a new event
    pub fn new(line: impl Into<String>, class: LineClass) -> Self {
        Self {
            line: line.into(),
            class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_names() {
        assert_eq!(Category::AccountUpdate.to_string(), "ACCOUNT_UPDATE");
        assert_eq!(Category::OrderSync.to_string(), "ORDER_SYNC");
    }

    #[test]
    fn test_line_class_category() {
        assert_eq!(
            LineClass::Content(Category::OrderPlaced).category(),
            Some(Category::OrderPlaced)
        );
        assert_eq!(LineClass::Error.category(), None);
        assert_eq!(LineClass::Unclassified.category(), None);
    }
}
