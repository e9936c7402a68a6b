use std::cmp::Ordering;

/// Sort direction.
///
/// Records are always compared as plain byte strings, [Order] only decides whether the smaller or
/// the greater line comes first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Order {
    /// Ascending, the default
    #[default]
    Asc,
    /// Descending, used for "most recent first" output
    Desc,
}

impl Order {
    /// Create an [Order] from the `reverse` flag used by [crate::sort::disk_sort]
    pub fn from_reverse(reverse: bool) -> Order {
        if reverse {
            Order::Desc
        } else {
            Order::Asc
        }
    }

    pub(crate) fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Order::Asc => a.cmp(b),
            Order::Desc => b.cmp(a),
        }
    }

    /// True when `a` must be emitted before `b`. Equal lines are never "before" each other.
    pub(crate) fn precedes(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

#[cfg(test)]
mod tests {
    use crate::order::Order;

    #[test]
    fn test_precedes() {
        assert!(Order::Asc.precedes("A@H", "B@H"));
        assert!(!Order::Asc.precedes("B@H", "A@H"));
        assert!(Order::Desc.precedes("B@H", "A@H"));
        assert!(!Order::Asc.precedes("A@H", "A@H"));
        assert!(!Order::Desc.precedes("A@H", "A@H"));
    }

    #[test]
    fn test_from_reverse() {
        assert_eq!(Order::from_reverse(false), Order::Asc);
        assert_eq!(Order::from_reverse(true), Order::Desc);
        assert_eq!(Order::default(), Order::Asc);
    }
}
