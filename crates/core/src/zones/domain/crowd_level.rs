use std::fmt;

/// How full a zone is relative to its capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CrowdLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl CrowdLevel {
    /// Below 30% is low, below 60% medium, below 85% high, anything else
    /// (including over capacity) critical.
    pub fn from_percentage(percent: f64) -> Self {
        if percent < 30.0 {
            Self::Low
        } else if percent < 60.0 {
            Self::Medium
        } else if percent < 85.0 {
            Self::High
        } else {
            Self::Critical
        }
    }

    pub fn classify(count: usize, capacity: u32) -> Self {
        Self::from_percentage(occupancy_percentage(count, capacity))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for CrowdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `count` as a percentage of `capacity`, unrounded. Can exceed 100.
pub fn occupancy_percentage(count: usize, capacity: u32) -> f64 {
    count as f64 / f64::from(capacity) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::empty(0.0, CrowdLevel::Low)]
    #[case::just_below_medium(29.9, CrowdLevel::Low)]
    #[case::medium_boundary(30.0, CrowdLevel::Medium)]
    #[case::just_below_high(59.9, CrowdLevel::Medium)]
    #[case::high_boundary(60.0, CrowdLevel::High)]
    #[case::just_below_critical(84.9, CrowdLevel::High)]
    #[case::critical_boundary(85.0, CrowdLevel::Critical)]
    #[case::full(100.0, CrowdLevel::Critical)]
    #[case::over_capacity(150.0, CrowdLevel::Critical)]
    fn test_thresholds(#[case] percent: f64, #[case] expected: CrowdLevel) {
        assert_eq!(CrowdLevel::from_percentage(percent), expected);
    }

    #[rstest]
    #[case::two_of_ten(2, 10, CrowdLevel::Low)]
    #[case::three_of_ten(3, 10, CrowdLevel::Medium)]
    #[case::half(10, 20, CrowdLevel::Medium)]
    #[case::seven_of_ten(7, 10, CrowdLevel::High)]
    #[case::nine_of_ten(9, 10, CrowdLevel::Critical)]
    #[case::crowded(12, 10, CrowdLevel::Critical)]
    fn test_classify_counts(#[case] count: usize, #[case] capacity: u32, #[case] expected: CrowdLevel) {
        assert_eq!(CrowdLevel::classify(count, capacity), expected);
    }

    #[test]
    fn test_occupancy_percentage() {
        assert_relative_eq!(occupancy_percentage(5, 20), 25.0);
        assert_relative_eq!(occupancy_percentage(30, 20), 150.0);
        assert_relative_eq!(occupancy_percentage(0, 8), 0.0);
    }

    #[test]
    fn test_display_is_upper_case() {
        assert_eq!(CrowdLevel::Critical.to_string(), "CRITICAL");
        assert_eq!(CrowdLevel::Low.to_string(), "LOW");
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(CrowdLevel::Low < CrowdLevel::Medium);
        assert!(CrowdLevel::High < CrowdLevel::Critical);
    }
}
