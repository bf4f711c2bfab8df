/// Source of the wall-clock time overlaid on each frame.
pub trait Clock: Send {
    /// Current local time formatted `HH:MM:SS`.
    fn timestamp(&self) -> String;
}

/// Reads the local system time via `chrono`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }
}

/// Always reports the same time. Used for reproducible annotation.
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_format() {
        let ts = SystemClock.timestamp();
        assert_eq!(ts.len(), 8);
        let parts: Vec<&str> = ts.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() == 2 && p.parse::<u32>().is_ok()));
    }

    #[test]
    fn test_fixed_clock_repeats() {
        let clock = FixedClock("12:34:56".to_string());
        assert_eq!(clock.timestamp(), "12:34:56");
        assert_eq!(clock.timestamp(), "12:34:56");
    }
}
