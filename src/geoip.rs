//! GeoIP annotation
//!
//! Pure lookup of a destination IP against a static map, for reporting.
//! Unmapped indicators fall back to "Unknown". No network calls.

use std::collections::HashMap;

pub const UNKNOWN_COUNTRY: &str = "Unknown";

pub struct GeoIpMap {
    map: HashMap<String, String>,
}

impl GeoIpMap {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    /// Coarse country code for an IP, "Unknown" when unmapped
    pub fn country(&self, ip: &str) -> String {
        self.map
            .get(ip)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn mapped_and_unmapped_lookups() {
        let geoip = GeoIpMap::new(Config::default().geoip);
        assert_eq!(geoip.country("8.8.8.8"), "US");
        assert_eq!(geoip.country("1.1.1.1"), "AU");
        assert_eq!(geoip.country("198.51.100.7"), UNKNOWN_COUNTRY);
    }
}
