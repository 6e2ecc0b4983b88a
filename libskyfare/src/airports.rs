//! Airports offered in the search form

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Airport {
    pub code: &'static str,
    pub name: &'static str,
    pub city: Option<&'static str>,
    pub country: Option<&'static str>,
}

const fn airport(code: &'static str, name: &'static str, country: &'static str) -> Airport {
    Airport {
        code,
        name,
        city: None,
        country: Some(country),
    }
}

pub static AIRPORTS: &[Airport] = &[
    // Mexico
    airport("MEX", "Ciudad de México", "MX"),
    airport("MTY", "Monterrey", "MX"),
    airport("GDL", "Guadalajara", "MX"),
    airport("CUN", "Cancún", "MX"),
    airport("TIJ", "Tijuana", "MX"),
    // Europe
    airport("VIE", "Viena", "AT"),
    airport("MAD", "Madrid", "ES"),
    airport("BCN", "Barcelona", "ES"),
    airport("LHR", "Londres", "GB"),
    airport("CDG", "París CDG", "FR"),
    airport("FCO", "Roma", "IT"),
    airport("AMS", "Ámsterdam", "NL"),
    airport("FRA", "Frankfurt", "DE"),
    // USA
    airport("JFK", "New York JFK", "US"),
    airport("LAX", "Los Angeles", "US"),
    airport("MIA", "Miami", "US"),
    airport("DFW", "Dallas", "US"),
];

/// Look up an airport by IATA code, ignoring case
pub fn find(code: &str) -> Option<&'static Airport> {
    AIRPORTS.iter().find(|a| a.code.eq_ignore_ascii_case(code.trim()))
}

/// `"MEX (Ciudad de México)"`, or the bare code if unknown
pub fn label(code: &str) -> String {
    match find(code) {
        Some(a) => format!("{} ({})", a.code, a.name),
        None => code.to_uppercase(),
    }
}
