//! Zodiac signs and astrology systems.
//!
//! `sign_for_date` is the quick tropical sanity check shown before a chart is generated.
//! It always uses tropical boundaries, even when the user asked for a sidereal chart;
//! the two can legitimately disagree.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

pub const ALL_SIGNS: [ZodiacSign; 12] = [
    ZodiacSign::Aries,
    ZodiacSign::Taurus,
    ZodiacSign::Gemini,
    ZodiacSign::Cancer,
    ZodiacSign::Leo,
    ZodiacSign::Virgo,
    ZodiacSign::Libra,
    ZodiacSign::Scorpio,
    ZodiacSign::Sagittarius,
    ZodiacSign::Capricorn,
    ZodiacSign::Aquarius,
    ZodiacSign::Pisces,
];

impl ZodiacSign {
    pub fn name(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }

    /// Tropical date range, inclusive on both ends.
    pub fn date_range(self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Mar 21 - Apr 19",
            ZodiacSign::Taurus => "Apr 20 - May 20",
            ZodiacSign::Gemini => "May 21 - Jun 20",
            ZodiacSign::Cancer => "Jun 21 - Jul 22",
            ZodiacSign::Leo => "Jul 23 - Aug 22",
            ZodiacSign::Virgo => "Aug 23 - Sep 22",
            ZodiacSign::Libra => "Sep 23 - Oct 22",
            ZodiacSign::Scorpio => "Oct 23 - Nov 21",
            ZodiacSign::Sagittarius => "Nov 22 - Dec 21",
            ZodiacSign::Capricorn => "Dec 22 - Jan 19",
            ZodiacSign::Aquarius => "Jan 20 - Feb 18",
            ZodiacSign::Pisces => "Feb 19 - Mar 20",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a zodiac sign")]
pub struct UnknownSign(pub String);

impl FromStr for ZodiacSign {
    type Err = UnknownSign;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_SIGNS
            .iter()
            .copied()
            .find(|sign| sign.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownSign(wanted.to_string()))
    }
}

/// Returns the tropical sun sign for a calendar date.
pub fn sign_for_date(date: NaiveDate) -> ZodiacSign {
    match (date.month(), date.day()) {
        (3, 21..) | (4, ..=19) => ZodiacSign::Aries,
        (4, _) | (5, ..=20) => ZodiacSign::Taurus,
        (5, _) | (6, ..=20) => ZodiacSign::Gemini,
        (6, _) | (7, ..=22) => ZodiacSign::Cancer,
        (7, _) | (8, ..=22) => ZodiacSign::Leo,
        (8, _) | (9, ..=22) => ZodiacSign::Virgo,
        (9, _) | (10, ..=22) => ZodiacSign::Libra,
        (10, _) | (11, ..=21) => ZodiacSign::Scorpio,
        (11, _) | (12, ..=21) => ZodiacSign::Sagittarius,
        (12, _) | (1, ..=19) => ZodiacSign::Capricorn,
        (1, _) | (2, ..=18) => ZodiacSign::Aquarius,
        _ => ZodiacSign::Pisces,
    }
}

/// The convention a full chart is interpreted under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AstrologySystem {
    #[serde(rename = "Western (Tropical)", alias = "western", alias = "tropical")]
    WesternTropical,
    #[default]
    #[serde(rename = "Vedic (Sidereal)", alias = "vedic", alias = "sidereal")]
    VedicSidereal,
}

impl AstrologySystem {
    pub fn label(self) -> &'static str {
        match self {
            AstrologySystem::WesternTropical => "Western (Tropical)",
            AstrologySystem::VedicSidereal => "Vedic (Sidereal)",
        }
    }
}
