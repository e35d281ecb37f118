//! Solar-position model.
//!
//! Converts wall-clock time and geographic coordinates into a normalized
//! sun-position scalar in `[-100, 100]`: 100 at solar noon, -100 at solar
//! midnight, 0 at sunrise and sunset, positive during the day, negative at
//! night.
//!
//! The curve is built from two parabolic arcs fitted through the day's anchor
//! instants. The day arc has its vertex at `(solar noon, 100)` with a zero at
//! sunrise or sunset (whichever side of noon the query falls on); the night
//! arc has its vertex at `(solar midnight, -100)` with a zero at the adjacent
//! sunset or sunrise. The result is a smooth, symmetric ease-in/ease-out
//! curve with zero crossings exactly at the horizon events.
//!
//! Anchor instants come from the `sunrise` crate for the local calendar date.
//! Solar noon is the midpoint of sunrise and sunset, and solar midnight sits
//! twelve hours before solar noon, so the day's trough falls in that day's
//! early morning. Queries before sunrise or after sunset substitute the
//! adjacent day's events so the active arc always spans the query instant.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Days, Local, NaiveDate};
use sunrise::{Coordinates, SolarDay, SolarEvent};

/// The four anchor instants framing a sun-position query, in epoch seconds.
///
/// After [`SolarAnchors::resolve`], `sunset` may belong to the previous
/// calendar day and `sunrise`/`solar_midnight` to the next one, so that the
/// query instant always lies inside either the `[sunrise, sunset]` day window
/// or the `[sunset, sunrise]` night window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarAnchors {
    pub sunrise: f64,
    pub sunset: f64,
    pub solar_noon: f64,
    pub solar_midnight: f64,
}

impl SolarAnchors {
    /// Compute the anchors for a single calendar date, no substitution.
    pub fn for_date(date: NaiveDate, latitude: f64, longitude: f64) -> Result<Self> {
        let coord = Coordinates::new(latitude, longitude)
            .ok_or_else(|| anyhow!("invalid coordinates: {latitude:.4}, {longitude:.4}"))?;
        let solar_day = SolarDay::new(coord, date);
        let sunrise = solar_day.event_time(SolarEvent::Sunrise).timestamp() as f64;
        let sunset = solar_day.event_time(SolarEvent::Sunset).timestamp() as f64;

        if sunrise >= sunset {
            return Err(anyhow!(
                "no usable sunrise/sunset on {date} at {latitude:.4}, {longitude:.4} (polar day or night)"
            ));
        }

        let solar_noon = (sunrise + sunset) / 2.0;
        Ok(Self {
            sunrise,
            sunset,
            solar_noon,
            solar_midnight: solar_noon - 43_200.0,
        })
    }

    /// Resolve the anchors framing `now`.
    ///
    /// Starts from today's events for the local calendar date. If `now`
    /// precedes sunrise the relevant sunset (and possibly solar midnight)
    /// belongs to yesterday; if `now` follows sunset the relevant sunrise
    /// (and possibly solar midnight) belongs to tomorrow. The adjacent day's
    /// events are substituted whenever they restore a physically consistent
    /// ordering around the query instant.
    pub fn resolve(now: DateTime<Local>, latitude: f64, longitude: f64) -> Result<Self> {
        let today = now.date_naive();
        let mut anchors = Self::for_date(today, latitude, longitude)?;
        let now_secs = now.timestamp() as f64;

        if now_secs < anchors.sunrise {
            // Before sunrise, after midnight: sunset happened yesterday
            let yesterday_date = today
                .checked_sub_days(Days::new(1))
                .context("date underflow computing yesterday")?;
            let yesterday = Self::for_date(yesterday_date, latitude, longitude)?;

            if anchors.solar_midnight > anchors.sunset
                && yesterday.solar_midnight > yesterday.sunset
            {
                anchors.solar_midnight = yesterday.solar_midnight;
            }
            anchors.sunset = yesterday.sunset;
        } else if now_secs > anchors.sunset {
            // After sunset, before midnight: sunrise happens tomorrow
            let tomorrow_date = today
                .checked_add_days(Days::new(1))
                .context("date overflow computing tomorrow")?;
            let tomorrow = Self::for_date(tomorrow_date, latitude, longitude)?;

            if anchors.solar_midnight < anchors.sunrise
                && tomorrow.solar_midnight < tomorrow.sunrise
            {
                anchors.solar_midnight = tomorrow.solar_midnight;
            }
            anchors.sunrise = tomorrow.sunrise;
        }

        Ok(anchors)
    }
}

/// Evaluate the sun-position curve at `now_secs` against resolved anchors.
///
/// When `now_secs` coincides exactly with an anchor instant neither window
/// test matches and the initialized day-arc parameters apply (vertex at solar
/// noon, foot at sunrise). That fall-through is load-bearing: it yields
/// exactly 0 at both sunrise and sunset, since solar noon bisects them.
pub fn position_from_anchors(now_secs: f64, anchors: &SolarAnchors) -> f64 {
    // Day arc defaults, also the tie-break for boundary instants
    let mut vertex_time = anchors.solar_noon;
    let mut vertex_value = 100.0;
    let mut foot = anchors.sunrise;

    if now_secs > anchors.sunrise && now_secs < anchors.sunset {
        vertex_time = anchors.solar_noon;
        vertex_value = 100.0;
        foot = if now_secs < anchors.solar_noon {
            anchors.sunrise
        } else {
            anchors.sunset
        };
    } else if now_secs > anchors.sunset && now_secs < anchors.sunrise {
        vertex_time = anchors.solar_midnight;
        vertex_value = -100.0;
        foot = if now_secs < anchors.solar_midnight {
            anchors.sunset
        } else {
            anchors.sunrise
        };
    }

    let spread = vertex_time - foot;
    if spread == 0.0 {
        return vertex_value;
    }

    // y = a(t - h)^2 + k through (foot, 0)
    let a = (0.0 - vertex_value) / spread.powi(2);
    a * (now_secs - vertex_time).powi(2) + vertex_value
}

/// Compute the normalized sun position for `now` at the given coordinates.
pub fn sun_position(now: DateTime<Local>, latitude: f64, longitude: f64) -> Result<f64> {
    let anchors = SolarAnchors::resolve(now, latitude, longitude)?;
    Ok(position_from_anchors(now.timestamp() as f64, &anchors))
}
