//! Hue REST client.
//!
//! Thin HTTP glue implementing [`LightBridge`] against a Philips Hue bridge's
//! local REST API (`/api/<username>/lights`). The bridge reports errors in a
//! 200 response as an array of `{"error": ...}` objects, so every call checks
//! the payload shape as well as the HTTP status.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{FixtureInfo, FixtureState, LightBridge, StateUpdate};
use crate::tracking::Capability;

/// Request timeout; a wedged bridge stalls the loop for at most this long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for one Hue bridge.
pub struct HueBridge {
    client: reqwest::blocking::Client,
    address: String,
    username: String,
}

/// One entry of the `/lights` enumeration.
#[derive(Debug, Deserialize)]
struct LightEntry {
    name: String,
    state: LightState,
}

#[derive(Debug, Deserialize)]
struct LightState {
    on: bool,
    reachable: bool,
    bri: Option<u16>,
    ct: Option<u16>,
}

impl HueBridge {
    pub fn new(address: &str, username: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            address: address.to_string(),
            username: username.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}/api/{}{}", self.address, self.username, path)
    }

    fn get(&self, path: &str) -> Result<Value> {
        let value = self
            .client
            .get(self.url(path))
            .send()
            .with_context(|| format!("bridge {} unreachable", self.address))?
            .error_for_status()
            .context("bridge returned an HTTP error")?
            .json::<Value>()
            .context("bridge returned malformed JSON")?;

        if let Some(description) = api_error(&value) {
            bail!("bridge request failed: {description}");
        }
        Ok(value)
    }
}

/// Extract the first API-level error description, if the payload is the
/// bridge's error-array shape.
fn api_error(value: &Value) -> Option<String> {
    value.as_array()?.iter().find_map(|entry| {
        let error = entry.get("error")?;
        Some(
            error
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        )
    })
}

impl LightBridge for HueBridge {
    fn connect(&mut self) -> Result<()> {
        // The authenticated /config document doubles as a credential check:
        // bad usernames come back as an "unauthorized user" error array.
        self.get("/config").map(|_| ()).context("bridge connection failed")
    }

    fn list_fixtures(&mut self) -> Result<Vec<FixtureInfo>> {
        let value = self.get("/lights").context("failed to enumerate fixtures")?;
        let entries: std::collections::HashMap<String, LightEntry> =
            serde_json::from_value(value).context("unexpected fixture list shape")?;

        let mut fixtures: Vec<FixtureInfo> = entries
            .into_iter()
            .filter_map(|(id, entry)| {
                // Fixture ids are numeric on the wire; anything else is dropped
                let id = id.parse().ok()?;
                Some(FixtureInfo {
                    id,
                    name: entry.name,
                    capability: Capability::from_attributes(
                        entry.state.bri.is_some(),
                        entry.state.ct.is_some(),
                    ),
                })
            })
            .collect();
        fixtures.sort_by_key(|fixture| fixture.id);
        Ok(fixtures)
    }

    fn fixture_state(&mut self, id: u32) -> Result<FixtureState> {
        let value = self
            .get(&format!("/lights/{id}"))
            .with_context(|| format!("failed to read state of fixture {id}"))?;
        let entry: LightEntry =
            serde_json::from_value(value).context("unexpected fixture state shape")?;

        Ok(FixtureState {
            on: entry.state.on,
            reachable: entry.state.reachable,
            brightness: entry.state.bri,
            colortemp: entry.state.ct,
        })
    }

    fn apply_update(&mut self, id: u32, update: &StateUpdate) -> Result<bool> {
        let mut body = serde_json::Map::new();
        if let Some(brightness) = update.brightness {
            body.insert("bri".to_string(), brightness.into());
        }
        if let Some(colortemp) = update.colortemp {
            body.insert("ct".to_string(), colortemp.into());
        }

        let value = self
            .client
            .put(self.url(&format!("/lights/{id}/state")))
            .json(&Value::Object(body))
            .send()
            .with_context(|| format!("failed to write state of fixture {id}"))?
            .error_for_status()
            .context("bridge returned an HTTP error")?
            .json::<Value>()
            .context("bridge returned malformed JSON")?;

        Ok(api_error(&value).is_none())
    }
}
