//! `weather` tool backed by the OpenWeatherMap 2.5 API.
//!
//! `forecast_days == 0` returns current conditions; otherwise a per-day
//! forecast built from the 3-hourly `/forecast` feed.

use super::http::{TOOL_HTTP_TIMEOUT, check_response, http_client, read_json, transport_error};
use crate::tools::rate_limit::RateLimiter;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use deepseek_domain::{
    CachePolicy, ParamType, Tool, ToolError, ToolInvocation, ToolParameter, ToolSpec,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Canonical tool name for the weather tool.
pub const WEATHER: &str = "weather";

pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const WEATHER_API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";
const SERVICE: &str = "Weather";
const MAX_FORECAST_DAYS: i64 = 7;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Resolved configuration for [`WeatherTool`].
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub requests_per_minute: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            timeout: TOOL_HTTP_TIMEOUT,
            requests_per_minute: 10,
        }
    }
}

impl WeatherConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into()).filter(|k: &String| !k.is_empty());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Units {
    Metric,
    Imperial,
}

impl Units {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("imperial") {
            Units::Imperial
        } else {
            Units::Metric
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    fn temperature(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    fn speed(self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }
}

/// How a free-form location is passed to the API.
#[derive(Debug, PartialEq)]
enum LocationQuery {
    Coordinates { lat: String, lon: String },
    Zip(String),
    City(String),
}

impl LocationQuery {
    fn detect(location: &str) -> Self {
        if let Some((lat, lon)) = location.split_once(',') {
            let (lat, lon) = (lat.trim(), lon.trim());
            if is_coordinate(lat) && is_coordinate(lon) {
                return LocationQuery::Coordinates {
                    lat: lat.to_string(),
                    lon: lon.to_string(),
                };
            }
        }
        if location.len() == 5 && location.bytes().all(|b| b.is_ascii_digit()) {
            return LocationQuery::Zip(location.to_string());
        }
        LocationQuery::City(location.to_string())
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            LocationQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.clone()), ("lon", lon.clone())]
            }
            LocationQuery::Zip(zip) => vec![("zip", zip.clone())],
            LocationQuery::City(city) => vec![("q", city.clone())],
        }
    }
}

fn is_coordinate(part: &str) -> bool {
    !part.is_empty() && part.parse::<f64>().is_ok()
}

/// 16-point compass direction for a bearing in degrees.
pub fn wind_direction(degrees: Option<f64>) -> &'static str {
    match degrees {
        Some(deg) if deg.is_finite() => {
            let index = (deg / 22.5).round().rem_euclid(16.0) as usize;
            COMPASS_POINTS[index % 16]
        }
        _ => "Unknown",
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn offset_from_secs(secs: Option<i32>) -> FixedOffset {
    secs.and_then(FixedOffset::east_opt).unwrap_or_else(|| Utc.fix())
}

fn local_time(timestamp: i64, offset: FixedOffset, pattern: &str) -> Option<String> {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|t| t.with_timezone(&offset).format(pattern).to_string())
}

#[derive(Debug, Default, Deserialize)]
struct Condition {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MainReadings {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Clouds {
    all: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct Sys {
    #[serde(default)]
    country: String,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    sys: Sys,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    main: MainReadings,
    #[serde(default)]
    wind: Wind,
    #[serde(default)]
    clouds: Clouds,
    dt: Option<i64>,
    timezone: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct City {
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: String,
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    #[serde(default)]
    main: MainReadings,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    wind: Wind,
    #[serde(default)]
    clouds: Clouds,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    city: City,
    #[serde(default)]
    list: Vec<ForecastItem>,
}

fn reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v} {unit}"),
        None => format!("N/A {unit}"),
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A%".to_string(), |v| format!("{v}%"))
}

fn current_to_json(data: CurrentResponse, location: &str, units: Units) -> Value {
    let offset = offset_from_secs(data.timezone);
    let condition = data.weather.into_iter().next().unwrap_or_default();
    let clock = |ts: Option<i64>| {
        ts.and_then(|t| local_time(t, offset, "%H:%M"))
            .unwrap_or_else(|| "N/A".to_string())
    };
    let name = if data.name.is_empty() {
        location.to_string()
    } else {
        data.name
    };

    json!({
        "location": name,
        "country": data.sys.country,
        "description": capitalize(&condition.description),
        "temperature": reading(data.main.temp, units.temperature()),
        "feels_like": reading(data.main.feels_like, units.temperature()),
        "humidity": percent(data.main.humidity),
        "pressure": reading(data.main.pressure, "hPa"),
        "wind_speed": reading(data.wind.speed, units.speed()),
        "wind_direction": wind_direction(data.wind.deg),
        "cloudiness": percent(data.clouds.all),
        "sunrise": clock(data.sys.sunrise),
        "sunset": clock(data.sys.sunset),
        "weather_id": condition.id,
        "icon": condition.icon,
        "units": units.as_str(),
        "timestamp": data.dt,
    })
}

#[derive(Default)]
struct DayAccumulator {
    min_temp: Option<f64>,
    max_temp: Option<f64>,
    descriptions: Vec<String>,
    humidity: Vec<f64>,
    wind_speeds: Vec<f64>,
    details: Vec<Value>,
}

impl DayAccumulator {
    /// Most frequent description; ties go to the one seen first.
    fn dominant_description(&self) -> String {
        let mut best: Option<(&str, usize)> = None;
        for d in &self.descriptions {
            let count = self.descriptions.iter().filter(|x| *x == d).count();
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((d, count));
            }
        }
        best.map(|(d, _)| capitalize(d)).unwrap_or_default()
    }
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn forecast_to_json(data: ForecastResponse, location: &str, days: usize, units: Units) -> Value {
    let offset = offset_from_secs(data.city.timezone);
    let mut by_date: BTreeMap<String, DayAccumulator> = BTreeMap::new();

    for item in data.list {
        let (Some(date), Some(time)) = (
            local_time(item.dt, offset, "%Y-%m-%d"),
            local_time(item.dt, offset, "%H:%M"),
        ) else {
            continue;
        };
        let condition = item.weather.into_iter().next().unwrap_or_default();
        let day = by_date.entry(date).or_default();

        if let Some(t) = item.main.temp_min {
            day.min_temp = Some(day.min_temp.map_or(t, |m| m.min(t)));
        }
        if let Some(t) = item.main.temp_max {
            day.max_temp = Some(day.max_temp.map_or(t, |m| m.max(t)));
        }
        day.descriptions.push(condition.description.clone());
        day.humidity.push(item.main.humidity.unwrap_or(0.0));
        day.wind_speeds.push(item.wind.speed.unwrap_or(0.0));
        day.details.push(json!({
            "time": time,
            "temp": reading(item.main.temp, units.temperature()),
            "description": capitalize(&condition.description),
            "humidity": percent(item.main.humidity),
            "wind": reading(item.wind.speed, units.speed()),
            "clouds": percent(item.clouds.all),
            "icon": condition.icon,
        }));
    }

    let forecast: Vec<Value> = by_date
        .into_iter()
        .take(days)
        .map(|(date, day)| {
            let day_name = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map(|d| d.format("%A").to_string())
                .unwrap_or_default();
            json!({
                "date": date,
                "day_name": day_name,
                "min_temp": reading(day.min_temp, units.temperature()),
                "max_temp": reading(day.max_temp, units.temperature()),
                "description": day.dominant_description(),
                "humidity": format!("{}%", average(&day.humidity) as i64),
                "wind": format!("{:.1} {}", average(&day.wind_speeds), units.speed()),
                "details": day.details,
            })
        })
        .collect();

    let name = if data.city.name.is_empty() {
        location.to_string()
    } else {
        data.city.name
    };
    json!({
        "location": name,
        "country": data.city.country,
        "forecast_days": forecast.len(),
        "units": units.as_str(),
        "forecast": forecast,
    })
}

/// Current weather and short-range forecast via OpenWeatherMap
pub struct WeatherTool {
    spec: ToolSpec,
    config: WeatherConfig,
    http: reqwest::Client,
    limiter: RateLimiter,
}

impl WeatherTool {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            spec: ToolSpec::new(
                WEATHER,
                "Get current weather or a daily forecast for a city, zip code or 'lat,lon' coordinates",
            )
            .with_parameter(ToolParameter::required(
                "location",
                "City name, 5-digit zip code or 'lat,lon'",
                ParamType::String,
            ))
            .with_parameter(
                ToolParameter::optional(
                    "forecast_days",
                    "Days of forecast (0 for current weather, up to 7)",
                    ParamType::Integer,
                )
                .with_default(0),
            )
            .with_parameter(
                ToolParameter::optional("units", "Unit system", ParamType::String)
                    .with_allowed_values(["metric", "imperial"])
                    .with_default("metric"),
            ),
            http: http_client(config.timeout),
            limiter: RateLimiter::per_minute(config.requests_per_minute),
            config,
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        api_key: &str,
        query: &LocationQuery,
        units: Units,
        location: &str,
    ) -> Result<T, ToolError> {
        self.limiter.acquire().await;
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut params = query.query_pairs();
        params.push(("appid", api_key.to_string()));
        params.push(("units", units.as_str().to_string()));

        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ToolError::execution_failed(format!(
                "Location '{location}' not found"
            )));
        }
        let response = check_response(SERVICE, response).await?;
        read_json(SERVICE, response).await
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn run(&self, call: &ToolInvocation) -> Result<Value, ToolError> {
        let location = call
            .require_str("location")
            .map_err(ToolError::validation)?
            .trim()
            .to_string();
        if location.is_empty() {
            return Err(ToolError::validation("location must not be empty"));
        }
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            ToolError::not_configured(format!(
                "No OpenWeatherMap API key configured; set {WEATHER_API_KEY_ENV}"
            ))
        })?;
        let days = call
            .get_i64("forecast_days")
            .unwrap_or(0)
            .clamp(0, MAX_FORECAST_DAYS) as usize;
        let units = Units::parse(call.get_str("units").unwrap_or("metric"));
        let query = LocationQuery::detect(&location);

        info!(location = %location, forecast_days = days, "Fetching weather");
        if days == 0 {
            let data: CurrentResponse = self
                .fetch("weather", api_key, &query, units, &location)
                .await?;
            Ok(current_to_json(data, &location, units))
        } else {
            let data: ForecastResponse = self
                .fetch("forecast", api_key, &query, units, &location)
                .await?;
            debug!(entries = data.list.len(), "Forecast entries received");
            Ok(forecast_to_json(data, &location, days, units))
        }
    }

    fn is_configured(&self) -> bool {
        self.has_credentials()
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    fn has_credentials(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn cache_policy(&self) -> CachePolicy {
        CachePolicy::enabled(Duration::from_secs(30 * 60))
    }
}
